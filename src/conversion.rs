//! Conversion timing and result decoding.

use byteorder::{BigEndian, ByteOrder};
use num_traits::Float;

/// Worst-case conversion latency, in sample periods.
const CONVERSION_PERIODS: u32 = 12;

/// Positive full-scale code of the 12-bit result.
const FULL_SCALE_CODE: f32 = 2047.0;

/// Minimum wait in microseconds between starting a conversion and reading
/// it back at `samples_per_second`.
pub fn settle_time_us(samples_per_second: u16) -> u32 {
    let sps = u32::from(samples_per_second.max(1));
    (CONVERSION_PERIODS * 1_000_000).div_ceil(sps) + 1
}

/// Decodes the conversion register into a signed 12-bit sample.
///
/// The result sits in bits 15:4; the low nibble is padding.
pub fn decode_sample(raw: [u8; 2]) -> i16 {
    let code = (BigEndian::read_u16(&raw) >> 4) & 0x0FFF;
    if code & 0x0800 != 0 {
        (code | 0xF000) as i16
    } else {
        code as i16
    }
}

/// Scales a sample to volts for a full-scale range of `full_scale_mv`,
/// rounded to the millivolt.
pub fn scale_to_volts(sample: i16, full_scale_mv: u16) -> f32 {
    let millivolts = (f32::from(sample) / FULL_SCALE_CODE) * f32::from(full_scale_mv);
    Float::round(millivolts) / 1000.0
}

/// Encodes a 12-bit threshold code into its left-justified register form.
pub(crate) fn encode_threshold(code: i16) -> [u8; 2] {
    let mut buf = [0u8; 2];
    BigEndian::write_i16(&mut buf, code << 4);
    buf
}

/// Decodes a left-justified threshold register back into a 12-bit code.
pub(crate) fn decode_threshold(raw: [u8; 2]) -> i16 {
    BigEndian::read_i16(&raw) >> 4
}
