//! # Texas Instruments ADS1015 Driver
//!
//! Async driver for the ADS1015 12-bit, four-input I2C ADC.
//!
//! The configuration register is modeled as typed fields (see [`field`]) and
//! mirrored on the host (see [`cache`]). A conversion selects the input pair,
//! starts a single-shot conversion, waits out the conversion time implied by
//! the configured data rate and reads the result back, all under one bus
//! guard (see [`bus`]).

#![cfg_attr(not(test), no_std)]

// This must go first so the logging macros are visible to every module.
mod fmt;

#[macro_use]
pub mod field;

pub mod bus;
pub mod cache;
pub mod conversion;
mod registers;

use crate::bus::Bus;
use crate::cache::{CachedRegister, ReadWrite};
use crate::conversion::{decode_sample, decode_threshold, encode_threshold, scale_to_volts};
use crate::field::{DecodeError, Field, LayoutError};
use embedded_hal_async::{delay, i2c, i2c::I2c as _};

pub use crate::conversion::settle_time_us;
pub use crate::registers::{
    Channel, ComparatorLatch, ComparatorMode, ComparatorPolarity, ComparatorQueue, Gain, Mode,
    Mux, NegativeInput, OperationalStatus, PositiveInput, Register, SampleRate, CONFIG_LAYOUT,
    RESET_CONFIG,
};

/// Default I2C device address (ADDR tied to VDD).
pub const DEFAULT_DEVICE_ADDRESS: u8 = 0x49;

/// Value [`Ads1015::voltage`] returns when no measurement could be taken.
pub const NO_MEASUREMENT: f32 = 0.0;

/// Smallest and largest 12-bit codes.
const CODE_MIN: i16 = -2048;
const CODE_MAX: i16 = 2047;

/// Errors that can occur when using the ADS1015 driver.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<I2cErr> {
    I2c(I2cErr),
    /// Register bits matched no value of a field.
    Decode(DecodeError),
    /// Full-scale range in mV with no PGA setting.
    UnsupportedGain(u16),
    /// Data rate in samples per second with no DR setting.
    UnsupportedSampleRate(u16),
    /// Comparator threshold outside the 12-bit code range.
    ThresholdOutOfRange(i16),
}

/// Contents of the configuration register, one value per field.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub mux: Mux,
    pub gain: Gain,
    pub mode: Mode,
    pub sample_rate: SampleRate,
    pub comparator_mode: ComparatorMode,
    pub comparator_polarity: ComparatorPolarity,
    pub comparator_latch: ComparatorLatch,
    pub comparator_queue: ComparatorQueue,
}

impl Default for Config {
    /// Power-on defaults: AIN0/AIN1, ±2.048 V, single shot, 1600 SPS,
    /// comparator disabled.
    fn default() -> Self {
        Self {
            mux: Mux::Ain0Ain1,
            gain: Gain::Fs2048,
            mode: Mode::SingleShot,
            sample_rate: SampleRate::Sps1600,
            comparator_mode: ComparatorMode::Traditional,
            comparator_polarity: ComparatorPolarity::ActiveLow,
            comparator_latch: ComparatorLatch::NonLatching,
            comparator_queue: ComparatorQueue::Disable,
        }
    }
}

impl Config {
    /// Register value for this configuration, OS bit clear.
    pub fn bits(&self) -> u16 {
        let mut raw = 0;
        raw = self.mux.encode(raw);
        raw = self.gain.encode(raw);
        raw = self.mode.encode(raw);
        raw = self.sample_rate.encode(raw);
        raw = self.comparator_mode.encode(raw);
        raw = self.comparator_polarity.encode(raw);
        raw = self.comparator_latch.encode(raw);
        self.comparator_queue.encode(raw)
    }

    pub fn from_bits(raw: u16) -> Result<Self, DecodeError> {
        Ok(Self {
            mux: Mux::decode(raw)?,
            gain: Gain::decode(raw)?,
            mode: Mode::decode(raw)?,
            sample_rate: SampleRate::decode(raw)?,
            comparator_mode: ComparatorMode::decode(raw)?,
            comparator_polarity: ComparatorPolarity::decode(raw)?,
            comparator_latch: ComparatorLatch::decode(raw)?,
            comparator_queue: ComparatorQueue::decode(raw)?,
        })
    }
}

/// ADS1015 async driver.
pub struct Ads1015<B, DELAY, const DEVICE_ADDRESS: u8 = DEFAULT_DEVICE_ADDRESS>
where
    B: Bus,
    DELAY: delay::DelayNs,
{
    bus: B,
    delay: DELAY,
    config: CachedRegister<u16, ReadWrite>,
}

impl<B, DELAY, const DEVICE_ADDRESS: u8, I2cErr> Ads1015<B, DELAY, DEVICE_ADDRESS>
where
    B: Bus,
    B::I2c: i2c::I2c<Error = I2cErr>,
    DELAY: delay::DelayNs,
{
    /// Creates a new ADS1015 driver instance and writes `config` to the
    /// device.
    ///
    /// # Arguments
    /// bus: The bus, either [`bus::Exclusive`] or a [`bus::Shared`] handle.
    /// delay: The delay provider used to wait for conversions.
    /// config: The initial configuration register contents.
    ///
    pub async fn try_new(bus: B, delay: DELAY, config: Config) -> Result<Self, Error<I2cErr>> {
        debug_assert!(
            registers::self_check().is_ok(),
            "inconsistent ADS1015 register layout"
        );

        let mut adc = Self {
            bus,
            delay,
            config: CachedRegister::with_transient(
                Register::Config as u8,
                config.bits(),
                OperationalStatus::MASK,
            ),
        };

        {
            let mut i2c = adc.bus.acquire().await;
            adc.config.sync(&mut *i2c, DEVICE_ADDRESS).await?;
        }

        debug!(
            "ADS1015 at {:#x} configured with {:#x}",
            DEVICE_ADDRESS,
            adc.config.value()
        );
        Ok(adc)
    }

    /// Checks the register layout and the gain/rate translation tables.
    pub fn self_check() -> Result<(), LayoutError> {
        registers::self_check()
    }

    /// Releases the bus and the delay provider.
    pub fn release(self) -> (B, DELAY) {
        (self.bus, self.delay)
    }

    /// Whether the last configuration write reached the device.
    pub fn is_synced(&self) -> bool {
        self.config.is_synced()
    }

    /// The configuration as last written, without touching the bus.
    pub fn config(&self) -> Result<Config, DecodeError> {
        Config::from_bits(self.config.value())
    }

    /// Reads the configuration register from the device.
    pub async fn read_config(&mut self) -> Result<Config, Error<I2cErr>> {
        let mut i2c = self.bus.acquire().await;
        let raw = self.config.refresh(&mut *i2c, DEVICE_ADDRESS).await?;
        Config::from_bits(raw).map_err(Error::Decode)
    }

    /// Writes every field of the configuration register at once.
    pub async fn set_config(&mut self, config: Config) -> Result<Config, Error<I2cErr>> {
        let mut i2c = self.bus.acquire().await;
        self.config
            .write_raw(&mut *i2c, DEVICE_ADDRESS, config.bits())
            .await?;
        Config::from_bits(self.config.value()).map_err(Error::Decode)
    }

    /// Gets the programmable gain amplifier setting.
    pub async fn gain(&mut self) -> Result<Gain, Error<I2cErr>> {
        self.read_field().await
    }

    /// Sets the programmable gain amplifier.
    pub async fn set_gain(&mut self, gain: Gain) -> Result<Gain, Error<I2cErr>> {
        self.write_field(gain).await
    }

    /// Gets the full-scale range in millivolts.
    pub async fn gain_millivolts(&mut self) -> Result<u16, Error<I2cErr>> {
        Ok(self.gain().await?.millivolts())
    }

    /// Sets the full-scale range from a value in millivolts, which must be
    /// one of 6144, 4096, 2048, 1024, 512 or 256.
    pub async fn set_gain_millivolts(&mut self, millivolts: u16) -> Result<u16, Error<I2cErr>> {
        match Gain::from_millivolts(millivolts) {
            Some(gain) => Ok(self.set_gain(gain).await?.millivolts()),
            None => {
                error!("no PGA setting for a {} mV full-scale range", millivolts);
                Err(Error::UnsupportedGain(millivolts))
            }
        }
    }

    pub async fn mode(&mut self) -> Result<Mode, Error<I2cErr>> {
        self.read_field().await
    }

    pub async fn set_mode(&mut self, mode: Mode) -> Result<Mode, Error<I2cErr>> {
        self.write_field(mode).await
    }

    /// Gets the ADC data rate.
    pub async fn sample_rate(&mut self) -> Result<SampleRate, Error<I2cErr>> {
        self.read_field().await
    }

    /// Sets the ADC data rate.
    pub async fn set_sample_rate(
        &mut self,
        sample_rate: SampleRate,
    ) -> Result<SampleRate, Error<I2cErr>> {
        self.write_field(sample_rate).await
    }

    pub async fn sample_rate_sps(&mut self) -> Result<u16, Error<I2cErr>> {
        Ok(self.sample_rate().await?.samples_per_second())
    }

    /// Sets the data rate from a value in samples per second.
    pub async fn set_sample_rate_sps(&mut self, sps: u16) -> Result<u16, Error<I2cErr>> {
        match SampleRate::from_samples_per_second(sps) {
            Some(rate) => Ok(self.set_sample_rate(rate).await?.samples_per_second()),
            None => {
                error!("no data rate setting for {} SPS", sps);
                Err(Error::UnsupportedSampleRate(sps))
            }
        }
    }

    /// Gets the input multiplexer setting.
    pub async fn mux(&mut self) -> Result<Mux, Error<I2cErr>> {
        self.read_field().await
    }

    /// Sets the input multiplexer.
    pub async fn set_mux(&mut self, mux: Mux) -> Result<Mux, Error<I2cErr>> {
        self.write_field(mux).await
    }

    pub async fn comparator_mode(&mut self) -> Result<ComparatorMode, Error<I2cErr>> {
        self.read_field().await
    }

    pub async fn set_comparator_mode(
        &mut self,
        mode: ComparatorMode,
    ) -> Result<ComparatorMode, Error<I2cErr>> {
        self.write_field(mode).await
    }

    pub async fn comparator_polarity(&mut self) -> Result<ComparatorPolarity, Error<I2cErr>> {
        self.read_field().await
    }

    pub async fn set_comparator_polarity(
        &mut self,
        polarity: ComparatorPolarity,
    ) -> Result<ComparatorPolarity, Error<I2cErr>> {
        self.write_field(polarity).await
    }

    pub async fn comparator_latch(&mut self) -> Result<ComparatorLatch, Error<I2cErr>> {
        self.read_field().await
    }

    pub async fn set_comparator_latch(
        &mut self,
        latch: ComparatorLatch,
    ) -> Result<ComparatorLatch, Error<I2cErr>> {
        self.write_field(latch).await
    }

    pub async fn comparator_queue(&mut self) -> Result<ComparatorQueue, Error<I2cErr>> {
        self.read_field().await
    }

    pub async fn set_comparator_queue(
        &mut self,
        queue: ComparatorQueue,
    ) -> Result<ComparatorQueue, Error<I2cErr>> {
        self.write_field(queue).await
    }

    /// Sets the comparator thresholds as 12-bit codes.
    pub async fn set_thresholds(&mut self, low: i16, high: i16) -> Result<(), Error<I2cErr>> {
        for code in [low, high] {
            if !(CODE_MIN..=CODE_MAX).contains(&code) {
                error!("comparator threshold {} outside the 12-bit range", code);
                return Err(Error::ThresholdOutOfRange(code));
            }
        }
        self.write_register(Register::LoThresh, encode_threshold(low))
            .await?;
        self.write_register(Register::HiThresh, encode_threshold(high))
            .await
    }

    /// Gets the comparator thresholds as (low, high) 12-bit codes.
    pub async fn thresholds(&mut self) -> Result<(i16, i16), Error<I2cErr>> {
        let low = self.read_register(Register::LoThresh).await?;
        let high = self.read_register(Register::HiThresh).await?;
        Ok((decode_threshold(low), decode_threshold(high)))
    }

    /// Whether the device is idle, i.e. no conversion is in progress.
    pub async fn conversion_ready(&mut self) -> Result<bool, Error<I2cErr>> {
        Ok(self.read_field::<OperationalStatus>().await? == OperationalStatus::Begin)
    }

    /// Starts a single-shot conversion on the current input.
    pub async fn start_conversion(&mut self) -> Result<(), Error<I2cErr>> {
        let mut i2c = self.bus.acquire().await;
        self.config
            .pulse(&mut *i2c, DEVICE_ADDRESS, OperationalStatus::Begin)
            .await
    }

    /// Converts `channel` and returns the signed 12-bit result.
    ///
    /// The bus stays locked from input selection until the result is read.
    pub async fn read_raw(&mut self, channel: Channel) -> Result<i16, Error<I2cErr>> {
        let mut guard = self.bus.acquire().await;
        let i2c = &mut *guard;

        self.config
            .write_field(i2c, DEVICE_ADDRESS, channel.mux())
            .await?;
        self.config
            .pulse(i2c, DEVICE_ADDRESS, OperationalStatus::Begin)
            .await?;

        let sps = self
            .config
            .field::<SampleRate>()
            .map_err(Error::Decode)?
            .samples_per_second();
        let wait_us = settle_time_us(sps);
        trace!("waiting {} us for conversion at {} SPS", wait_us, sps);
        self.delay.delay_us(wait_us).await;

        let mut buf = [0u8; 2];
        i2c.write_read(DEVICE_ADDRESS, &[Register::Conversion as u8], &mut buf)
            .await
            .map_err(|e| {
                warn!(
                    "failed read of conversion register on device {:#x}",
                    DEVICE_ADDRESS
                );
                Error::I2c(e)
            })?;

        Ok(decode_sample(buf))
    }

    /// Converts `channel` and returns the result in volts, rounded to the
    /// millivolt, using the configured full-scale range.
    pub async fn read_voltage(&mut self, channel: Channel) -> Result<f32, Error<I2cErr>> {
        let sample = self.read_raw(channel).await?;
        let gain = self.config.field::<Gain>().map_err(Error::Decode)?;
        Ok(scale_to_volts(sample, gain.millivolts()))
    }

    /// Like [`read_voltage`](Self::read_voltage), but any failure yields
    /// [`NO_MEASUREMENT`], which cannot be told apart from a true 0 V.
    pub async fn voltage(&mut self, channel: Channel) -> f32 {
        match self.read_voltage(channel).await {
            Ok(volts) => volts,
            Err(_) => {
                warn!("no measurement on {:?}", channel);
                NO_MEASUREMENT
            }
        }
    }

    /// Reads one field from the device's configuration register.
    async fn read_field<F: Field<Raw = u16>>(&mut self) -> Result<F, Error<I2cErr>> {
        let mut i2c = self.bus.acquire().await;
        self.config.read_field(&mut *i2c, DEVICE_ADDRESS).await
    }

    /// Writes one field of the configuration register.
    async fn write_field<F: Field<Raw = u16>>(&mut self, value: F) -> Result<F, Error<I2cErr>> {
        let mut i2c = self.bus.acquire().await;
        self.config
            .write_field(&mut *i2c, DEVICE_ADDRESS, value)
            .await
    }

    /// Reads a 16-bit register that is not mirrored.
    async fn read_register(&mut self, reg: Register) -> Result<[u8; 2], Error<I2cErr>> {
        let mut buf = [0u8; 2];
        let mut i2c = self.bus.acquire().await;
        i2c.write_read(DEVICE_ADDRESS, &[reg as u8], &mut buf)
            .await
            .map_err(|e| {
                warn!("failed read of {:?} on device {:#x}", reg, DEVICE_ADDRESS);
                Error::I2c(e)
            })?;
        Ok(buf)
    }

    /// Writes a 16-bit register that is not mirrored.
    async fn write_register(&mut self, reg: Register, value: [u8; 2]) -> Result<(), Error<I2cErr>> {
        let mut i2c = self.bus.acquire().await;
        i2c.write(DEVICE_ADDRESS, &[reg as u8, value[0], value[1]])
            .await
            .map_err(|e| {
                warn!("failed write of {:?} on device {:#x}", reg, DEVICE_ADDRESS);
                Error::I2c(e)
            })
    }
}
