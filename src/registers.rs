//! ADS1015 register map and configuration register fields.
//!
//! Bit layouts follow the TI ADS1013/4/5 datasheet (SBAS473).

use crate::field::{Field, FieldLayout, LayoutError, RegisterLayout};
use core::fmt;

/// Represents the register addresses in the ADS1015 ADC.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Register {
    /// Conversion result, 12 bits left-justified.
    Conversion = 0b00,
    /// Configuration register.
    Config = 0b01,
    /// Comparator low threshold.
    LoThresh = 0b10,
    /// Comparator high threshold.
    HiThresh = 0b11,
}

/// Configuration register contents after power-on reset.
pub const RESET_CONFIG: u16 = 0x8583;

register_field! {
    /// Operational status (OS).
    ///
    /// Writing `Begin` starts a single conversion in power-down mode. When
    /// read, `Begin` means the device is idle and `Busy` that a conversion is
    /// in progress.
    pub enum OperationalStatus: u16 [0x8000] {
        Busy = 0x0000,
        Begin = 0x8000,
    }
}

register_field! {
    /// Input multiplexer (MUX), named positive input first.
    pub enum Mux: u16 [0x7000] {
        Ain0Ain1 = 0x0000,
        Ain0Ain3 = 0x1000,
        Ain1Ain3 = 0x2000,
        Ain2Ain3 = 0x3000,
        Ain0Gnd = 0x4000,
        Ain1Gnd = 0x5000,
        Ain2Gnd = 0x6000,
        Ain3Gnd = 0x7000,
    }
}

register_field! {
    /// Programmable gain amplifier, named by full-scale range in mV.
    pub enum Gain: u16 [0x0E00] {
        Fs6144 = 0x0000,
        Fs4096 = 0x0200,
        Fs2048 = 0x0400,
        Fs1024 = 0x0600,
        Fs512 = 0x0800,
        Fs256 = 0x0A00,
    }
}

register_field! {
    /// Operating mode.
    pub enum Mode: u16 [0x0100] {
        Continuous = 0x0000,
        SingleShot = 0x0100,
    }
}

register_field! {
    /// Data rate in samples per second.
    pub enum SampleRate: u16 [0x00E0] {
        Sps128 = 0x0000,
        Sps250 = 0x0020,
        Sps490 = 0x0040,
        Sps920 = 0x0060,
        Sps1600 = 0x0080,
        Sps2400 = 0x00A0,
        Sps3300 = 0x00C0,
    }
}

register_field! {
    pub enum ComparatorMode: u16 [0x0010] {
        Traditional = 0x0000,
        Window = 0x0010,
    }
}

register_field! {
    /// ALERT/RDY pin polarity.
    pub enum ComparatorPolarity: u16 [0x0008] {
        ActiveLow = 0x0000,
        ActiveHigh = 0x0008,
    }
}

register_field! {
    pub enum ComparatorLatch: u16 [0x0004] {
        NonLatching = 0x0000,
        Latching = 0x0004,
    }
}

register_field! {
    /// Number of successive conversions beyond threshold before ALERT/RDY
    /// asserts, or the comparator disabled.
    pub enum ComparatorQueue: u16 [0x0003] {
        One = 0x0000,
        Two = 0x0001,
        Four = 0x0002,
        Disable = 0x0003,
    }
}

static CONFIG_FIELDS: [FieldLayout<u16>; 9] = [
    FieldLayout {
        name: OperationalStatus::NAME,
        mask: OperationalStatus::MASK,
        patterns: OperationalStatus::PATTERNS,
    },
    FieldLayout {
        name: Mux::NAME,
        mask: Mux::MASK,
        patterns: Mux::PATTERNS,
    },
    FieldLayout {
        name: Gain::NAME,
        mask: Gain::MASK,
        patterns: Gain::PATTERNS,
    },
    FieldLayout {
        name: Mode::NAME,
        mask: Mode::MASK,
        patterns: Mode::PATTERNS,
    },
    FieldLayout {
        name: SampleRate::NAME,
        mask: SampleRate::MASK,
        patterns: SampleRate::PATTERNS,
    },
    FieldLayout {
        name: ComparatorMode::NAME,
        mask: ComparatorMode::MASK,
        patterns: ComparatorMode::PATTERNS,
    },
    FieldLayout {
        name: ComparatorPolarity::NAME,
        mask: ComparatorPolarity::MASK,
        patterns: ComparatorPolarity::PATTERNS,
    },
    FieldLayout {
        name: ComparatorLatch::NAME,
        mask: ComparatorLatch::MASK,
        patterns: ComparatorLatch::PATTERNS,
    },
    FieldLayout {
        name: ComparatorQueue::NAME,
        mask: ComparatorQueue::MASK,
        patterns: ComparatorQueue::PATTERNS,
    },
];

/// Every field of the configuration register.
pub static CONFIG_LAYOUT: RegisterLayout<u16> = RegisterLayout {
    name: "Config",
    fields: &CONFIG_FIELDS,
};

/// Positive multiplexer input.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PositiveInput {
    Ain0,
    Ain1,
    Ain2,
    Ain3,
}

/// Negative multiplexer input.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NegativeInput {
    Ain1,
    Ain3,
    Gnd,
}

const MUX_PAIRS: [(Mux, PositiveInput, NegativeInput); 8] = [
    (Mux::Ain0Ain1, PositiveInput::Ain0, NegativeInput::Ain1),
    (Mux::Ain0Ain3, PositiveInput::Ain0, NegativeInput::Ain3),
    (Mux::Ain1Ain3, PositiveInput::Ain1, NegativeInput::Ain3),
    (Mux::Ain2Ain3, PositiveInput::Ain2, NegativeInput::Ain3),
    (Mux::Ain0Gnd, PositiveInput::Ain0, NegativeInput::Gnd),
    (Mux::Ain1Gnd, PositiveInput::Ain1, NegativeInput::Gnd),
    (Mux::Ain2Gnd, PositiveInput::Ain2, NegativeInput::Gnd),
    (Mux::Ain3Gnd, PositiveInput::Ain3, NegativeInput::Gnd),
];

impl Mux {
    /// The (positive, negative) inputs this setting connects.
    pub fn inputs(self) -> (PositiveInput, NegativeInput) {
        use NegativeInput as N;
        use PositiveInput as P;
        match self {
            Mux::Ain0Ain1 => (P::Ain0, N::Ain1),
            Mux::Ain0Ain3 => (P::Ain0, N::Ain3),
            Mux::Ain1Ain3 => (P::Ain1, N::Ain3),
            Mux::Ain2Ain3 => (P::Ain2, N::Ain3),
            Mux::Ain0Gnd => (P::Ain0, N::Gnd),
            Mux::Ain1Gnd => (P::Ain1, N::Gnd),
            Mux::Ain2Gnd => (P::Ain2, N::Gnd),
            Mux::Ain3Gnd => (P::Ain3, N::Gnd),
        }
    }

    /// The setting that connects `p` against `n`, if the hardware has one.
    pub fn from_inputs(p: PositiveInput, n: NegativeInput) -> Option<Self> {
        MUX_PAIRS
            .iter()
            .find(|&&(_, mp, mn)| mp == p && mn == n)
            .map(|&(mux, _, _)| mux)
    }
}

impl fmt::Display for Mux {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (p, n) = self.inputs();
        let p = match p {
            PositiveInput::Ain0 => "AIN0",
            PositiveInput::Ain1 => "AIN1",
            PositiveInput::Ain2 => "AIN2",
            PositiveInput::Ain3 => "AIN3",
        };
        let n = match n {
            NegativeInput::Ain1 => "AIN1",
            NegativeInput::Ain3 => "AIN3",
            NegativeInput::Gnd => "GND",
        };
        write!(f, "{}:{}", p, n)
    }
}

/// Input selection for a conversion.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    /// AIN0 against AIN1.
    Diff01,
    /// AIN0 against AIN3.
    Diff03,
    /// AIN1 against AIN3.
    Diff13,
    /// AIN2 against AIN3.
    Diff23,
    /// AIN0 single ended.
    Chan0,
    /// AIN1 single ended.
    Chan1,
    /// AIN2 single ended.
    Chan2,
    /// AIN3 single ended.
    Chan3,
}

impl Channel {
    pub const ALL: [Channel; 8] = [
        Channel::Diff01,
        Channel::Diff03,
        Channel::Diff13,
        Channel::Diff23,
        Channel::Chan0,
        Channel::Chan1,
        Channel::Chan2,
        Channel::Chan3,
    ];

    /// The (positive, negative) input pair this channel measures.
    pub fn inputs(self) -> (PositiveInput, NegativeInput) {
        use NegativeInput as N;
        use PositiveInput as P;
        match self {
            Channel::Diff01 => (P::Ain0, N::Ain1),
            Channel::Diff03 => (P::Ain0, N::Ain3),
            Channel::Diff13 => (P::Ain1, N::Ain3),
            Channel::Diff23 => (P::Ain2, N::Ain3),
            Channel::Chan0 => (P::Ain0, N::Gnd),
            Channel::Chan1 => (P::Ain1, N::Gnd),
            Channel::Chan2 => (P::Ain2, N::Gnd),
            Channel::Chan3 => (P::Ain3, N::Gnd),
        }
    }

    /// Multiplexer setting for this channel.
    pub fn mux(self) -> Mux {
        match self {
            Channel::Diff01 => Mux::Ain0Ain1,
            Channel::Diff03 => Mux::Ain0Ain3,
            Channel::Diff13 => Mux::Ain1Ain3,
            Channel::Diff23 => Mux::Ain2Ain3,
            Channel::Chan0 => Mux::Ain0Gnd,
            Channel::Chan1 => Mux::Ain1Gnd,
            Channel::Chan2 => Mux::Ain2Gnd,
            Channel::Chan3 => Mux::Ain3Gnd,
        }
    }
}

const GAIN_MILLIVOLTS: [(Gain, u16); 6] = [
    (Gain::Fs6144, 6144),
    (Gain::Fs4096, 4096),
    (Gain::Fs2048, 2048),
    (Gain::Fs1024, 1024),
    (Gain::Fs512, 512),
    (Gain::Fs256, 256),
];

impl Gain {
    /// Full-scale range in millivolts.
    pub fn millivolts(self) -> u16 {
        match self {
            Gain::Fs6144 => 6144,
            Gain::Fs4096 => 4096,
            Gain::Fs2048 => 2048,
            Gain::Fs1024 => 1024,
            Gain::Fs512 => 512,
            Gain::Fs256 => 256,
        }
    }

    pub fn from_millivolts(mv: u16) -> Option<Self> {
        GAIN_MILLIVOLTS
            .iter()
            .find(|&&(_, m)| m == mv)
            .map(|&(gain, _)| gain)
    }
}

impl fmt::Display for Gain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mv = self.millivolts();
        write!(f, "{}.{:03}v", mv / 1000, mv % 1000)
    }
}

const RATE_SPS: [(SampleRate, u16); 7] = [
    (SampleRate::Sps128, 128),
    (SampleRate::Sps250, 250),
    (SampleRate::Sps490, 490),
    (SampleRate::Sps920, 920),
    (SampleRate::Sps1600, 1600),
    (SampleRate::Sps2400, 2400),
    (SampleRate::Sps3300, 3300),
];

impl SampleRate {
    pub fn samples_per_second(self) -> u16 {
        match self {
            SampleRate::Sps128 => 128,
            SampleRate::Sps250 => 250,
            SampleRate::Sps490 => 490,
            SampleRate::Sps920 => 920,
            SampleRate::Sps1600 => 1600,
            SampleRate::Sps2400 => 2400,
            SampleRate::Sps3300 => 3300,
        }
    }

    pub fn from_samples_per_second(sps: u16) -> Option<Self> {
        RATE_SPS
            .iter()
            .find(|&&(_, s)| s == sps)
            .map(|&(rate, _)| rate)
    }
}

impl fmt::Display for SampleRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}sps", self.samples_per_second())
    }
}

impl fmt::Display for OperationalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OperationalStatus::Busy => "Busy",
            OperationalStatus::Begin => "Ready",
        })
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Continuous => "Continuous",
            Mode::SingleShot => "Single shot",
        })
    }
}

impl fmt::Display for ComparatorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ComparatorMode::Traditional => "Traditional",
            ComparatorMode::Window => "Window",
        })
    }
}

impl fmt::Display for ComparatorPolarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ComparatorPolarity::ActiveLow => "Active low",
            ComparatorPolarity::ActiveHigh => "Active high",
        })
    }
}

impl fmt::Display for ComparatorLatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ComparatorLatch::NonLatching => "Non-latching",
            ComparatorLatch::Latching => "Latching",
        })
    }
}

impl fmt::Display for ComparatorQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ComparatorQueue::One => "One conversion",
            ComparatorQueue::Two => "Two conversions",
            ComparatorQueue::Four => "Four conversions",
            ComparatorQueue::Disable => "Disabled",
        })
    }
}

/// Validates the configuration register layout and the integer
/// translation tables.
pub fn self_check() -> Result<(), LayoutError> {
    CONFIG_LAYOUT.validate()?;

    if GAIN_MILLIVOLTS.len() != Gain::VALUES.len()
        || !Gain::VALUES
            .iter()
            .all(|&g| Gain::from_millivolts(g.millivolts()) == Some(g))
    {
        return Err(LayoutError::Translation { field: Gain::NAME });
    }
    if RATE_SPS.len() != SampleRate::VALUES.len()
        || !SampleRate::VALUES
            .iter()
            .all(|&r| SampleRate::from_samples_per_second(r.samples_per_second()) == Some(r))
    {
        return Err(LayoutError::Translation {
            field: SampleRate::NAME,
        });
    }
    if MUX_PAIRS.len() != Mux::VALUES.len()
        || !Mux::VALUES.iter().all(|&m| {
            let (p, n) = m.inputs();
            Mux::from_inputs(p, n) == Some(m)
        })
    {
        return Err(LayoutError::Translation { field: Mux::NAME });
    }
    Ok(())
}
