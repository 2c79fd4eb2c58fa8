//! Typed bit-fields within a single hardware register.
//!
//! A register is described as a closed set of fields. Each field is an enum
//! whose variants map to exact bit patterns inside the field's mask, so a
//! register value is always read and written as a tuple of symbolic values
//! rather than as loose bit constants.

use byteorder::{BigEndian, ByteOrder};
use core::fmt::Debug;
use core::ops::{BitAnd, BitOr, Not};

/// Native width of a register: one bus-transfer unit of 8 or 16 bits.
pub trait Bits:
    Copy
    + Eq
    + Debug
    + Into<u16>
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + Not<Output = Self>
    + 'static
{
    /// Number of data bytes on the wire.
    const BYTES: usize;
    const ZERO: Self;

    /// Serializes MSB first into `buf[..Self::BYTES]`.
    fn write_be(self, buf: &mut [u8]);

    /// Deserializes MSB first from `buf[..Self::BYTES]`.
    fn read_be(buf: &[u8]) -> Self;
}

impl Bits for u8 {
    const BYTES: usize = 1;
    const ZERO: Self = 0;

    fn write_be(self, buf: &mut [u8]) {
        buf[0] = self;
    }

    fn read_be(buf: &[u8]) -> Self {
        buf[0]
    }
}

impl Bits for u16 {
    const BYTES: usize = 2;
    const ZERO: Self = 0;

    fn write_be(self, buf: &mut [u8]) {
        BigEndian::write_u16(buf, self);
    }

    fn read_be(buf: &[u8]) -> Self {
        BigEndian::read_u16(buf)
    }
}

/// The bits under a field's mask matched none of its values.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecodeError {
    pub field: &'static str,
    pub bits: u16,
}

/// One named field of a register.
///
/// Implementations are normally generated with `register_field!`.
pub trait Field: Copy + Eq + Debug + Sized + 'static {
    type Raw: Bits;

    const NAME: &'static str;
    /// Bit positions occupied by the field.
    const MASK: Self::Raw;
    /// Every legal value, in declaration order.
    const VALUES: &'static [Self];
    /// Bit pattern of each entry in `VALUES`, index for index.
    const PATTERNS: &'static [Self::Raw];

    /// Bit pattern of this value.
    fn bits(self) -> Self::Raw;

    /// Replaces this field's bits in `raw`, leaving all other bits untouched.
    fn encode(self, raw: Self::Raw) -> Self::Raw {
        (raw & !Self::MASK) | self.bits()
    }

    /// Finds the value whose pattern equals `raw & MASK`.
    fn decode(raw: Self::Raw) -> Result<Self, DecodeError> {
        let bits = raw & Self::MASK;
        Self::VALUES
            .iter()
            .copied()
            .find(|value| value.bits() == bits)
            .ok_or(DecodeError {
                field: Self::NAME,
                bits: bits.into(),
            })
    }

    /// Static description used by the layout self-check.
    fn layout() -> FieldLayout<Self::Raw> {
        FieldLayout {
            name: Self::NAME,
            mask: Self::MASK,
            patterns: Self::PATTERNS,
        }
    }
}

/// Declares a closed enum and its [`Field`] implementation from a bit table.
///
/// ```ignore
/// register_field! {
///     pub enum Mode: u16 [0x0100] {
///         Continuous = 0x0000,
///         SingleShot = 0x0100,
///     }
/// }
/// ```
macro_rules! register_field {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident: $raw:ty [$mask:expr] {
            $( $(#[$vmeta:meta])* $variant:ident = $bits:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Debug)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        $vis enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $crate::field::Field for $name {
            type Raw = $raw;

            const NAME: &'static str = stringify!($name);
            const MASK: $raw = $mask;
            const VALUES: &'static [Self] = &[$( Self::$variant ),+];
            const PATTERNS: &'static [$raw] = &[$( $bits ),+];

            fn bits(self) -> $raw {
                match self {
                    $( Self::$variant => $bits ),+
                }
            }
        }
    };
}

/// Problems found by [`RegisterLayout::validate`].
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LayoutError {
    /// A field declares no values.
    Empty { field: &'static str },
    /// A value sets bits outside its field's mask.
    PatternOutsideMask { field: &'static str, pattern: u16 },
    /// Two values of one field share a pattern, so decode would be ambiguous.
    DuplicatePattern { field: &'static str, pattern: u16 },
    /// Two fields of one register claim the same bits.
    Overlap {
        first: &'static str,
        second: &'static str,
    },
    /// A symbolic/integer translation table does not round-trip.
    Translation { field: &'static str },
}

/// Static description of one field: its mask and every legal pattern.
#[derive(Clone, Copy, Debug)]
pub struct FieldLayout<W: 'static> {
    pub name: &'static str,
    pub mask: W,
    pub patterns: &'static [W],
}

impl<W: Bits> FieldLayout<W> {
    /// Every pattern fits inside the mask and no two patterns are equal.
    pub fn check_masking(&self) -> Result<(), LayoutError> {
        if self.patterns.is_empty() {
            return Err(LayoutError::Empty { field: self.name });
        }
        for (i, &pattern) in self.patterns.iter().enumerate() {
            if pattern & !self.mask != W::ZERO || pattern & self.mask != pattern {
                return Err(LayoutError::PatternOutsideMask {
                    field: self.name,
                    pattern: pattern.into(),
                });
            }
            if self.patterns[..i].contains(&pattern) {
                return Err(LayoutError::DuplicatePattern {
                    field: self.name,
                    pattern: pattern.into(),
                });
            }
        }
        Ok(())
    }
}

/// All fields sharing one register.
#[derive(Clone, Copy, Debug)]
pub struct RegisterLayout<W: 'static> {
    pub name: &'static str,
    pub fields: &'static [FieldLayout<W>],
}

impl<W: Bits> RegisterLayout<W> {
    /// Checks every field's masking and that all masks are pairwise disjoint.
    pub fn validate(&self) -> Result<(), LayoutError> {
        for (i, a) in self.fields.iter().enumerate() {
            a.check_masking()?;
            for b in &self.fields[i + 1..] {
                if a.mask & b.mask != W::ZERO {
                    return Err(LayoutError::Overlap {
                        first: a.name,
                        second: b.name,
                    });
                }
            }
        }
        Ok(())
    }

    /// Union of all field masks.
    pub fn mask(&self) -> W {
        self.fields
            .iter()
            .fold(W::ZERO, |acc, field| acc | field.mask)
    }
}
