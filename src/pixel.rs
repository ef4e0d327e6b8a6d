/// Element type of pixel data and tag values.
///
/// The discriminants are the on-disk values. Raw value 6 was never assigned.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ElementType {
    #[default]
    Unknown = 0,
    Bool = 1,
    /// Character data. Tag values carry an extra trailing NUL in memory.
    Ascii = 2,
    /// Signed integer.
    Int = 3,
    /// Unsigned integer.
    UInt = 4,
    /// IEEE float (32 or 64 bit).
    Float = 5,
    /// Opaque user-defined bytes, never byte-swapped.
    NonUniform = 7,
    /// A nested tag dictionary (tag values only).
    TagDict = 8,
}

impl ElementType {
    /// Map an on-disk value to a type. `None` for unassigned values.
    pub fn from_raw(raw: u32) -> Option<Self> {
        Some(match raw {
            0 => Self::Unknown,
            1 => Self::Bool,
            2 => Self::Ascii,
            3 => Self::Int,
            4 => Self::UInt,
            5 => Self::Float,
            7 => Self::NonUniform,
            8 => Self::TagDict,
            _ => return None,
        })
    }

    /// On-disk value.
    #[inline]
    pub fn raw(self) -> u32 {
        self as u32
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Bool => "bool",
            Self::Ascii => "ASCII",
            Self::Int => "int",
            Self::UInt => "uint",
            Self::Float => "float",
            Self::NonUniform => "non-uniform",
            Self::TagDict => "tag dictionary",
        }
    }

    /// Types stored as plain bytes: bits per element is forced to 8.
    #[inline]
    pub fn is_byte_string(self) -> bool {
        matches!(self, Self::Ascii | Self::NonUniform)
    }

    /// Whether elements of this type are endian-corrected on read and write.
    #[inline]
    pub(crate) fn is_swapped(self) -> bool {
        !matches!(self, Self::NonUniform)
    }

    /// Width in bytes of one element for byte swapping purposes.
    #[inline]
    pub(crate) fn swap_width(self, bpe: u32) -> usize {
        if self.is_swapped() {
            (bpe / 8) as usize
        } else {
            1
        }
    }
}

impl core::fmt::Display for ElementType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
