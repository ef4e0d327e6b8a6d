//! The fixed 32-byte version tag opening every modern PIC stream.

/// Length of a version tag and of every tag name.
pub const TAG_LEN: usize = 32;

/// Offset of the encryption-type byte inside the version tag.
const ENCRYPTION_OFFSET: usize = 16;

/// Canonical modern version tag.
pub const PIC_VERSION: &[u8; TAG_LEN] = b"PIC VERSION 3.00                ";

/// Version tag of a stream whose ASCII and non-uniform tags were redacted.
pub const PIC_VERSION_ENCRYPTED: &[u8; TAG_LEN] = b"PIC VERSION 3.00e               ";

/// Encryption-type byte meaning "not encrypted".
pub const ENCRYPTION_NONE: u8 = b' ';

/// Encryption-type byte meaning "encrypted and redacted".
pub const ENCRYPTION_REDACTED: u8 = b'e';

/// Verbatim 32-byte version tag.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionTag([u8; TAG_LEN]);

impl VersionTag {
    pub const fn canonical() -> Self {
        Self(*PIC_VERSION)
    }

    pub const fn encrypted() -> Self {
        Self(*PIC_VERSION_ENCRYPTED)
    }

    pub const fn from_bytes(bytes: [u8; TAG_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; TAG_LEN] {
        &self.0
    }

    /// Byte 16: `' '` for plain files, `'e'` for redacted ones.
    pub fn encryption_type(&self) -> u8 {
        self.0[ENCRYPTION_OFFSET]
    }

    pub fn is_encrypted(&self) -> bool {
        self.encryption_type() != ENCRYPTION_NONE
    }

    /// Major version digit (byte 12).
    pub fn major(&self) -> u8 {
        self.0[12].wrapping_sub(b'0')
    }

    /// Two-digit minor version (bytes 14 and 15).
    pub fn minor(&self) -> u8 {
        10u8.wrapping_mul(self.0[14].wrapping_sub(b'0'))
            .wrapping_add(self.0[15].wrapping_sub(b'0'))
    }
}

impl Default for VersionTag {
    fn default() -> Self {
        Self::canonical()
    }
}

impl core::fmt::Debug for VersionTag {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "VersionTag(\"{}\")", self.0.escape_ascii())
    }
}
