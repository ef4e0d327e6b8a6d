//! Stream flavor detection from the first four bytes.

/// Leading bytes of every modern PIC stream.
pub const PIC_MAGIC: &[u8; 4] = b"PIC ";

/// Leading bytes of gzip framing.
pub const GZIP_MAGIC: &[u8; 2] = &[0x1F, 0x8B];

/// What the first four bytes of a stream say about it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PicFormat {
    /// Tagged v3 layout opening with the `"PIC VERSION"` tag.
    Modern,
    /// Pre-3.0 headerless layout.
    Legacy,
    /// Gzip framing seen where plain PIC bytes were expected.
    GzipOnRawPath,
}

/// Classify a stream by its first four bytes. Never fails: anything that is
/// neither gzip nor modern is legacy.
pub fn sniff(first: &[u8; 4]) -> PicFormat {
    if first.starts_with(GZIP_MAGIC) {
        PicFormat::GzipOnRawPath
    } else if first == PIC_MAGIC {
        PicFormat::Modern
    } else {
        PicFormat::Legacy
    }
}
