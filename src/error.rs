use alloc::string::String;
use enough::StopReason;

/// Errors from PIC decoding and encoding.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PicError {
    /// Neither the path nor its `.gz` sibling could be opened.
    #[cfg(feature = "std")]
    #[error("cannot open {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Gzip framing seen on the raw (non gzip-aware) path.
    #[error("stream starts with gzip magic; compressed PIC data must be read through the gzip-aware path")]
    BadMagic,

    #[error("corrupt tag stream: {0}")]
    CorruptTagStream(String),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("short pixel read: got {actual} of {expected} bytes (eof: {eof})")]
    ShortRead {
        expected: u64,
        actual: u64,
        eof: bool,
    },

    #[error("descriptor is write protected (pixel data was never loaded)")]
    WriteProtected,

    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("slice {slice} out of range 1..={count}")]
    SliceOutOfRange { slice: u32, count: u32 },

    #[error("tag is not a nested tag dictionary")]
    NotNested,

    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[cfg(feature = "std")]
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("operation cancelled")]
    Cancelled(StopReason),
}

impl From<StopReason> for PicError {
    fn from(r: StopReason) -> Self {
        PicError::Cancelled(r)
    }
}

/// Coarse classification of a [`PicError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    OpenFailed,
    BadMagic,
    CorruptTagStream,
    ShortRead,
    WriteProtected,
    SizeMismatch,
    /// Underlying stream failure other than a failed open.
    Io,
    /// A configured [`crate::Limits`] bound was hit.
    Limit,
    Cancelled,
    /// The caller asked for something the descriptor cannot do.
    Usage,
}

impl PicError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            #[cfg(feature = "std")]
            PicError::OpenFailed { .. } => ErrorKind::OpenFailed,
            PicError::BadMagic => ErrorKind::BadMagic,
            PicError::CorruptTagStream(_)
            | PicError::InvalidHeader(_)
            | PicError::UnexpectedEof => ErrorKind::CorruptTagStream,
            PicError::ShortRead { .. } => ErrorKind::ShortRead,
            PicError::WriteProtected => ErrorKind::WriteProtected,
            PicError::SizeMismatch { .. } => ErrorKind::SizeMismatch,
            PicError::SliceOutOfRange { .. }
            | PicError::NotNested
            | PicError::InvalidDescriptor(_) => ErrorKind::Usage,
            PicError::LimitExceeded(_) => ErrorKind::Limit,
            #[cfg(feature = "std")]
            PicError::Io(_) => ErrorKind::Io,
            PicError::Cancelled(_) => ErrorKind::Cancelled,
        }
    }
}
