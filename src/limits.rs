use alloc::vec::Vec;

/// Nesting depth of tag dictionaries that is never exceeded, whatever
/// [`Limits::max_tag_depth`] says. Nested reads recurse once per level.
pub const MAX_TAG_DEPTH: u32 = 64;

/// Resource limits for decode operations.
///
/// All fields default to `None` (no limit). The format itself caps rank and
/// tag dimensionality at 8 regardless of these settings.
#[derive(Clone, Debug, Default)]
pub struct Limits {
    /// Maximum image rank accepted (1..=8 always applies).
    pub max_rank: Option<u32>,
    /// Maximum pixel payload size in bytes.
    pub max_pixel_bytes: Option<u64>,
    /// Maximum declared size of the whole tag dictionary in bytes.
    pub max_tag_bytes: Option<u64>,
    /// Maximum nesting depth of tag dictionaries (the root is depth 0).
    /// Values above [`MAX_TAG_DEPTH`] are clamped to it.
    pub max_tag_depth: Option<u32>,
}

impl Limits {
    /// Check a header's rank against limits.
    pub(crate) fn check_rank(&self, rank: u32) -> Result<(), crate::PicError> {
        if let Some(max) = self.max_rank {
            if rank > max {
                return Err(crate::PicError::LimitExceeded(alloc::format!(
                    "rank {rank} exceeds limit {max}"
                )));
            }
        }
        Ok(())
    }

    /// Check that a pixel allocation is within limits.
    pub(crate) fn check_pixel_bytes(&self, bytes: u64) -> Result<(), crate::PicError> {
        if let Some(max) = self.max_pixel_bytes {
            if bytes > max {
                return Err(crate::PicError::LimitExceeded(alloc::format!(
                    "pixel payload {bytes} bytes exceeds limit {max}"
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn check_tag_bytes(&self, bytes: u64) -> Result<(), crate::PicError> {
        if let Some(max) = self.max_tag_bytes {
            if bytes > max {
                return Err(crate::PicError::LimitExceeded(alloc::format!(
                    "tag dictionary {bytes} bytes exceeds limit {max}"
                )));
            }
        }
        Ok(())
    }
}

pub(crate) fn check_tag_depth(depth: u32, max: Option<u32>) -> Result<(), crate::PicError> {
    let max = max.map_or(MAX_TAG_DEPTH, |max| max.min(MAX_TAG_DEPTH));
    if depth > max {
        return Err(crate::PicError::LimitExceeded(alloc::format!(
            "tag nesting depth {depth} exceeds limit {max}"
        )));
    }
    Ok(())
}

/// Zero-filled buffer of `len` bytes, or `LimitExceeded` when the allocator
/// refuses. Sizes come straight from untrusted headers.
pub(crate) fn try_zeroed(len: usize, what: &str) -> Result<Vec<u8>, crate::PicError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| {
        crate::PicError::LimitExceeded(alloc::format!("cannot allocate {len} bytes for {what}"))
    })?;
    buf.resize(len, 0);
    Ok(buf)
}
