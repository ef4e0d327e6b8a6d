//! Pre-3.0 headerless layout.
//!
//! ```text
//! u32 LE    id (the four sniffed bytes, ignored)
//! u32 LE    dummy1, dummy2
//! u32 LE    conv   element type code, 1..=6
//! u32 LE    rank
//! rank × u32 LE extents
//! u32 LE    type   bytes per element (1 means unsigned bytes)
//! u32 LE    ntxt   non-zero when a text block follows
//! u32 LE    ltxt   length of the text block
//! ltxt bytes text (skipped)
//! pixels
//! ```
//!
//! Legacy streams carry no tags and are never encrypted.

use alloc::format;

use crate::decode::{DecodeOptions, Header, check_rank};
use crate::error::PicError;
use crate::io::ByteSource;
use crate::pixel::ElementType;
use crate::shape::{MAX_DIM, Shape};
use crate::version::VersionTag;

/// Parse the rest of a legacy header; `_id` is the already-consumed first word.
pub(crate) fn read_header<S: ByteSource + ?Sized>(
    _id: [u8; 4],
    src: &mut S,
    opts: &DecodeOptions<'_>,
) -> Result<Header, PicError> {
    let _dummy1 = src.read_u32_le()?;
    let _dummy2 = src.read_u32_le()?;
    let mut conv = src.read_u32_le()?;
    let mut rank = src.read_u32_le()?;
    if !(1..=6).contains(&conv) {
        tracing::debug!(conv, rank, "legacy conv out of range, assuming 2-D int");
        conv = 3;
        rank = 2;
    }
    let mut rank = check_rank(rank, opts.limits)?;

    let mut extents = [0u32; MAX_DIM];
    for extent in extents.iter_mut().take(rank) {
        *extent = src.read_u32_le()?;
    }
    if rank == 3 && extents[2] == 1 {
        rank = 2;
    }

    let legacy_type = src.read_u32_le()?;
    let has_text = src.read_u32_le()?;
    let text_len = src.read_u32_le()?;
    if has_text != 0 {
        src.skip_exact(u64::from(text_len))?;
    }

    let element_type = if legacy_type == 1 {
        ElementType::UInt
    } else {
        ElementType::from_raw(conv).unwrap_or_default()
    };
    let bpe = legacy_type
        .checked_mul(8)
        .ok_or_else(|| PicError::InvalidHeader(format!("legacy element size {legacy_type}")))?;

    Ok(Header {
        version: VersionTag::canonical(),
        element_type,
        bpe,
        shape: Shape::from_raw(extents, rank).unwrap_or_default(),
        tag_bytes: 0,
    })
}
