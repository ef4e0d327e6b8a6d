//! PIC decoding, written once against [`ByteSource`].
//!
//! # Modern stream layout
//!
//! ```text
//! 32 bytes  version tag ("PIC VERSION 3.00", byte 16 = encryption type)
//! u32 LE    total length = 12 + 4 * rank + encoded tag size
//! u32 LE    element type
//! u32 LE    bits per element
//! u32 LE    rank (1..=8)
//! rank × u32 LE extents
//! tags      see [`crate::tags`]
//! pixels    elements * bpe / 8 bytes, little-endian elements
//! ```
//!
//! Pixels are read in 1 MiB blocks and converted to the requested memory
//! order once the read completes.

use alloc::format;

use enough::Stop;

use crate::descriptor::PicDescriptor;
use crate::endian::{ByteOrder, convert_le, detect_host_order};
use crate::error::PicError;
use crate::format::{PicFormat, sniff};
use crate::io::{ByteSource, SliceSource};
use crate::legacy;
use crate::limits::Limits;
use crate::pixel::ElementType;
use crate::shape::{MAX_DIM, Shape};
use crate::tags::{TagDict, TagReader};
use crate::version::{TAG_LEN, VersionTag};

/// Pixel payloads are read in blocks of this many bytes.
pub const CHUNK_SIZE: usize = 1 << 20;

/// What to do when the pixel payload ends early.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShortReadPolicy {
    /// Log a warning and return the descriptor with the unread tail left as
    /// it was (zero for fresh buffers).
    #[default]
    Warn,
    /// Fail with [`PicError::ShortRead`].
    Fail,
}

/// How far a decode goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Stage {
    Header,
    Tags,
    Pixels,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct DecodeOptions<'a> {
    pub limits: Option<&'a Limits>,
    pub short_read: ShortReadPolicy,
    pub memory_order: ByteOrder,
}

impl Default for DecodeOptions<'_> {
    fn default() -> Self {
        Self {
            limits: None,
            short_read: ShortReadPolicy::default(),
            memory_order: detect_host_order(),
        }
    }
}

/// Fixed header fields shared by the modern and legacy layouts.
pub(crate) struct Header {
    pub version: VersionTag,
    pub element_type: ElementType,
    pub bpe: u32,
    pub shape: Shape,
    /// Declared tag dictionary size (0 for legacy streams).
    pub tag_bytes: u64,
}

pub(crate) fn check_rank(rank: u32, limits: Option<&Limits>) -> Result<usize, PicError> {
    if rank == 0 || rank as usize > MAX_DIM {
        return Err(PicError::InvalidHeader(format!("rank {rank} outside 1..={MAX_DIM}")));
    }
    if let Some(limits) = limits {
        limits.check_rank(rank)?;
    }
    Ok(rank as usize)
}

fn read_modern_header<S: ByteSource + ?Sized>(
    magic: [u8; 4],
    src: &mut S,
    opts: &DecodeOptions<'_>,
) -> Result<Header, PicError> {
    let mut version = [0u8; TAG_LEN];
    version[..4].copy_from_slice(&magic);
    src.read_exact(&mut version[4..])?;

    let total_length = u64::from(src.read_u32_le()?);
    let raw_type = src.read_u32_le()?;
    let element_type = ElementType::from_raw(raw_type)
        .ok_or_else(|| PicError::InvalidHeader(format!("unknown element type {raw_type}")))?;
    let bpe = src.read_u32_le()?;
    let rank = check_rank(src.read_u32_le()?, opts.limits)?;
    let mut extents = [0u32; MAX_DIM];
    for extent in extents.iter_mut().take(rank) {
        *extent = src.read_u32_le()?;
    }

    let tag_bytes = total_length
        .checked_sub(12 + 4 * rank as u64)
        .ok_or_else(|| {
            PicError::CorruptTagStream(format!(
                "total length {total_length} shorter than a rank {rank} header"
            ))
        })?;

    Ok(Header {
        version: VersionTag::from_bytes(version),
        element_type,
        bpe,
        shape: Shape::from_raw(extents, rank).unwrap_or_default(),
        tag_bytes,
    })
}

/// Decode a stream into `pic` up to `stage`.
///
/// Header and tags are parsed completely before `pic` is touched. At the
/// pixel stage an existing buffer of exactly the right size is reused in
/// place; any other buffer is replaced.
pub(crate) fn decode_into<S: ByteSource + ?Sized>(
    src: &mut S,
    pic: &mut PicDescriptor,
    stage: Stage,
    opts: &DecodeOptions<'_>,
    stop: &dyn Stop,
) -> Result<(), PicError> {
    let mut magic = [0u8; 4];
    src.read_exact(&mut magic)?;

    let (header, tags) = match sniff(&magic) {
        PicFormat::GzipOnRawPath => {
            tracing::error!("cannot read compressed PIC data on the raw path");
            return Err(PicError::BadMagic);
        }
        PicFormat::Legacy => {
            tracing::debug!("no PIC magic, reading legacy layout");
            (legacy::read_header(magic, src, opts)?, TagDict::new())
        }
        PicFormat::Modern => {
            let header = read_modern_header(magic, src, opts)?;
            let mut tags = TagDict::new();
            if stage >= Stage::Tags {
                if let Some(limits) = opts.limits {
                    limits.check_tag_bytes(header.tag_bytes)?;
                }
                let reader = TagReader {
                    encryption_type: header.version.encryption_type(),
                    memory_order: opts.memory_order,
                    limits: opts.limits,
                    stop,
                };
                reader.read_tags(&mut tags, header.tag_bytes, src, 0)?;
            }
            (header, tags)
        }
    };

    pic.element_type = header.element_type;
    pic.bpe = header.bpe;
    pic.shape = header.shape;
    pic.version = header.version;
    pic.tags = tags;
    if stage >= Stage::Tags || header.tag_bytes == 0 {
        pic.pixel_start_offset = src.position();
    }

    if stage == Stage::Pixels {
        return load_pixels(src, pic, opts, stop);
    }

    let size = pic.size_in_bytes();
    let slot = pic.data_slot();
    if slot.as_ref().is_some_and(|d| d.len() as u64 != size) {
        *slot = None;
    }
    pic.write_protect = pic.data().is_none();
    Ok(())
}

/// Read `pic.size_in_bytes()` pixel bytes into `pic`, reusing a same-sized
/// buffer.
pub(crate) fn load_pixels<S: ByteSource + ?Sized>(
    src: &mut S,
    pic: &mut PicDescriptor,
    opts: &DecodeOptions<'_>,
    stop: &dyn Stop,
) -> Result<(), PicError> {
    let size = pic.size_in_bytes();
    if let Some(limits) = opts.limits {
        limits.check_pixel_bytes(size)?;
    }
    if opts.short_read == ShortReadPolicy::Fail {
        if let Some(left) = src.remaining_hint().filter(|&left| left < size) {
            return Err(PicError::ShortRead {
                expected: size,
                actual: left,
                eof: true,
            });
        }
    }
    let len = usize::try_from(size)
        .map_err(|_| PicError::LimitExceeded(format!("{size} pixel bytes")))?;

    let width = pic.element_type.swap_width(pic.bpe);
    let slot = pic.data_slot();
    let mut buf = match slot.take() {
        Some(existing) if existing.len() == len => {
            tracing::debug!(bytes = len, "reusing pixel buffer");
            existing
        }
        _ => crate::limits::try_zeroed(len, "pixels")?,
    };
    let result = read_pixels(src, &mut buf, width, opts, stop);
    *slot = Some(buf);
    result?;
    pic.write_protect = false;
    Ok(())
}

/// Fill `buf` in [`CHUNK_SIZE`] blocks, then convert whole elements from
/// little-endian to the memory order. Returns the number of bytes read.
pub(crate) fn read_pixels<S: ByteSource + ?Sized>(
    src: &mut S,
    buf: &mut [u8],
    width: usize,
    opts: &DecodeOptions<'_>,
    stop: &dyn Stop,
) -> Result<u64, PicError> {
    let mut total = 0usize;
    let mut os_error = false;
    for chunk in buf.chunks_mut(CHUNK_SIZE) {
        stop.check()?;
        let before = src.position();
        let n = match src.read_up_to(chunk) {
            Ok(n) => n,
            Err(e) if opts.short_read == ShortReadPolicy::Fail => return Err(e),
            Err(e) => {
                tracing::warn!(error = %e, "pixel read failed");
                os_error = true;
                (src.position() - before) as usize
            }
        };
        total += n;
        if n < chunk.len() {
            break;
        }
    }

    let whole = total - total % width.max(1);
    convert_le(&mut buf[..whole], width, opts.memory_order);

    if total != buf.len() {
        tracing::warn!(
            read = total,
            expected = buf.len(),
            eof = src.at_eof(),
            os_error,
            "short pixel read"
        );
        if opts.short_read == ShortReadPolicy::Fail {
            return Err(PicError::ShortRead {
                expected: buf.len() as u64,
                actual: total as u64,
                eof: src.at_eof(),
            });
        }
    }
    Ok(total as u64)
}

/// Decode into a temporary and copy into `target` only when the sizes agree.
///
/// On success the pixel bytes land in `target`'s existing buffer and the
/// freshly read tags replace `target`'s. On any failure `target` is left
/// untouched.
pub(crate) fn decode_into_checked<S: ByteSource + ?Sized>(
    src: &mut S,
    target: &mut PicDescriptor,
    opts: &DecodeOptions<'_>,
    stop: &dyn Stop,
) -> Result<(), PicError> {
    let mut temp = PicDescriptor::new();
    decode_into(src, &mut temp, Stage::Pixels, opts, stop)?;

    let expected = target
        .data()
        .map_or(target.size_in_bytes(), |d| d.len() as u64);
    let actual = temp.size_in_bytes();
    if expected != actual {
        tracing::error!(expected, actual, "decoded image does not fit the target descriptor");
        return Err(PicError::SizeMismatch { expected, actual });
    }

    let pixels = temp.take_data();
    match target.data_mut() {
        Some(dst) => {
            if let Some(src) = pixels.as_deref() {
                dst.copy_from_slice(src);
            }
        }
        None => *target.data_slot() = pixels,
    }
    target.element_type = temp.element_type;
    target.bpe = temp.bpe;
    target.shape = temp.shape;
    target.version = temp.version;
    target.pixel_start_offset = temp.pixel_start_offset;
    target.tags = core::mem::take(&mut temp.tags);
    target.write_protect = false;
    Ok(())
}

/// Decode header, tags and the single 1-based slice `slice` along the last
/// dimension, skipping the slices before it.
pub(crate) fn decode_slice<S: ByteSource + ?Sized>(
    src: &mut S,
    slice: u32,
    opts: &DecodeOptions<'_>,
    stop: &dyn Stop,
) -> Result<PicDescriptor, PicError> {
    let mut pic = PicDescriptor::new();
    decode_into(src, &mut pic, Stage::Tags, opts, stop)?;
    if pic.rank() < 2 {
        return Err(PicError::InvalidDescriptor(format!(
            "rank {} image has no slices",
            pic.rank()
        )));
    }
    let count = pic.shape.last().unwrap_or(0);
    if slice == 0 || slice > count {
        return Err(PicError::SliceOutOfRange { slice, count });
    }
    src.skip_exact(u64::from(slice - 1) * pic.slice_size())?;
    pic.shape = pic.shape.without_last();
    load_pixels(src, &mut pic, opts, stop)?;
    Ok(pic)
}

// ── DecodeRequest ───────────────────────────────────────────────────

/// Decode a PIC image from a byte slice.
#[derive(Clone, Debug)]
pub struct DecodeRequest<'a> {
    data: &'a [u8],
    options: DecodeOptions<'a>,
}

impl<'a> DecodeRequest<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            options: DecodeOptions::default(),
        }
    }

    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.options.limits = Some(limits);
        self
    }

    pub fn with_short_read(mut self, policy: ShortReadPolicy) -> Self {
        self.options.short_read = policy;
        self
    }

    /// Byte order of multi-byte elements in the decoded buffers. Defaults to
    /// the host order.
    pub fn with_memory_order(mut self, order: ByteOrder) -> Self {
        self.options.memory_order = order;
        self
    }

    /// Full decode: header, tags and pixels.
    pub fn decode(self, stop: impl Stop) -> Result<PicDescriptor, PicError> {
        let mut pic = PicDescriptor::new();
        self.decode_into(&mut pic, stop)?;
        Ok(pic)
    }

    /// Header only. The result is write protected and has no tags.
    pub fn decode_header(self) -> Result<PicDescriptor, PicError> {
        let mut pic = PicDescriptor::new();
        let mut src = SliceSource::new(self.data);
        decode_into(&mut src, &mut pic, Stage::Header, &self.options, &enough::Unstoppable)?;
        Ok(pic)
    }

    /// Header and tags, no pixels. The result is write protected.
    pub fn decode_tags(self, stop: impl Stop) -> Result<PicDescriptor, PicError> {
        let mut pic = PicDescriptor::new();
        let mut src = SliceSource::new(self.data);
        decode_into(&mut src, &mut pic, Stage::Tags, &self.options, &stop)?;
        Ok(pic)
    }

    /// Full decode into an existing descriptor, reusing its pixel buffer when
    /// the size matches.
    pub fn decode_into(self, pic: &mut PicDescriptor, stop: impl Stop) -> Result<(), PicError> {
        let mut src = SliceSource::new(self.data);
        decode_into(&mut src, pic, Stage::Pixels, &self.options, &stop)
    }

    /// Full decode into `pic` only if the image has exactly `pic`'s size;
    /// otherwise `pic` is left untouched.
    pub fn decode_into_checked(self, pic: &mut PicDescriptor, stop: impl Stop) -> Result<(), PicError> {
        let mut src = SliceSource::new(self.data);
        decode_into_checked(&mut src, pic, &self.options, &stop)
    }

    /// Decode one 1-based slice along the last dimension.
    pub fn decode_slice(self, slice: u32, stop: impl Stop) -> Result<PicDescriptor, PicError> {
        let mut src = SliceSource::new(self.data);
        decode_slice(&mut src, slice, &self.options, &stop)
    }
}
