//! PIC encoding, written once against [`ByteSink`].
//!
//! The writer emits the canonical version tag (or the descriptor's own tag
//! when it is marked encrypted), the fixed header, the tag dictionary and
//! the pixel payload in one bulk write. Multi-byte elements are written
//! little-endian; `NonUniform` data is copied raw.

use alloc::format;
use alloc::vec;
use alloc::vec::Vec;

use enough::Stop;

use crate::descriptor::PicDescriptor;
use crate::endian::{ByteOrder, copy_to_le, detect_host_order};
use crate::error::PicError;
use crate::io::{ByteSink, VecSink};
use crate::tags::write_tags;
use crate::version::VersionTag;

/// Compression applied to a written stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum Compression {
    #[default]
    None,
    /// Gzip framing at the given level (0..=9).
    #[cfg(feature = "gzip")]
    Gzip(u32),
}

/// Write `pic` to `sink`. Returns the offset of the first pixel byte.
pub(crate) fn encode_stream<K: ByteSink + ?Sized>(
    pic: &PicDescriptor,
    sink: &mut K,
    memory_order: ByteOrder,
    stop: &dyn Stop,
) -> Result<u64, PicError> {
    pic.validate_for_write()?;

    let version = if pic.version.is_encrypted() {
        tracing::warn!(
            encryption_type = %char::from(pic.encryption_type()),
            "writing encrypted descriptor; redacted tags are written as placeholders"
        );
        pic.version
    } else {
        VersionTag::canonical()
    };
    let header_length = pic.header_length();
    let total_length = u32::try_from(header_length).map_err(|_| {
        PicError::InvalidDescriptor(format!("header of {header_length} bytes exceeds 4 GiB"))
    })?;

    sink.write_all(version.as_bytes())?;
    sink.write_u32_le(total_length)?;
    sink.write_u32_le(pic.element_type.raw())?;
    sink.write_u32_le(pic.bpe)?;
    sink.write_u32_le(pic.rank() as u32)?;
    for &extent in pic.shape.as_slice() {
        sink.write_u32_le(extent)?;
    }

    write_tags(&pic.tags, sink, memory_order, stop)?;
    let pixel_start = sink.position();

    if let Some(data) = pic.data() {
        stop.check()?;
        write_pixels(data, pic.element_type.swap_width(pic.bpe), sink, memory_order)?;
    }
    Ok(pixel_start)
}

/// Bulk-write `data` as little-endian elements of `width` bytes.
pub(crate) fn write_pixels<K: ByteSink + ?Sized>(
    data: &[u8],
    width: usize,
    sink: &mut K,
    memory_order: ByteOrder,
) -> Result<(), PicError> {
    if width > 1 && memory_order.swaps_against_le() {
        let mut le = vec![0u8; data.len()];
        copy_to_le(data, &mut le, width, memory_order);
        sink.write_all(&le)
    } else {
        sink.write_all(data)
    }
}

/// Encode a [`PicDescriptor`] to bytes or to a writer.
#[derive(Clone, Debug)]
pub struct EncodeRequest<'a> {
    pic: &'a PicDescriptor,
    memory_order: ByteOrder,
    compression: Compression,
}

impl<'a> EncodeRequest<'a> {
    pub fn new(pic: &'a PicDescriptor) -> Self {
        Self {
            pic,
            memory_order: detect_host_order(),
            compression: Compression::None,
        }
    }

    /// Byte order of multi-byte elements in the descriptor's buffers.
    /// Defaults to the host order.
    pub fn with_memory_order(mut self, order: ByteOrder) -> Self {
        self.memory_order = order;
        self
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    pub fn encode(self, stop: impl Stop) -> Result<Vec<u8>, PicError> {
        let mut out = Vec::with_capacity(
            (self.pic.encoded_pixel_offset() + self.pic.size_in_bytes()).min(1 << 30) as usize,
        );
        self.encode_into(&mut out, stop)?;
        Ok(out)
    }

    /// Append the encoded stream to `out`. Returns the offset of the first
    /// pixel byte within the uncompressed stream.
    pub fn encode_into(self, out: &mut Vec<u8>, stop: impl Stop) -> Result<u64, PicError> {
        match self.compression {
            Compression::None => {
                encode_stream(self.pic, &mut VecSink::new(out), self.memory_order, &stop)
            }
            #[cfg(feature = "gzip")]
            Compression::Gzip(_) => self.write_to(out, stop),
        }
    }

    /// Encode to any writer. Returns the offset of the first pixel byte
    /// within the uncompressed stream.
    #[cfg(feature = "std")]
    pub fn write_to<W: std::io::Write>(self, writer: W, stop: impl Stop) -> Result<u64, PicError> {
        use crate::io::IoSink;
        match self.compression {
            Compression::None => {
                let mut sink = IoSink::new(writer);
                let offset = encode_stream(self.pic, &mut sink, self.memory_order, &stop)?;
                sink.into_inner().flush()?;
                Ok(offset)
            }
            #[cfg(feature = "gzip")]
            Compression::Gzip(level) => {
                let encoder =
                    flate2::write::GzEncoder::new(writer, flate2::Compression::new(level.min(9)));
                let mut sink = IoSink::new(encoder);
                let offset = encode_stream(self.pic, &mut sink, self.memory_order, &stop)?;
                sink.into_inner().finish()?.flush()?;
                Ok(offset)
            }
        }
    }

    /// Write to a file, replacing any existing one, or to standard output
    /// for the path `"stdout"`. Nothing is touched when the descriptor
    /// cannot be written.
    #[cfg(feature = "std")]
    pub fn write_to_path(
        self,
        path: impl AsRef<std::path::Path>,
        stop: impl Stop,
    ) -> Result<u64, PicError> {
        self.pic.validate_for_write()?;
        crate::file::create_output(path.as_ref(), |out| self.write_to(out, stop))
    }

    /// Write the descriptor as slice `slice` (1-based) along the last
    /// dimension of an uncompressed file, creating it when missing.
    #[cfg(feature = "std")]
    pub fn write_slice_to_path(
        self,
        path: impl AsRef<std::path::Path>,
        slice: u32,
        stop: impl Stop,
    ) -> Result<(), PicError> {
        if self.compression != Compression::None {
            return Err(PicError::InvalidDescriptor(
                "slices are written to uncompressed files only".into(),
            ));
        }
        crate::file::write_slice(self.pic, path.as_ref(), slice, self.memory_order, &stop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::ElementType;
    use crate::tags::Tsv;
    use enough::Unstoppable;

    fn sample() -> PicDescriptor {
        let mut pic = PicDescriptor::with_shape(ElementType::UInt, 8, &[4, 3]).unwrap();
        pic.data_mut().unwrap().copy_from_slice(&(0..12).collect::<Vec<u8>>());
        pic.add_tag(Tsv::ascii("NOTE", "hi"));
        pic
    }

    fn word(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
    }

    #[test]
    fn header_layout() {
        let pic = sample();
        let bytes = EncodeRequest::new(&pic).encode(Unstoppable).unwrap();
        assert_eq!(&bytes[..16], b"PIC VERSION 3.00");
        assert_eq!(bytes[16], b' ');
        let tags = pic.tags.encoded_size() as u32;
        assert_eq!(word(&bytes, 32), 12 + 8 + tags);
        assert_eq!(word(&bytes, 36), ElementType::UInt.raw());
        assert_eq!(word(&bytes, 40), 8);
        assert_eq!(word(&bytes, 44), 2);
        assert_eq!(word(&bytes, 48), 4);
        assert_eq!(word(&bytes, 52), 3);
        let start = pic.encoded_pixel_offset() as usize;
        assert_eq!(start, 56 + tags as usize);
        assert_eq!(&bytes[start..], &(0..12).collect::<Vec<u8>>()[..]);
        assert_eq!(bytes.len(), start + 12);
    }

    #[test]
    fn returns_pixel_offset() {
        let pic = sample();
        let mut out = vec![0xAA; 3];
        let offset = EncodeRequest::new(&pic).encode_into(&mut out, Unstoppable).unwrap();
        assert_eq!(offset, pic.encoded_pixel_offset());
        assert_eq!(&out[..3], &[0xAA; 3]);
    }

    #[test]
    fn refuses_write_protected() {
        let mut pic = sample();
        pic.write_protect = true;
        let mut out = Vec::new();
        let err = EncodeRequest::new(&pic).encode_into(&mut out, Unstoppable).unwrap_err();
        assert!(matches!(err, PicError::WriteProtected));
        assert!(out.is_empty());
    }

    #[test]
    fn big_endian_memory_is_written_little_endian() {
        let mut pic = PicDescriptor::with_shape(ElementType::Int, 32, &[2]).unwrap();
        pic.data_mut().unwrap().copy_from_slice(&[0, 0, 1, 2, 0, 0, 0, 9]);
        let bytes = EncodeRequest::new(&pic)
            .with_memory_order(ByteOrder::Big)
            .encode(Unstoppable)
            .unwrap();
        assert_eq!(&bytes[bytes.len() - 8..], &[2, 1, 0, 0, 9, 0, 0, 0]);
    }

    #[test]
    fn non_uniform_is_never_swapped() {
        let mut pic = PicDescriptor::with_shape(ElementType::NonUniform, 32, &[2]).unwrap();
        pic.data_mut().unwrap().copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let bytes = EncodeRequest::new(&pic)
            .with_memory_order(ByteOrder::Big)
            .encode(Unstoppable)
            .unwrap();
        assert_eq!(&bytes[bytes.len() - 8..], &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn encrypted_version_is_kept() {
        let mut pic = sample();
        pic.version = VersionTag::encrypted();
        let bytes = EncodeRequest::new(&pic).encode(Unstoppable).unwrap();
        assert_eq!(&bytes[..32], VersionTag::encrypted().as_bytes());
    }

    #[test]
    fn non_canonical_plain_version_is_normalized() {
        let mut pic = sample();
        let mut raw = *VersionTag::canonical().as_bytes();
        raw[15] = b'1';
        pic.version = VersionTag::from_bytes(raw);
        let bytes = EncodeRequest::new(&pic).encode(Unstoppable).unwrap();
        assert_eq!(&bytes[..32], VersionTag::canonical().as_bytes());
    }

    #[cfg(feature = "gzip")]
    #[test]
    fn gzip_output_has_gzip_magic() {
        let pic = sample();
        let bytes = EncodeRequest::new(&pic)
            .with_compression(Compression::Gzip(6))
            .encode(Unstoppable)
            .unwrap();
        assert_eq!(&bytes[..2], &[0x1F, 0x8B]);
    }
}
