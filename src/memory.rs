//! One-call in-memory codec.
//!
//! Thin wrappers over [`DecodeRequest`] and [`EncodeRequest`] with default
//! options and no cancellation. They run the same reader and writer as the
//! stream codec, so `encode(pic)` is byte-for-byte what
//! [`put`](crate::put) writes to an uncompressed file.

use alloc::vec::Vec;

use enough::Unstoppable;

use crate::decode::DecodeRequest;
use crate::descriptor::PicDescriptor;
use crate::encode::EncodeRequest;
use crate::error::PicError;

/// Decode a complete image.
pub fn decode(data: &[u8]) -> Result<PicDescriptor, PicError> {
    DecodeRequest::new(data).decode(Unstoppable)
}

/// Decode the fixed header only (no tags, no pixels, write protected).
pub fn decode_header(data: &[u8]) -> Result<PicDescriptor, PicError> {
    DecodeRequest::new(data).decode_header()
}

/// Decode header and tags (no pixels, write protected).
pub fn decode_tags(data: &[u8]) -> Result<PicDescriptor, PicError> {
    DecodeRequest::new(data).decode_tags(Unstoppable)
}

/// Encode a descriptor with its pixels in host byte order.
pub fn encode(pic: &PicDescriptor) -> Result<Vec<u8>, PicError> {
    EncodeRequest::new(pic).encode(Unstoppable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::ElementType;
    use crate::tags::{TagDict, Tsv};

    #[test]
    fn note_tag_example() {
        let mut pic = PicDescriptor::with_shape(ElementType::UInt, 8, &[4, 3]).unwrap();
        pic.data_mut().unwrap().copy_from_slice(&(0..12).collect::<Vec<u8>>());
        pic.add_tag(Tsv::ascii("NOTE", "hi"));

        let back = decode(&encode(&pic).unwrap()).unwrap();
        let note = back.query_tag("NOTE").unwrap();
        assert_eq!(note.element_type(), ElementType::Ascii);
        assert_eq!(note.shape().as_slice(), &[2]);
        assert_eq!(note.data().unwrap(), b"hi\0");
        assert_eq!(back.data().unwrap(), &(0..12).collect::<Vec<u8>>()[..]);
        assert!(!back.write_protect);
    }

    #[test]
    fn header_and_tags_only() {
        let mut pic = PicDescriptor::with_shape(ElementType::Float, 32, &[2, 2]).unwrap();
        let mut nested = TagDict::new();
        nested.insert(Tsv::ascii("A", "x"));
        pic.add_tag(Tsv::nested("GROUP", nested));
        let bytes = encode(&pic).unwrap();

        let header = decode_header(&bytes).unwrap();
        assert!(header.write_protect);
        assert!(header.tags.is_empty());
        assert!(header.data().is_none());
        assert_eq!(header.shape.as_slice(), &[2, 2]);

        let tags = decode_tags(&bytes).unwrap();
        assert!(tags.write_protect);
        assert!(tags.data().is_none());
        assert_eq!(tags.tags, pic.tags);
        assert_eq!(tags.pixel_start_offset, pic.encoded_pixel_offset());
        assert!(matches!(encode(&tags), Err(PicError::WriteProtected)));
    }
}
