//! # zenpic
//!
//! Reader and writer for the PIC (DKFZ) n-dimensional image format.
//!
//! A PIC stream is a 32-byte version tag, a small fixed header (element type,
//! bits per element, rank and up to 8 extents), a recursive dictionary of
//! named, typed tags, and the raw pixel payload. Everything on disk is
//! little-endian; buffers in memory use the host byte order unless a request
//! says otherwise.
//!
//! ## Supported input
//!
//! - **Modern** streams starting with `"PIC VERSION"`, including nested tag
//!   dictionaries and files whose text tags were redacted (`'e'` encryption
//!   type).
//! - **Legacy** pre-3.0 streams without the version tag. These carry no tags.
//! - **Gzip** framing around either, via the gzip-aware file path (`gzip`
//!   feature): paths ending in `.gz`, the automatic `<path>.gz` fallback, or
//!   [`ReadRequest::with_gzip`].
//!
//! ## Non-Goals
//!
//! - Pixel-level processing (resampling, conversions between element types)
//! - Decrypting redacted tags
//! - Writing the legacy layout
//!
//! ## Usage
//!
//! ```
//! use zenpic::{DecodeRequest, ElementType, EncodeRequest, PicDescriptor, Tsv, Unstoppable};
//!
//! let mut pic = PicDescriptor::with_shape(ElementType::UInt, 8, &[4, 3])?;
//! pic.data_mut().unwrap().copy_from_slice(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]);
//! pic.add_tag(Tsv::ascii("NOTE", "hi"));
//!
//! let bytes = EncodeRequest::new(&pic).encode(Unstoppable)?;
//! let back = DecodeRequest::new(&bytes).decode(Unstoppable)?;
//! assert_eq!(back.query_tag("NOTE").and_then(|t| t.as_str()), Some("hi"));
//! # Ok::<(), zenpic::PicError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

mod decode;
mod descriptor;
mod encode;
mod endian;
mod error;
mod format;
mod info;
mod io;
mod legacy;
mod limits;
mod memory;
mod pixel;
mod shape;
mod tags;
mod version;

#[cfg(feature = "std")]
mod file;

// Re-exports
pub use decode::{CHUNK_SIZE, DecodeRequest, ShortReadPolicy};
pub use descriptor::PicDescriptor;
pub use encode::{Compression, EncodeRequest};
pub use endian::{ByteOrder, copy_with_swap, detect_host_order, swap_in_place};
pub use enough::{Stop, Unstoppable};
pub use error::{ErrorKind, PicError};
pub use format::{GZIP_MAGIC, PIC_MAGIC, PicFormat, sniff};
pub use limits::{Limits, MAX_TAG_DEPTH};
pub use memory::{decode, decode_header, decode_tags, encode};
pub use pixel::ElementType;
pub use shape::{MAX_DIM, Shape};
pub use tags::{ENCRYPTED_PLACEHOLDER, TagDict, TagName, TagValue, Tsv};
pub use version::{
    ENCRYPTION_NONE, ENCRYPTION_REDACTED, PIC_VERSION, PIC_VERSION_ENCRYPTED, TAG_LEN, VersionTag,
};

#[cfg(feature = "std")]
pub use file::{
    ReadRequest, STDIN, STDOUT, get, get_header, get_into, get_into_checked, get_slice, get_tags,
    get_tags_into, put, put_slice,
};
