use alloc::format;
use alloc::vec::Vec;

use crate::error::PicError;
use crate::pixel::ElementType;
use crate::shape::{MAX_DIM, Shape};
use crate::tags::{TagDict, TagName, Tsv};
use crate::version::{TAG_LEN, VersionTag};

/// One PIC image: element type, shape, pixel bytes and tags.
///
/// `Clone` is a deep copy: tags, nested dictionaries and the pixel buffer are
/// all duplicated.
#[derive(Clone, Debug)]
pub struct PicDescriptor {
    pub element_type: ElementType,
    /// Bits per element.
    pub bpe: u32,
    /// Extents; `shape.len()` is the rank.
    pub shape: Shape,
    pub tags: TagDict,
    pub version: VersionTag,
    /// Metadata was loaded without pixel data. Such a descriptor cannot be
    /// written.
    pub write_protect: bool,
    /// Offset of the first pixel byte in the stream it was read from or last
    /// written to.
    pub pixel_start_offset: u64,
    data: Option<Vec<u8>>,
}

impl Default for PicDescriptor {
    fn default() -> Self {
        Self::new()
    }
}

impl PicDescriptor {
    /// Empty descriptor: unknown type, no shape, no pixels, no tags.
    pub fn new() -> Self {
        Self {
            element_type: ElementType::Unknown,
            bpe: 0,
            shape: Shape::empty(),
            tags: TagDict::new(),
            version: VersionTag::canonical(),
            write_protect: false,
            pixel_start_offset: 0,
            data: None,
        }
    }

    /// Descriptor with the given header and a zero-filled pixel buffer.
    pub fn with_shape(element_type: ElementType, bpe: u32, extents: &[u32]) -> Result<Self, PicError> {
        if extents.is_empty() || extents.len() > MAX_DIM {
            return Err(PicError::InvalidDescriptor(format!(
                "rank {} outside 1..={MAX_DIM}",
                extents.len()
            )));
        }
        let mut pic = Self::new();
        pic.element_type = element_type;
        pic.bpe = bpe;
        pic.shape = Shape::new(extents).unwrap_or_default();
        pic.allocate()?;
        Ok(pic)
    }

    /// Builder-style: set the pixel bytes (in memory order).
    pub fn with_data(mut self, data: Vec<u8>) -> Result<Self, PicError> {
        self.set_data(data)?;
        Ok(self)
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Product of the extents, 0 with no dimensions.
    pub fn elements(&self) -> u64 {
        self.shape.elements()
    }

    /// Pixel payload size: `elements * bpe / 8`.
    pub fn size_in_bytes(&self) -> u64 {
        self.elements().saturating_mul(u64::from(self.bpe)) / 8
    }

    /// Size of one slice along the last dimension.
    pub fn slice_size(&self) -> u64 {
        match self.shape.last() {
            Some(n) if n > 0 => self.size_in_bytes() / u64::from(n),
            _ => 0,
        }
    }

    /// Value of the header's total-length field:
    /// `12 + 4 * rank + encoded tag size`.
    pub fn header_length(&self) -> u64 {
        12 + 4 * self.rank() as u64 + self.tags.encoded_size()
    }

    /// Offset at which an encoder places the first pixel byte.
    pub fn encoded_pixel_offset(&self) -> u64 {
        TAG_LEN as u64 + 4 + self.header_length()
    }

    /// Encryption-type byte of the version tag.
    pub fn encryption_type(&self) -> u8 {
        self.version.encryption_type()
    }

    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    pub fn data_mut(&mut self) -> Option<&mut [u8]> {
        self.data.as_deref_mut()
    }

    /// Replace the pixel buffer. Its length must equal [`Self::size_in_bytes`].
    pub fn set_data(&mut self, data: Vec<u8>) -> Result<(), PicError> {
        let expected = self.size_in_bytes();
        if data.len() as u64 != expected {
            return Err(PicError::SizeMismatch {
                expected,
                actual: data.len() as u64,
            });
        }
        self.data = Some(data);
        self.write_protect = false;
        Ok(())
    }

    /// Detach the pixel buffer.
    pub fn take_data(&mut self) -> Option<Vec<u8>> {
        self.data.take()
    }

    /// Zero-filled buffer of the current size, replacing any existing one.
    pub fn allocate(&mut self) -> Result<&mut [u8], PicError> {
        let size = usize::try_from(self.size_in_bytes())
            .map_err(|_| PicError::LimitExceeded(format!("{} pixel bytes", self.size_in_bytes())))?;
        let buf = self.data.insert(crate::limits::try_zeroed(size, "pixels")?);
        self.write_protect = false;
        Ok(buf.as_mut_slice())
    }

    pub(crate) fn data_slot(&mut self) -> &mut Option<Vec<u8>> {
        &mut self.data
    }

    /// Free pixels and tags and reset the type. The descriptor stays usable.
    pub fn clear(&mut self) {
        self.data = None;
        self.tags.clear();
        self.element_type = ElementType::Unknown;
    }

    /// Copy of the header fields only: no tags, no pixels.
    pub fn copy_header(&self) -> Self {
        let mut pic = Self::new();
        pic.element_type = self.element_type;
        pic.bpe = self.bpe;
        pic.shape = self.shape;
        pic.version = self.version;
        pic
    }

    /// Independent copy of slice `slice` (1-based) along the last dimension,
    /// with rank reduced by one and the tags cloned.
    pub fn copy_slice(&self, slice: u32) -> Result<Self, PicError> {
        if self.rank() < 2 {
            return Err(PicError::InvalidDescriptor(format!(
                "rank {} descriptor has no slices",
                self.rank()
            )));
        }
        let count = self.shape.last().unwrap_or(0);
        if slice == 0 || slice > count {
            return Err(PicError::SliceOutOfRange { slice, count });
        }
        let data = self
            .data
            .as_deref()
            .ok_or_else(|| PicError::InvalidDescriptor("no pixel data loaded".into()))?;
        let size = self.slice_size() as usize;
        let start = (slice as usize - 1) * size;
        let bytes = data
            .get(start..start + size)
            .ok_or(PicError::SizeMismatch {
                expected: self.size_in_bytes(),
                actual: data.len() as u64,
            })?
            .to_vec();

        let mut pic = self.copy_header();
        pic.shape = self.shape.without_last();
        pic.tags = self.tags.clone();
        pic.data = Some(bytes);
        Ok(pic)
    }

    /// Append a tag to the root dictionary.
    pub fn add_tag(&mut self, tsv: Tsv) {
        self.tags.insert(tsv);
    }

    /// First root tag named `name`.
    pub fn query_tag(&self, name: impl Into<TagName>) -> Option<&Tsv> {
        self.tags.get(name)
    }

    pub fn query_tag_mut(&mut self, name: impl Into<TagName>) -> Option<&mut Tsv> {
        self.tags.get_mut(name)
    }

    /// Detach the first root tag named `name` and hand it to the caller.
    pub fn remove_tag(&mut self, name: impl Into<TagName>) -> Option<Tsv> {
        self.tags.remove(name)
    }

    /// Check the header and buffer are fit to be encoded.
    pub(crate) fn validate_for_write(&self) -> Result<(), PicError> {
        if self.write_protect {
            return Err(PicError::WriteProtected);
        }
        if self.shape.is_empty() {
            return Err(PicError::InvalidDescriptor("rank 0".into()));
        }
        if let Some(data) = &self.data {
            let expected = self.size_in_bytes();
            if data.len() as u64 != expected {
                return Err(PicError::SizeMismatch {
                    expected,
                    actual: data.len() as u64,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn sample() -> PicDescriptor {
        let mut pic = PicDescriptor::with_shape(ElementType::UInt, 16, &[2, 2, 3]).unwrap();
        for (i, b) in pic.data_mut().unwrap().iter_mut().enumerate() {
            *b = i as u8;
        }
        pic.add_tag(Tsv::ascii("NOTE", "hi"));
        pic
    }

    #[test]
    fn new_is_empty() {
        let pic = PicDescriptor::new();
        assert_eq!(pic.element_type, ElementType::Unknown);
        assert_eq!(pic.rank(), 0);
        assert!(pic.data().is_none());
        assert!(pic.tags.is_empty());
        assert!(!pic.version.is_encrypted());
    }

    #[test]
    fn size_arithmetic() {
        let pic = sample();
        assert_eq!(pic.elements(), 12);
        assert_eq!(pic.size_in_bytes(), 24);
        assert_eq!(pic.slice_size(), 8);
        assert_eq!(pic.header_length(), 12 + 12 + pic.tags.encoded_size());
    }

    #[test]
    fn clone_is_deep() {
        let pic = sample();
        let mut copy = pic.clone();
        copy.data_mut().unwrap()[0] = 99;
        copy.query_tag_mut("NOTE").unwrap().data_mut().unwrap()[0] = b'H';
        assert_eq!(pic.data().unwrap()[0], 0);
        assert_eq!(pic.query_tag("NOTE").unwrap().as_str(), Some("hi"));
    }

    #[test]
    fn clear_keeps_descriptor_usable() {
        let mut pic = sample();
        pic.clear();
        assert!(pic.data().is_none());
        assert!(pic.tags.is_empty());
        assert_eq!(pic.element_type, ElementType::Unknown);
        pic.add_tag(Tsv::ascii("AGAIN", "ok"));
        assert_eq!(pic.tags.len(), 1);
    }

    #[test]
    fn copy_slice_takes_last_dimension() {
        let pic = sample();
        let second = pic.copy_slice(2).unwrap();
        assert_eq!(second.shape.as_slice(), &[2, 2]);
        assert_eq!(second.data().unwrap(), &[8, 9, 10, 11, 12, 13, 14, 15]);
        assert!(second.query_tag("NOTE").is_some());
        assert!(matches!(pic.copy_slice(4), Err(PicError::SliceOutOfRange { slice: 4, count: 3 })));
        assert!(matches!(pic.copy_slice(0), Err(PicError::SliceOutOfRange { .. })));
    }

    #[test]
    fn set_data_checks_size() {
        let mut pic = PicDescriptor::with_shape(ElementType::Int, 32, &[3]).unwrap();
        assert!(matches!(
            pic.set_data(vec![0; 11]),
            Err(PicError::SizeMismatch { expected: 12, actual: 11 })
        ));
        pic.set_data(vec![1; 12]).unwrap();
    }

    #[test]
    fn write_protected_is_not_writable() {
        let mut pic = sample();
        pic.write_protect = true;
        assert!(matches!(pic.validate_for_write(), Err(PicError::WriteProtected)));
    }
}
