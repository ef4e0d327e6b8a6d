//! Tag dictionaries: ordered, possibly nested, typed name/value entries.
//!
//! # Entry encoding
//!
//! ```text
//! 32 bytes  name (space padded, not byte swapped)
//! u32 LE    entry length = 12 + 4 * dim + payload length
//! u32 LE    element type
//! u32 LE    bits per element
//! u32 LE    dim (0..=8)
//! dim × u32 LE extents
//! payload   elements * bpe / 8 bytes, or a nested dictionary for TagDict
//! ```
//!
//! Names are not unique. Lookups return the first entry in insertion order
//! whose 32-byte name matches.

use alloc::borrow::Cow;
use alloc::format;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use enough::Stop;

use crate::endian::{ByteOrder, convert_le, copy_to_le};
use crate::error::PicError;
use crate::io::{ByteSink, ByteSource};
use crate::limits::Limits;
use crate::pixel::ElementType;
use crate::shape::{MAX_DIM, Shape};
use crate::version::{ENCRYPTION_REDACTED, TAG_LEN};

/// Value that replaces redacted ASCII and non-uniform tag payloads.
pub const ENCRYPTED_PLACEHOLDER: &str = "*** ENCRYPTED ***";

/// Bytes of an entry preceding its `entry length` budget: name + length word.
const ENTRY_PREFIX_LEN: u64 = TAG_LEN as u64 + 4;

/// Default bits-per-element recorded for nested dictionaries.
const NESTED_BPE: u32 = 32;

// ── TagName ─────────────────────────────────────────────────────────

/// Fixed 32-byte tag name. Shorter names are padded with spaces.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TagName([u8; TAG_LEN]);

impl TagName {
    /// Pad (or truncate) `name` to 32 bytes.
    pub fn new(name: &str) -> Self {
        Self::from_padded(name.as_bytes())
    }

    /// Pad (or truncate) raw bytes to 32 bytes.
    pub fn from_padded(name: &[u8]) -> Self {
        let mut bytes = [b' '; TAG_LEN];
        let n = name.len().min(TAG_LEN);
        bytes[..n].copy_from_slice(&name[..n]);
        Self(bytes)
    }

    /// Name exactly as stored on disk.
    pub const fn from_bytes(bytes: [u8; TAG_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; TAG_LEN] {
        &self.0
    }

    /// Display form with trailing padding (spaces and NULs) removed.
    pub fn to_str_lossy(&self) -> Cow<'_, str> {
        let end = self
            .0
            .iter()
            .rposition(|&b| b != b' ' && b != 0)
            .map_or(0, |i| i + 1);
        String::from_utf8_lossy(&self.0[..end])
    }
}

impl From<&str> for TagName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<&TagName> for TagName {
    fn from(name: &TagName) -> Self {
        *name
    }
}

impl core::fmt::Debug for TagName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "TagName({:?})", self.to_str_lossy())
    }
}

impl core::fmt::Display for TagName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.to_str_lossy())
    }
}

// ── Tsv ─────────────────────────────────────────────────────────────

/// Payload of a tag.
#[derive(Clone, Debug, PartialEq)]
pub enum TagValue {
    /// Typed element bytes in memory order. ASCII values carry one extra
    /// trailing NUL beyond `elements` bytes.
    Data(Vec<u8>),
    /// A nested dictionary (element type [`ElementType::TagDict`]).
    Nested(TagDict),
}

/// One tag: name, element type, bits per element, shape and value.
#[derive(Clone, Debug, PartialEq)]
pub struct Tsv {
    name: TagName,
    element_type: ElementType,
    bpe: u32,
    shape: Shape,
    value: TagValue,
}

impl Tsv {
    /// Build a data tag from element bytes in memory order.
    ///
    /// ASCII and non-uniform tags always get `bpe = 8`. `bytes` must hold
    /// exactly `elements * bpe / 8` bytes; ASCII values may additionally carry
    /// the trailing NUL, which is appended when missing.
    pub fn new(
        name: impl Into<TagName>,
        element_type: ElementType,
        bpe: u32,
        extents: &[u32],
        mut bytes: Vec<u8>,
    ) -> Result<Self, PicError> {
        if element_type == ElementType::TagDict {
            return Err(PicError::InvalidDescriptor(
                "tag dictionaries are built with Tsv::nested".into(),
            ));
        }
        let shape = Shape::new(extents).ok_or_else(|| {
            PicError::InvalidDescriptor(format!("{} tag dimensions exceed {MAX_DIM}", extents.len()))
        })?;
        let bpe = if element_type.is_byte_string() { 8 } else { bpe };
        let expected = data_size(&shape, bpe);
        let actual = bytes.len() as u64;
        if element_type == ElementType::Ascii {
            if actual == expected {
                bytes.push(0);
            } else if actual != expected + 1 {
                return Err(PicError::SizeMismatch { expected, actual });
            }
        } else if actual != expected {
            return Err(PicError::SizeMismatch { expected, actual });
        }
        Ok(Self {
            name: name.into(),
            element_type,
            bpe,
            shape,
            value: TagValue::Data(bytes),
        })
    }

    /// ASCII tag holding `text`; `shape[0]` is the text length.
    pub fn ascii(name: impl Into<TagName>, text: &str) -> Self {
        let mut bytes = Vec::with_capacity(text.len() + 1);
        bytes.extend_from_slice(text.as_bytes());
        bytes.push(0);
        Self {
            name: name.into(),
            element_type: ElementType::Ascii,
            bpe: 8,
            shape: Shape::new(&[text.len() as u32]).unwrap_or_default(),
            value: TagValue::Data(bytes),
        }
    }

    /// Nested dictionary tag.
    pub fn nested(name: impl Into<TagName>, dict: TagDict) -> Self {
        Self {
            name: name.into(),
            element_type: ElementType::TagDict,
            bpe: NESTED_BPE,
            shape: Shape::empty(),
            value: TagValue::Nested(dict),
        }
    }

    fn redacted(name: TagName) -> Self {
        let mut tsv = Self::ascii(name, ENCRYPTED_PLACEHOLDER);
        tsv.name = name;
        tsv
    }

    pub fn name(&self) -> &TagName {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<TagName>) {
        self.name = name.into();
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn bpe(&self) -> u32 {
        self.bpe
    }

    /// Number of dimensions.
    pub fn dim(&self) -> usize {
        self.shape().len()
    }

    /// Shape of the value. For nested dictionaries this is `[entry count]`,
    /// or no dimensions when the dictionary is empty.
    pub fn shape(&self) -> Shape {
        match &self.value {
            TagValue::Nested(dict) if !dict.is_empty() => {
                Shape::new(&[dict.len() as u32]).unwrap_or_default()
            }
            TagValue::Nested(_) => Shape::empty(),
            TagValue::Data(_) => self.shape,
        }
    }

    pub fn value(&self) -> &TagValue {
        &self.value
    }

    /// Element bytes of a data tag, including the ASCII trailing NUL.
    pub fn data(&self) -> Option<&[u8]> {
        match &self.value {
            TagValue::Data(bytes) => Some(bytes),
            TagValue::Nested(_) => None,
        }
    }

    pub fn data_mut(&mut self) -> Option<&mut [u8]> {
        match &mut self.value {
            TagValue::Data(bytes) => Some(bytes),
            TagValue::Nested(_) => None,
        }
    }

    /// Text of an ASCII tag, without the trailing NUL.
    pub fn as_str(&self) -> Option<&str> {
        if self.element_type != ElementType::Ascii {
            return None;
        }
        let bytes = self.data()?;
        let len = (self.shape.elements() as usize).min(bytes.len());
        core::str::from_utf8(&bytes[..len]).ok()
    }

    pub fn nested_dict(&self) -> Option<&TagDict> {
        match &self.value {
            TagValue::Nested(dict) => Some(dict),
            TagValue::Data(_) => None,
        }
    }

    pub fn nested_dict_mut(&mut self) -> Option<&mut TagDict> {
        match &mut self.value {
            TagValue::Nested(dict) => Some(dict),
            TagValue::Data(_) => None,
        }
    }

    /// Element count: product of the shape, 0 without dimensions.
    pub fn elements(&self) -> u64 {
        self.shape().elements()
    }

    /// Encoded payload length (ASCII excludes the trailing NUL).
    pub fn payload_size(&self) -> u64 {
        match &self.value {
            TagValue::Nested(dict) => dict.encoded_size(),
            TagValue::Data(_) => data_size(&self.shape, self.bpe),
        }
    }

    /// The `entry length` word: type, bpe, dim, extents and payload.
    pub fn entry_length(&self) -> u64 {
        12 + 4 * self.dim() as u64 + self.payload_size()
    }

    /// Total encoded size including the name and the length word.
    pub fn encoded_size(&self) -> u64 {
        ENTRY_PREFIX_LEN + self.entry_length()
    }

    /// Append `tsv` to this nested dictionary.
    pub fn add_sub_tag(&mut self, tsv: Tsv) -> Result<(), PicError> {
        self.nested_dict_mut().ok_or(PicError::NotNested)?.insert(tsv);
        Ok(())
    }

    /// First sub-tag named `name`, if this is a nested dictionary.
    pub fn query_sub_tag(&self, name: impl Into<TagName>) -> Option<&Tsv> {
        self.nested_dict()?.get(name)
    }

    /// Detach the first sub-tag named `name` and hand it to the caller. The
    /// parent's reported element count drops by one.
    pub fn remove_sub_tag(&mut self, name: impl Into<TagName>) -> Option<Tsv> {
        self.nested_dict_mut()?.remove(name)
    }
}

fn data_size(shape: &Shape, bpe: u32) -> u64 {
    shape.elements().saturating_mul(u64::from(bpe)) / 8
}

// ── TagDict ─────────────────────────────────────────────────────────

/// Insertion-ordered tag dictionary. Duplicate names are allowed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TagDict {
    entries: Vec<Tsv>,
}

impl TagDict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries (not counting nested ones).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Tsv> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> core::slice::IterMut<'_, Tsv> {
        self.entries.iter_mut()
    }

    /// Append at the tail.
    pub fn insert(&mut self, tsv: Tsv) {
        self.entries.push(tsv);
    }

    /// Index of the first entry named `name`.
    pub fn position(&self, name: impl Into<TagName>) -> Option<usize> {
        let name = name.into();
        self.entries.iter().position(|t| t.name == name)
    }

    pub fn get(&self, name: impl Into<TagName>) -> Option<&Tsv> {
        self.position(name).map(|i| &self.entries[i])
    }

    pub fn get_mut(&mut self, name: impl Into<TagName>) -> Option<&mut Tsv> {
        self.position(name).map(move |i| &mut self.entries[i])
    }

    /// Detach the first entry named `name`, preserving the order of the rest.
    pub fn remove(&mut self, name: impl Into<TagName>) -> Option<Tsv> {
        self.position(name).map(|i| self.entries.remove(i))
    }

    /// Drop every entry, recursively.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Encoded size of all entries. Always equal to the bytes
    /// [`write_tags`] emits for this dictionary.
    pub fn encoded_size(&self) -> u64 {
        self.entries.iter().map(Tsv::encoded_size).sum()
    }
}

impl<'a> IntoIterator for &'a TagDict {
    type Item = &'a Tsv;
    type IntoIter = core::slice::Iter<'a, Tsv>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for TagDict {
    type Item = Tsv;
    type IntoIter = alloc::vec::IntoIter<Tsv>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<Tsv> for TagDict {
    fn from_iter<I: IntoIterator<Item = Tsv>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

// ── Stream encoding ─────────────────────────────────────────────────

/// Shared state of one recursive tag read.
pub(crate) struct TagReader<'a> {
    pub encryption_type: u8,
    pub memory_order: ByteOrder,
    pub limits: Option<&'a Limits>,
    pub stop: &'a dyn Stop,
}

impl TagReader<'_> {
    /// Read entries into `dict` until exactly `bytes_to_read` are consumed.
    pub(crate) fn read_tags<S: ByteSource + ?Sized>(
        &self,
        dict: &mut TagDict,
        mut bytes_to_read: u64,
        src: &mut S,
        depth: u32,
    ) -> Result<(), PicError> {
        crate::limits::check_tag_depth(depth, self.limits.and_then(|l| l.max_tag_depth))?;
        while bytes_to_read > 0 {
            self.stop.check()?;
            if bytes_to_read < ENTRY_PREFIX_LEN + 12 {
                return Err(PicError::CorruptTagStream(format!(
                    "{bytes_to_read} trailing bytes cannot hold a tag entry"
                )));
            }

            let mut raw_name = [0u8; TAG_LEN];
            src.read_exact(&mut raw_name)?;
            let name = TagName::from_bytes(raw_name);
            let entry_length = u64::from(src.read_u32_le()?);
            let consumed = ENTRY_PREFIX_LEN + entry_length;
            if consumed > bytes_to_read {
                return Err(PicError::CorruptTagStream(format!(
                    "tag {name} claims {consumed} bytes, only {bytes_to_read} remain"
                )));
            }

            let raw_type = src.read_u32_le()?;
            let mut bpe = src.read_u32_le()?;
            let dim = src.read_u32_le()? as usize;
            if dim > MAX_DIM {
                return Err(PicError::CorruptTagStream(format!(
                    "tag {name} has {dim} dimensions"
                )));
            }
            let mut extents = [0u32; MAX_DIM];
            for extent in extents.iter_mut().take(dim) {
                *extent = src.read_u32_le()?;
            }
            let element_type = ElementType::from_raw(raw_type).ok_or_else(|| {
                PicError::CorruptTagStream(format!("tag {name} has unknown type {raw_type}"))
            })?;
            let payload_len = entry_length
                .checked_sub(12 + 4 * dim as u64)
                .ok_or_else(|| {
                    PicError::CorruptTagStream(format!(
                        "tag {name} length {entry_length} shorter than its header"
                    ))
                })?;

            let tsv = if element_type == ElementType::TagDict {
                let mut nested = TagDict::new();
                self.read_tags(&mut nested, payload_len, src, depth + 1)?;
                Tsv {
                    name,
                    element_type,
                    bpe,
                    shape: Shape::empty(),
                    value: TagValue::Nested(nested),
                }
            } else {
                let shape = Shape::from_raw(extents, dim).unwrap_or_default();
                if element_type.is_byte_string() {
                    bpe = 8;
                }
                let size = data_size(&shape, bpe);
                if size != payload_len {
                    return Err(PicError::CorruptTagStream(format!(
                        "tag {name}: shape {shape} x {bpe} bits needs {size} bytes, entry holds {payload_len}"
                    )));
                }
                if self.encryption_type == ENCRYPTION_REDACTED && element_type.is_byte_string() {
                    src.skip_exact(payload_len)?;
                    let name = if element_type == ElementType::NonUniform {
                        TagName::new(ENCRYPTED_PLACEHOLDER)
                    } else {
                        name
                    };
                    Tsv::redacted(name)
                } else {
                    self.read_data(src, name, element_type, bpe, shape, size)?
                }
            };

            dict.insert(tsv);
            bytes_to_read -= consumed;
        }
        Ok(())
    }

    fn read_data<S: ByteSource + ?Sized>(
        &self,
        src: &mut S,
        name: TagName,
        element_type: ElementType,
        bpe: u32,
        shape: Shape,
        size: u64,
    ) -> Result<Tsv, PicError> {
        if src.remaining_hint().is_some_and(|left| left < size) {
            return Err(PicError::UnexpectedEof);
        }
        let size = usize::try_from(size)
            .map_err(|_| PicError::LimitExceeded(format!("tag {name} of {size} bytes")))?;
        let extra = usize::from(element_type == ElementType::Ascii);
        let mut bytes = crate::limits::try_zeroed(size + extra, "tag data")?;
        src.read_exact(&mut bytes[..size])?;
        convert_le(
            &mut bytes[..size],
            element_type.swap_width(bpe),
            self.memory_order,
        );
        Ok(Tsv {
            name,
            element_type,
            bpe,
            shape,
            value: TagValue::Data(bytes),
        })
    }
}

/// Write every entry of `dict` in order. Emits exactly
/// [`TagDict::encoded_size`] bytes.
pub(crate) fn write_tags<K: ByteSink + ?Sized>(
    dict: &TagDict,
    sink: &mut K,
    memory_order: ByteOrder,
    stop: &dyn Stop,
) -> Result<(), PicError> {
    for tsv in dict {
        stop.check()?;
        let shape = tsv.shape();
        let entry_length = u32::try_from(tsv.entry_length()).map_err(|_| {
            PicError::InvalidDescriptor(format!("tag {} exceeds 4 GiB", tsv.name))
        })?;
        sink.write_all(tsv.name.as_bytes())?;
        sink.write_u32_le(entry_length)?;
        sink.write_u32_le(tsv.element_type.raw())?;
        sink.write_u32_le(tsv.bpe)?;
        sink.write_u32_le(shape.len() as u32)?;
        for &extent in shape.as_slice() {
            sink.write_u32_le(extent)?;
        }
        match &tsv.value {
            TagValue::Nested(nested) => write_tags(nested, sink, memory_order, stop)?,
            TagValue::Data(bytes) => {
                let payload = &bytes[..tsv.payload_size() as usize];
                let width = tsv.element_type.swap_width(tsv.bpe);
                if width > 1 && memory_order.swaps_against_le() {
                    let mut le = vec![0u8; payload.len()];
                    copy_to_le(payload, &mut le, width, memory_order);
                    sink.write_all(&le)?;
                } else {
                    sink.write_all(payload)?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{SliceSource, VecSink};
    use crate::version::ENCRYPTION_NONE;
    use enough::Unstoppable;

    fn encode(dict: &TagDict) -> Vec<u8> {
        let mut out = Vec::new();
        write_tags(dict, &mut VecSink::new(&mut out), ByteOrder::native(), &Unstoppable).unwrap();
        out
    }

    fn decode(bytes: &[u8], encryption_type: u8) -> Result<TagDict, PicError> {
        let reader = TagReader {
            encryption_type,
            memory_order: ByteOrder::native(),
            limits: None,
            stop: &Unstoppable,
        };
        let mut dict = TagDict::new();
        reader.read_tags(&mut dict, bytes.len() as u64, &mut SliceSource::new(bytes), 0)?;
        Ok(dict)
    }

    fn u16_tag(name: &str, values: &[u16]) -> Tsv {
        let bytes = values.iter().flat_map(|v| v.to_ne_bytes()).collect();
        Tsv::new(name, ElementType::UInt, 16, &[values.len() as u32], bytes).unwrap()
    }

    #[test]
    fn names_are_space_padded() {
        let name = TagName::new("NOTE");
        assert_eq!(&name.as_bytes()[..4], b"NOTE");
        assert!(name.as_bytes()[4..].iter().all(|&b| b == b' '));
        assert_eq!(name.to_str_lossy(), "NOTE");
    }

    #[test]
    fn long_names_are_truncated_to_32_bytes() {
        let long = "A".repeat(40);
        let name = TagName::new(&long);
        assert_eq!(name, TagName::new(&long[..32]));
    }

    #[test]
    fn lookup_returns_first_duplicate() {
        let mut dict = TagDict::new();
        dict.insert(Tsv::ascii("DUP", "first"));
        dict.insert(Tsv::ascii("DUP", "second"));
        assert_eq!(dict.get("DUP").unwrap().as_str(), Some("first"));
        let removed = dict.remove("DUP").unwrap();
        assert_eq!(removed.as_str(), Some("first"));
        assert_eq!(dict.get("DUP").unwrap().as_str(), Some("second"));
    }

    #[test]
    fn ascii_keeps_trailing_nul_but_reports_length() {
        let tsv = Tsv::ascii("NOTE", "hi");
        assert_eq!(tsv.shape().as_slice(), &[2]);
        assert_eq!(tsv.data(), Some(&b"hi\0"[..]));
        assert_eq!(tsv.payload_size(), 2);
    }

    #[test]
    fn new_validates_payload_size() {
        let err = Tsv::new("X", ElementType::Int, 32, &[3], vec![0u8; 8]).unwrap_err();
        assert!(matches!(err, PicError::SizeMismatch { expected: 12, actual: 8 }));
        let ascii = Tsv::new("S", ElementType::Ascii, 32, &[2], b"ok".to_vec()).unwrap();
        assert_eq!(ascii.bpe(), 8);
        assert_eq!(ascii.data(), Some(&b"ok\0"[..]));
    }

    #[test]
    fn encoded_size_matches_written_bytes() {
        let empty = TagDict::new();
        assert_eq!(encode(&empty).len() as u64, empty.encoded_size());

        let mut flat = TagDict::new();
        flat.insert(Tsv::ascii("NOTE", "hello"));
        assert_eq!(encode(&flat).len() as u64, flat.encoded_size());

        let mut level3 = TagDict::new();
        level3.insert(u16_tag("DEEP", &[1, 2, 3]));
        let mut level2 = TagDict::new();
        level2.insert(Tsv::nested("L3", level3));
        level2.insert(Tsv::ascii("MID", "m"));
        let mut level1 = TagDict::new();
        level1.insert(Tsv::nested("L2", level2));
        level1.insert(Tsv::nested("EMPTY", TagDict::new()));
        assert_eq!(encode(&level1).len() as u64, level1.encoded_size());
    }

    #[test]
    fn nested_roundtrip_preserves_order_and_count() {
        let mut sub = TagDict::new();
        sub.insert(Tsv::ascii("B", "second"));
        sub.insert(u16_tag("A", &[7, 8]));
        let mut dict = TagDict::new();
        dict.insert(Tsv::nested("PARENT", sub));

        let decoded = decode(&encode(&dict), ENCRYPTION_NONE).unwrap();
        assert_eq!(decoded, dict);
        let parent = decoded.get("PARENT").unwrap();
        assert_eq!(parent.dim(), 1);
        assert_eq!(parent.shape().as_slice(), &[2]);
        let names: Vec<_> = parent.nested_dict().unwrap().iter().map(|t| t.name().to_str_lossy().into_owned()).collect();
        assert_eq!(names, ["B", "A"]);
    }

    #[test]
    fn removing_sub_tag_drops_parent_count() {
        let mut sub = TagDict::new();
        sub.insert(Tsv::ascii("A", "a"));
        sub.insert(Tsv::ascii("B", "b"));
        let mut parent = Tsv::nested("P", sub);
        assert_eq!(parent.elements(), 2);
        let removed = parent.remove_sub_tag("A").unwrap();
        assert_eq!(removed.as_str(), Some("a"));
        assert_eq!(parent.elements(), 1);
        assert!(parent.query_sub_tag("B").is_some());
    }

    #[test]
    fn sub_tags_need_a_nested_parent() {
        let mut flat = Tsv::ascii("FLAT", "x");
        assert!(matches!(flat.add_sub_tag(Tsv::ascii("A", "a")), Err(PicError::NotNested)));
        assert!(flat.remove_sub_tag("A").is_none());
    }

    #[test]
    fn redaction_replaces_ascii_and_non_uniform() {
        let mut dict = TagDict::new();
        dict.insert(Tsv::ascii("PATIENT", "Jane Doe"));
        dict.insert(Tsv::new("BLOB", ElementType::NonUniform, 8, &[3], vec![1, 2, 3]).unwrap());
        dict.insert(u16_tag("KEPT", &[42]));

        let decoded = decode(&encode(&dict), ENCRYPTION_REDACTED).unwrap();
        let patient = decoded.get("PATIENT").unwrap();
        assert_eq!(patient.as_str(), Some(ENCRYPTED_PLACEHOLDER));
        assert_eq!(patient.element_type(), ElementType::Ascii);
        assert_eq!(patient.dim(), 1);
        assert_eq!(patient.shape().as_slice(), &[ENCRYPTED_PLACEHOLDER.len() as u32]);

        assert!(decoded.get("BLOB").is_none());
        let blob = decoded.get(ENCRYPTED_PLACEHOLDER).unwrap();
        assert_eq!(blob.as_str(), Some(ENCRYPTED_PLACEHOLDER));

        assert_eq!(decoded.get("KEPT").unwrap().data(), Some(&42u16.to_ne_bytes()[..]));
    }

    #[test]
    fn declared_length_must_match_shape() {
        let mut dict = TagDict::new();
        dict.insert(u16_tag("N", &[1, 2]));
        let mut bytes = encode(&dict);
        // dim extent 2 -> 3: payload now too short for the shape
        let extent_at = TAG_LEN + 4 + 12;
        bytes[extent_at..extent_at + 4].copy_from_slice(&3u32.to_le_bytes());
        assert!(matches!(decode(&bytes, ENCRYPTION_NONE), Err(PicError::CorruptTagStream(_))));
    }

    #[test]
    fn budget_overrun_is_corrupt() {
        let mut dict = TagDict::new();
        dict.insert(Tsv::ascii("NOTE", "hi"));
        let bytes = encode(&dict);
        let reader = TagReader {
            encryption_type: ENCRYPTION_NONE,
            memory_order: ByteOrder::native(),
            limits: None,
            stop: &Unstoppable,
        };
        let mut out = TagDict::new();
        let err = reader
            .read_tags(&mut out, bytes.len() as u64 - 1, &mut SliceSource::new(&bytes), 0)
            .unwrap_err();
        assert!(matches!(err, PicError::CorruptTagStream(_)));
    }

    #[test]
    fn big_endian_memory_is_swapped_on_write() {
        let mut dict = TagDict::new();
        dict.insert(Tsv::new("V", ElementType::UInt, 16, &[1], 0x0102u16.to_be_bytes().to_vec()).unwrap());
        let mut out = Vec::new();
        write_tags(&dict, &mut VecSink::new(&mut out), ByteOrder::Big, &Unstoppable).unwrap();
        assert_eq!(&out[out.len() - 2..], &0x0102u16.to_le_bytes());
    }
}
