//! Human-readable dumps of descriptors and tag dictionaries.
//!
//! `{}` prints the header followed by the tag tree; `{:#}` prints a one-line
//! summary.

use core::fmt::{self, Display, Formatter};

use crate::descriptor::PicDescriptor;
use crate::pixel::ElementType;
use crate::tags::{TagDict, TagValue, Tsv};

/// Longest ASCII value printed in full.
const MAX_TEXT: usize = 64;

impl Display for PicDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            return write!(
                f,
                "{} {}-bit {} ({} tags)",
                self.element_type,
                self.bpe,
                self.shape,
                self.tags.len()
            );
        }
        writeln!(
            f,
            "PIC {}.{:02}{}",
            self.version.major(),
            self.version.minor(),
            if self.version.is_encrypted() { " (encrypted)" } else { "" }
        )?;
        writeln!(f, "  type: {}, {} bits per element", self.element_type, self.bpe)?;
        writeln!(
            f,
            "  shape: {} ({} elements, {} bytes)",
            self.shape,
            self.elements(),
            self.size_in_bytes()
        )?;
        match self.data() {
            Some(_) => writeln!(f, "  pixels: loaded")?,
            None if self.write_protect => writeln!(f, "  pixels: not loaded (write protected)")?,
            None => writeln!(f, "  pixels: none")?,
        }
        writeln!(f, "  tags: {}", self.tags.len())?;
        write_dict(f, &self.tags, 2)
    }
}

impl Display for TagDict {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            return write!(f, "{} tags, {} bytes encoded", self.len(), self.encoded_size());
        }
        write_dict(f, self, 0)
    }
}

fn write_dict(f: &mut Formatter<'_>, dict: &TagDict, depth: usize) -> fmt::Result {
    for tsv in dict {
        write_tsv(f, tsv, depth)?;
    }
    Ok(())
}

fn write_tsv(f: &mut Formatter<'_>, tsv: &Tsv, depth: usize) -> fmt::Result {
    let indent = depth * 2;
    write!(f, "{:indent$}{}: {}", "", tsv.name(), tsv.element_type())?;
    match tsv.value() {
        TagValue::Nested(dict) => {
            writeln!(f, " [{}]", dict.len())?;
            write_dict(f, dict, depth + 1)
        }
        TagValue::Data(_) if tsv.element_type() == ElementType::Ascii => match tsv.as_str() {
            Some(text) if text.len() <= MAX_TEXT => writeln!(f, " {:?}", text),
            _ => writeln!(f, " {} ({} chars)", tsv.shape(), tsv.elements()),
        },
        TagValue::Data(_) => writeln!(
            f,
            " {}-bit {} ({} bytes)",
            tsv.bpe(),
            tsv.shape(),
            tsv.payload_size()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;
    use alloc::string::ToString;

    fn sample() -> PicDescriptor {
        let mut pic = PicDescriptor::with_shape(ElementType::UInt, 8, &[4, 3]).unwrap();
        pic.add_tag(Tsv::ascii("NOTE", "hi"));
        let mut group = TagDict::new();
        group.insert(Tsv::new("SPACING", ElementType::Float, 32, &[2], alloc::vec![0; 8]).unwrap());
        pic.add_tag(Tsv::nested("GROUP", group));
        pic
    }

    #[test]
    fn short_form_is_one_line() {
        assert_eq!(format!("{:#}", sample()), "uint 8-bit [4 3] (2 tags)");
    }

    #[test]
    fn normal_form_lists_tag_tree() {
        let text = sample().to_string();
        assert!(text.starts_with("PIC 3.00\n"));
        assert!(text.contains("  shape: [4 3] (12 elements, 12 bytes)\n"));
        assert!(text.contains("    NOTE: ASCII \"hi\"\n"));
        assert!(text.contains("    GROUP: tag dictionary [1]\n"));
        assert!(text.contains("      SPACING: float 32-bit [2] (8 bytes)\n"));
    }

    #[test]
    fn header_only_is_marked() {
        let mut pic = sample().copy_header();
        pic.write_protect = true;
        assert!(pic.to_string().contains("not loaded (write protected)"));
    }
}
