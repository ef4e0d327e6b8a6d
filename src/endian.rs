//! Host byte-order detection and fixed-width element byte swapping.
//!
//! Everything multi-byte in a PIC stream is little-endian. In memory, pixel
//! and tag buffers hold elements in a caller-chosen [`ByteOrder`] (the host
//! order unless overridden), so every read and write funnels through
//! [`swap_in_place`] or [`copy_with_swap`] when the two orders differ.

/// Byte order of multi-byte elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    Big,
    Little,
    /// Neither pattern read back. Treated like `Little` (no swapping).
    Unknown,
}

impl ByteOrder {
    /// Compile-time host order.
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }

    /// Whether elements in this order must be swapped to become little-endian.
    #[inline]
    pub(crate) fn swaps_against_le(self) -> bool {
        matches!(self, ByteOrder::Big)
    }
}

/// Detect the host byte order at runtime from a known two-byte pattern.
pub fn detect_host_order() -> ByteOrder {
    match 0x0102u16.to_ne_bytes() {
        [0x01, 0x02] => ByteOrder::Big,
        [0x02, 0x01] => ByteOrder::Little,
        other => {
            tracing::warn!(pattern = ?other, "unknown host byte order");
            ByteOrder::Unknown
        }
    }
}

/// Reverse the bytes of every `width`-sized element of `buf` in place.
///
/// `buf.len()` must be a multiple of `width`; a trailing partial element is
/// left alone. Widths of 0 or 1 are a no-op, as is an empty buffer.
pub fn swap_in_place(buf: &mut [u8], width: usize) {
    if width <= 1 {
        return;
    }
    for element in buf.chunks_exact_mut(width) {
        element.reverse();
    }
}

/// Copy `source` into `destination`, reversing each `width`-sized element.
///
/// Copies `min(source.len(), destination.len())` bytes rounded down to whole
/// elements. The borrow rules already rule out overlapping buffers.
pub fn copy_with_swap(source: &[u8], destination: &mut [u8], width: usize) {
    if width <= 1 {
        let n = source.len().min(destination.len());
        destination[..n].copy_from_slice(&source[..n]);
        return;
    }
    for (src, dst) in source
        .chunks_exact(width)
        .zip(destination.chunks_exact_mut(width))
    {
        for (i, b) in src.iter().rev().enumerate() {
            dst[i] = *b;
        }
    }
}

/// Convert little-endian elements in `buf` to `order`, in place.
///
/// The conversion is symmetric, so the same call turns `order` data back into
/// little-endian.
#[inline]
pub(crate) fn convert_le(buf: &mut [u8], width: usize, order: ByteOrder) {
    if order.swaps_against_le() {
        swap_in_place(buf, width);
    }
}

/// Copy `order` elements from `source` into `destination` as little-endian.
#[inline]
pub(crate) fn copy_to_le(source: &[u8], destination: &mut [u8], width: usize, order: ByteOrder) {
    if order.swaps_against_le() {
        copy_with_swap(source, destination, width);
    } else {
        destination.copy_from_slice(source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detected_order_matches_target() {
        assert_eq!(detect_host_order(), ByteOrder::native());
    }

    #[test]
    fn swap_reverses_each_element() {
        let mut buf = [1u8, 2, 3, 4, 5, 6, 7, 8];
        swap_in_place(&mut buf, 4);
        assert_eq!(buf, [4, 3, 2, 1, 8, 7, 6, 5]);
        swap_in_place(&mut buf, 2);
        assert_eq!(buf, [3, 4, 1, 2, 7, 8, 5, 6]);
    }

    #[test]
    fn swap_width_one_and_empty_are_noops() {
        let mut buf = [1u8, 2, 3];
        swap_in_place(&mut buf, 1);
        assert_eq!(buf, [1, 2, 3]);
        let mut empty: [u8; 0] = [];
        swap_in_place(&mut empty, 8);
    }

    #[test]
    fn copy_with_swap_leaves_source_untouched() {
        let src = 0x1122_3344_5566_7788u64.to_le_bytes();
        let mut dst = [0u8; 8];
        copy_with_swap(&src, &mut dst, 8);
        assert_eq!(dst, 0x1122_3344_5566_7788u64.to_be_bytes());
        assert_eq!(src, 0x1122_3344_5566_7788u64.to_le_bytes());
    }

    #[test]
    fn convert_le_only_swaps_for_big() {
        let mut buf = 0xAABBu16.to_le_bytes();
        convert_le(&mut buf, 2, ByteOrder::Little);
        assert_eq!(buf, [0xBB, 0xAA]);
        convert_le(&mut buf, 2, ByteOrder::Big);
        assert_eq!(buf, [0xAA, 0xBB]);
    }
}
