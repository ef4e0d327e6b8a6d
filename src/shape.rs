/// Maximum number of dimensions of an image or tag value.
pub const MAX_DIM: usize = 8;

/// Up to [`MAX_DIM`] extents, one per active dimension.
///
/// All eight slots are kept even when fewer are active, because legacy files
/// carry values beyond the rank. Equality and hashing only look at the active
/// extents.
#[derive(Clone, Copy, Default)]
pub struct Shape {
    extents: [u32; MAX_DIM],
    len: u8,
}

impl Shape {
    /// Shape with no active dimensions.
    pub const fn empty() -> Self {
        Self {
            extents: [0; MAX_DIM],
            len: 0,
        }
    }

    /// Build from active extents. `None` if more than [`MAX_DIM`] are given.
    pub fn new(extents: &[u32]) -> Option<Self> {
        if extents.len() > MAX_DIM {
            return None;
        }
        let mut shape = Self::empty();
        shape.extents[..extents.len()].copy_from_slice(extents);
        shape.len = extents.len() as u8;
        Some(shape)
    }

    /// Build from all eight slots with `len` of them active.
    pub fn from_raw(extents: [u32; MAX_DIM], len: usize) -> Option<Self> {
        if len > MAX_DIM {
            return None;
        }
        Some(Self {
            extents,
            len: len as u8,
        })
    }

    /// Number of active dimensions.
    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Active extents.
    #[inline]
    pub fn as_slice(&self) -> &[u32] {
        &self.extents[..self.len()]
    }

    /// All eight slots, including inactive ones.
    pub fn raw(&self) -> &[u32; MAX_DIM] {
        &self.extents
    }

    /// Extent of the last active dimension.
    pub fn last(&self) -> Option<u32> {
        self.as_slice().last().copied()
    }

    /// Product of the active extents, 0 when there are none.
    ///
    /// Saturates at `u64::MAX`; any size derived from a saturated count fails
    /// later validation.
    pub fn elements(&self) -> u64 {
        if self.is_empty() {
            return 0;
        }
        self.as_slice()
            .iter()
            .fold(1u64, |acc, &n| acc.saturating_mul(u64::from(n)))
    }

    /// Drop the last active dimension.
    pub(crate) fn without_last(&self) -> Self {
        let mut shape = *self;
        if shape.len > 0 {
            shape.len -= 1;
        }
        shape
    }

    /// Append one dimension. `None` when already at [`MAX_DIM`].
    pub(crate) fn with_appended(&self, extent: u32) -> Option<Self> {
        let len = self.len();
        if len >= MAX_DIM {
            return None;
        }
        let mut shape = *self;
        shape.extents[len] = extent;
        shape.len += 1;
        Some(shape)
    }
}

impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for Shape {}

impl core::hash::Hash for Shape {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl core::fmt::Debug for Shape {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl core::fmt::Display for Shape {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("[")?;
        for (i, n) in self.as_slice().iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{n}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elements_of_empty_is_zero() {
        assert_eq!(Shape::empty().elements(), 0);
        assert_eq!(Shape::new(&[4, 3]).unwrap().elements(), 12);
    }

    #[test]
    fn equality_ignores_inactive_slots() {
        let a = Shape::from_raw([4, 3, 1, 0, 0, 0, 0, 0], 2).unwrap();
        let b = Shape::new(&[4, 3]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.raw()[2], 1);
    }

    #[test]
    fn rejects_more_than_eight_dims() {
        assert!(Shape::new(&[1; 9]).is_none());
        assert!(Shape::new(&[1; 8]).unwrap().with_appended(1).is_none());
    }
}
