use std::{fmt, num::TryFromIntError};

use serde::Serialize;

/// Identifies a single region by its row in the input region collection.
///
/// Region names are not unique, so every internal structure (the spatial
/// index, overlap records, tie-breaking) refers to regions by row. Rows are
/// assigned contiguously from `0` in input order, counting rows that were
/// later rejected as invalid, so a `RegionId` always points back at the
/// caller's original row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RegionId(pub u32);

impl RegionId {
    /// Row index as `usize`.
    #[inline] pub fn index(self) -> usize { self.0 as usize }
}

impl TryFrom<usize> for RegionId {
    type Error = TryFromIntError;

    /// Fails for rows past `u32::MAX` instead of wrapping onto another region.
    fn try_from(row: usize) -> Result<Self, Self::Error> { u32::try_from(row).map(RegionId) }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RegionId({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_row() {
        assert_eq!(RegionId(42).to_string(), "RegionId(42)");
    }

    #[test]
    fn row_conversion_never_wraps() {
        assert_eq!(RegionId::try_from(3usize), Ok(RegionId(3)));
        assert_eq!(RegionId::try_from(u32::MAX as usize), Ok(RegionId(u32::MAX)));
        #[cfg(target_pointer_width = "64")]
        assert!(RegionId::try_from(u32::MAX as usize + 1).is_err());
    }

    #[test]
    fn ordering_follows_row() {
        assert!(RegionId(0) < RegionId(1));
        assert_eq!(RegionId(7).index(), 7);
    }
}
