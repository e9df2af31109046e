use geo::{Coord, Rect};
use rstar::{RTreeObject, AABB};

use crate::types::RegionId;

/// A bounding box in an R-tree, associated with a region by row.
#[derive(Debug, Clone)]
pub(crate) struct BoundingBox {
    region: RegionId,
    bbox: Rect<f64>,
}

impl BoundingBox {
    pub(crate) fn new(region: RegionId, bbox: Rect<f64>) -> Self {
        Self { region, bbox }
    }

    /// Get the row of the corresponding region.
    #[inline] pub(crate) fn region(&self) -> RegionId { self.region }

    /// Get a reference to the bounding rectangle.
    #[inline] pub(crate) fn bbox(&self) -> &Rect<f64> { &self.bbox }
}

impl RTreeObject for BoundingBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope { envelope(&self.bbox) }
}

/// Convert a rectangle to an R-tree envelope.
#[inline]
pub(crate) fn envelope(rect: &Rect<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners(rect.min().into(), rect.max().into())
}

/// Closed-box intersection: boxes sharing only an edge or a corner intersect.
#[inline]
pub(crate) fn boxes_intersect(a: &Rect<f64>, b: &Rect<f64>) -> bool {
    a.min().x <= b.max().x && b.min().x <= a.max().x
        && a.min().y <= b.max().y && b.min().y <= a.max().y
}

/// True only if the boxes share a region of positive area.
/// Polygons whose boxes fail this test cannot have an areal intersection.
#[inline]
pub(crate) fn boxes_overlap(a: &Rect<f64>, b: &Rect<f64>) -> bool {
    a.min().x.max(b.min().x) < a.max().x.min(b.max().x)
        && a.min().y.max(b.min().y) < a.max().y.min(b.max().y)
}

/// Smallest rectangle containing both.
#[inline]
pub(crate) fn union(a: Rect<f64>, b: Rect<f64>) -> Rect<f64> {
    Rect::new(
        Coord { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
        Coord { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Rect<f64> {
        Rect::new(Coord { x: x0, y: y0 }, Coord { x: x1, y: y1 })
    }

    #[test]
    fn touching_boxes_intersect_but_do_not_overlap() {
        let a = rect(0.0, 0.0, 1.0, 1.0);
        let b = rect(1.0, 0.0, 2.0, 1.0);
        assert!(boxes_intersect(&a, &b));
        assert!(!boxes_overlap(&a, &b));
    }

    #[test]
    fn corner_touch_does_not_overlap() {
        let a = rect(0.0, 0.0, 1.0, 1.0);
        let b = rect(1.0, 1.0, 2.0, 2.0);
        assert!(boxes_intersect(&a, &b));
        assert!(!boxes_overlap(&a, &b));
    }

    #[test]
    fn nested_boxes_overlap() {
        let outer = rect(0.0, 0.0, 10.0, 10.0);
        let inner = rect(2.0, 2.0, 3.0, 3.0);
        assert!(boxes_overlap(&outer, &inner));
        assert!(boxes_overlap(&inner, &outer));
    }

    #[test]
    fn disjoint_boxes() {
        let a = rect(0.0, 0.0, 1.0, 1.0);
        let b = rect(5.0, 5.0, 6.0, 6.0);
        assert!(!boxes_intersect(&a, &b));
        assert!(!boxes_overlap(&a, &b));
    }

    #[test]
    fn envelope_matches_corners() {
        let bb = BoundingBox::new(RegionId(3), rect(-1.0, -2.0, 3.0, 4.0));
        let env = bb.envelope();
        assert_eq!(env.lower(), [-1.0, -2.0]);
        assert_eq!(env.upper(), [3.0, 4.0]);
        assert_eq!(bb.region(), RegionId(3));
    }

    #[test]
    fn union_covers_both() {
        let u = union(rect(0.0, 0.0, 1.0, 1.0), rect(-1.0, 0.5, 0.5, 3.0));
        assert_eq!(u, rect(-1.0, 0.0, 1.0, 3.0));
    }
}
