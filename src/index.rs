//! Bounding-box candidate lookup over the region layer.

use geo::Rect;
use rstar::RTree;

use crate::{
    geom::{bbox::{boxes_intersect, envelope}, BoundingBox, GeometryStore},
    types::RegionId,
};

/// Finds regions that may overlap a zone.
///
/// Implementations must return every region whose bounding box intersects
/// `bbox` (closed-box semantics); extra regions are allowed, missing ones are
/// a bug. Results are sorted by `RegionId` and contain no duplicates.
pub trait RegionIndex: Send + Sync {
    fn candidates(&self, bbox: &Rect<f64>) -> Vec<RegionId>;
}

/// R-tree over region bounding boxes, bulk-loaded once and read-only afterwards.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    rtree: RTree<BoundingBox>,
}

impl SpatialIndex {
    /// Bulk-load the bounding boxes of every valid region in `store`.
    pub fn new(store: &GeometryStore) -> Self {
        Self {
            rtree: RTree::bulk_load(store.regions()
                .map(|region| BoundingBox::new(region.id(), *region.bbox()))
                .collect()),
        }
    }

    /// Number of indexed regions.
    #[inline] pub fn len(&self) -> usize { self.rtree.size() }

    #[inline] pub fn is_empty(&self) -> bool { self.rtree.size() == 0 }
}

impl RegionIndex for SpatialIndex {
    fn candidates(&self, bbox: &Rect<f64>) -> Vec<RegionId> {
        let mut found: Vec<RegionId> = self.rtree
            .locate_in_envelope_intersecting(&envelope(bbox))
            .map(BoundingBox::region)
            .collect();
        found.sort_unstable();
        found
    }
}

/// Linear scan over region bounding boxes. Reference implementation for small
/// inputs and for checking that results do not depend on the index.
#[derive(Debug, Clone)]
pub struct LinearIndex {
    boxes: Vec<BoundingBox>,
}

impl LinearIndex {
    pub fn new(store: &GeometryStore) -> Self {
        Self {
            boxes: store.regions()
                .map(|region| BoundingBox::new(region.id(), *region.bbox()))
                .collect(),
        }
    }
}

impl RegionIndex for LinearIndex {
    fn candidates(&self, bbox: &Rect<f64>) -> Vec<RegionId> {
        self.boxes.iter()
            .filter(|bb| boxes_intersect(bb.bbox(), bbox))
            .map(BoundingBox::region)
            .collect()
    }
}
