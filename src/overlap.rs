use geo::{Area, BooleanOps};

use crate::{
    geom::{bbox::boxes_overlap, Region, Zone},
    record::OverlapRecord,
};

/// Relative noise floor for intersection areas: overlaps at or below
/// `DEFAULT_AREA_EPSILON * zone_area` are reported as zero.
pub const DEFAULT_AREA_EPSILON: f64 = 1e-9;

/// Scores a zone against one candidate region. Pure; holds only the epsilon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlapComputer {
    area_epsilon: f64,
}

impl Default for OverlapComputer {
    fn default() -> Self { Self::new(DEFAULT_AREA_EPSILON) }
}

impl OverlapComputer {
    pub fn new(area_epsilon: f64) -> Self { Self { area_epsilon } }

    #[inline] pub fn area_epsilon(&self) -> f64 { self.area_epsilon }

    /// Area of `zone ∩ region`, clamped to `[0, zone.area()]`.
    ///
    /// Returns zero without intersecting when the zone is degenerate or the
    /// bounding boxes share no area, and when the intersection is empty,
    /// touches only along an edge or at a point, or falls under the epsilon.
    pub fn overlap_area(&self, zone: &Zone, region: &Region) -> f64 {
        let Some(zone_bbox) = zone.bbox() else { return 0.0 };
        if zone.is_degenerate() || !boxes_overlap(zone_bbox, region.bbox()) { return 0.0 }

        let intersection = zone.geometry().intersection(region.geometry());
        self.clamp(intersection.unsigned_area(), zone.area())
    }

    /// Score `zone` against `region`.
    pub fn score(&self, zone: &Zone, region: &Region) -> OverlapRecord {
        let overlap_area = self.overlap_area(zone, region);
        OverlapRecord {
            zone_id: zone.id().clone(),
            region: region.id(),
            region_name: region.name().clone(),
            zone_area: zone.area(),
            overlap_area,
            overlap_pct: overlap_pct(overlap_area, zone.area()).unwrap_or(0.0),
        }
    }

    /// Apply the epsilon policy to a raw intersection area.
    pub fn clamp(&self, area: f64, zone_area: f64) -> f64 {
        if area > self.area_epsilon * zone_area { area.min(zone_area) } else { 0.0 }
    }
}

/// Share of the zone covered by the overlap, or `None` for a zero-area zone.
#[inline]
pub fn overlap_pct(overlap_area: f64, zone_area: f64) -> Option<f64> {
    (zone_area > 0.0).then(|| (overlap_area / zone_area).clamp(0.0, 1.0))
}
