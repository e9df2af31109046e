use std::{fmt, sync::Arc};

use serde::Serialize;

use crate::types::{RegionId, ZoneId};

/// Overlap between one zone and one candidate region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlapRecord {
    pub zone_id: ZoneId,
    pub region: RegionId,
    pub region_name: Arc<str>,
    pub zone_area: f64,
    /// Intersection area, in `[0, zone_area]`.
    pub overlap_area: f64,
    /// `overlap_area / zone_area`, in `[0, 1]`.
    pub overlap_pct: f64,
}

/// How a zone's assignment was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    /// Assigned to the region with the largest overlap.
    Matched,
    /// No candidate region overlaps the zone.
    NoOverlap,
    /// The best overlap is below the configured minimum share.
    BelowThreshold,
    /// The zone has zero area, so no share can be computed.
    Degenerate,
}

impl AssignmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentStatus::Matched => "matched",
            AssignmentStatus::NoOverlap => "no_overlap",
            AssignmentStatus::BelowThreshold => "below_threshold",
            AssignmentStatus::Degenerate => "degenerate",
        }
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// The selected region of one zone. Exactly one per valid input zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentRecord {
    pub zone_id: ZoneId,
    pub region: Option<RegionId>,
    pub region_name: Option<Arc<str>>,
    pub zone_area: f64,
    pub overlap_area: f64,
    pub overlap_pct: f64,
    pub status: AssignmentStatus,
}

impl AssignmentRecord {
    /// A record with no region and zero overlap.
    pub(crate) fn unassigned(zone_id: ZoneId, zone_area: f64, status: AssignmentStatus) -> Self {
        Self { zone_id, region: None, region_name: None, zone_area, overlap_area: 0.0, overlap_pct: 0.0, status }
    }

    #[inline] pub fn is_matched(&self) -> bool { self.status == AssignmentStatus::Matched }

    #[inline] pub fn is_degenerate(&self) -> bool { self.status == AssignmentStatus::Degenerate }
}

/// Every candidate scored for one zone, best first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneDiagnostics {
    pub zone_id: ZoneId,
    pub candidates: Vec<OverlapRecord>,
}
