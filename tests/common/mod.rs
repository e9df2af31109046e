#![allow(dead_code)]

use std::sync::Arc;

use crosswalk::{AssignmentRecord, CrosswalkConfig, Crosswalk, LinearIndex, PolygonSet, ZoneId};
use geo::{polygon, Polygon};

pub fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
    polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)]
}

pub fn zones(features: &[(&str, Polygon<f64>)]) -> PolygonSet<ZoneId> {
    features.iter().map(|(id, p)| (ZoneId::from(*id), p.clone())).collect()
}

pub fn regions(features: &[(&str, Polygon<f64>)]) -> PolygonSet<Arc<str>> {
    features.iter().map(|(name, p)| (Arc::<str>::from(*name), p.clone())).collect()
}

/// Run with the default R-tree index.
pub fn run(zones: PolygonSet<ZoneId>, regions: PolygonSet<Arc<str>>, config: CrosswalkConfig) -> Vec<AssignmentRecord> {
    Crosswalk::new(zones, regions, config).unwrap().run().unwrap().assignments
}

/// Run with the linear-scan index.
pub fn run_linear(zones: PolygonSet<ZoneId>, regions: PolygonSet<Arc<str>>, config: CrosswalkConfig) -> Vec<AssignmentRecord> {
    Crosswalk::with_index(zones, regions, config, LinearIndex::new).unwrap().run().unwrap().assignments
}

/// Assigned region name of each record, in order.
pub fn names(records: &[AssignmentRecord]) -> Vec<Option<&str>> {
    records.iter().map(|r| r.region_name.as_deref()).collect()
}

/// A 6x6 grid of 1x1 zones over four 3x3 quadrant regions, plus zones that
/// straddle quadrant borders.
pub fn grid_fixture() -> (PolygonSet<ZoneId>, PolygonSet<Arc<str>>) {
    let mut zones = PolygonSet::new();
    for i in 0..36 {
        let (x, y) = ((i % 6) as f64, (i / 6) as f64);
        zones.push(format!("cell-{i}"), rect(x, y, x + 1.0, y + 1.0));
    }
    zones.push("straddle-x", rect(2.5, 0.0, 3.7, 1.0));
    zones.push("straddle-center", rect(2.0, 2.0, 4.0, 4.0));
    zones.push("outside", rect(10.0, 10.0, 11.0, 11.0));

    let regions = PolygonSet::new()
        .with("sw", rect(0.0, 0.0, 3.0, 3.0))
        .with("se", rect(3.0, 0.0, 6.0, 3.0))
        .with("nw", rect(0.0, 3.0, 3.0, 6.0))
        .with("ne", rect(3.0, 3.0, 6.0, 6.0));
    (zones, regions)
}
