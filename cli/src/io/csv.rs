//! CSV writing operations.

use std::{fs::File, path::Path};

use anyhow::{Context, Result};
use crosswalk::{AssignmentRecord, Entity, EntityError, ZoneDiagnostics};
use polars::{frame::DataFrame, io::SerWriter, prelude::{CsvWriter, NamedFrom}, series::Series};

use crate::io::geojson::FeatureError;

/// Write a DataFrame to a CSV file.
fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("[io::csv] Failed to create CSV file: {}", path.display()))?;
    CsvWriter::new(file)
        .finish(df)
        .with_context(|| format!("[io::csv] Failed to write CSV to {}", path.display()))
}

/// Write one row per zone, in input order.
pub fn write_assignments(records: &[AssignmentRecord], path: &Path) -> Result<()> {
    let mut df = DataFrame::new(vec![
        Series::new("zone_id".into(), records.iter().map(|r| r.zone_id.as_str()).collect::<Vec<_>>()).into(),
        Series::new("region_name".into(), records.iter().map(|r| r.region_name.as_deref()).collect::<Vec<_>>()).into(),
        Series::new("zone_area".into(), records.iter().map(|r| r.zone_area).collect::<Vec<_>>()).into(),
        Series::new("overlap_area".into(), records.iter().map(|r| r.overlap_area).collect::<Vec<_>>()).into(),
        Series::new("overlap_pct".into(), records.iter().map(|r| r.overlap_pct).collect::<Vec<_>>()).into(),
        Series::new("status".into(), records.iter().map(|r| r.status.as_str()).collect::<Vec<_>>()).into(),
    ])?;

    write_csv(&mut df, path)
}

/// Write every scored candidate of every zone, best first within a zone.
pub fn write_candidates(diagnostics: &[ZoneDiagnostics], path: &Path) -> Result<()> {
    let rows = || diagnostics.iter().flat_map(|d| d.candidates.iter());

    let mut df = DataFrame::new(vec![
        Series::new("zone_id".into(), rows().map(|c| c.zone_id.as_str()).collect::<Vec<_>>()).into(),
        Series::new("region_row".into(), rows().map(|c| c.region.0).collect::<Vec<_>>()).into(),
        Series::new("region_name".into(), rows().map(|c| &*c.region_name).collect::<Vec<_>>()).into(),
        Series::new("zone_area".into(), rows().map(|c| c.zone_area).collect::<Vec<_>>()).into(),
        Series::new("overlap_area".into(), rows().map(|c| c.overlap_area).collect::<Vec<_>>()).into(),
        Series::new("overlap_pct".into(), rows().map(|c| c.overlap_pct).collect::<Vec<_>>()).into(),
    ])?;

    write_csv(&mut df, path)
}

/// Write rejected entities: features that could not be read, then polygons
/// that failed validation.
pub fn write_errors(
    zone_features: &[FeatureError],
    region_features: &[FeatureError],
    rejected: &[EntityError],
    path: &Path,
) -> Result<()> {
    let mut entities = Vec::new();
    let mut ids = Vec::new();
    let mut reasons = Vec::new();

    for (kind, errors) in [("zone_feature", zone_features), ("region_feature", region_features)] {
        for err in errors {
            entities.push(kind);
            ids.push(err.index.to_string());
            reasons.push(err.reason.clone());
        }
    }
    for err in rejected {
        let (kind, id) = match &err.entity {
            Entity::Zone { id, .. } => ("zone", id.to_string()),
            Entity::Region { id, name } => ("region", format!("{}:{name}", id.0)),
        };
        entities.push(kind);
        ids.push(id);
        reasons.push(err.reason.to_string());
    }

    let mut df = DataFrame::new(vec![
        Series::new("entity".into(), entities).into(),
        Series::new("id".into(), ids).into(),
        Series::new("reason".into(), reasons).into(),
    ])?;

    write_csv(&mut df, path)
}
