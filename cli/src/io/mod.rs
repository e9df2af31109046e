//! File formats read and written by the CLI.
//!
//! - GeoJSON: polygon layers in (`geojson`)
//! - CSV: assignment, candidate and error tables out (`csv`)

pub mod csv;
pub mod geojson;
