use std::{fmt, sync::Arc};

use serde::Serialize;
use thiserror::Error;

use crate::types::{RegionId, ZoneId};

/// Why an input polygon was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("geometry has no polygons")]
    Empty,

    #[error("non-finite coordinate ({x}, {y}) in polygon {polygon}")]
    NonFiniteCoordinate { polygon: usize, x: f64, y: f64 },

    #[error("ring {ring} of polygon {polygon} has {distinct} distinct vertices (at least 3 required)")]
    TooFewVertices { polygon: usize, ring: usize, distinct: usize },

    #[error("polygon {polygon} is self-intersecting near ({x}, {y})")]
    SelfIntersection { polygon: usize, x: f64, y: f64 },

    #[error("hole {ring} of polygon {polygon} lies outside its exterior ring")]
    HoleOutsideShell { polygon: usize, ring: usize },

    #[error("holes {ring} and {other} of polygon {polygon} overlap or are nested")]
    OverlappingHoles { polygon: usize, ring: usize, other: usize },

    #[error("polygon {polygon} has non-positive area {area} after orientation normalization")]
    NonPositiveArea { polygon: usize, area: f64 },

    #[error("zone id appears more than once (first at input row {first_row})")]
    DuplicateZoneId { first_row: usize },
}

/// The input entity an error is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entity {
    /// A zone, by its external identifier and input row.
    Zone { id: ZoneId, row: usize },
    /// A region, by its input row and (possibly non-unique) name.
    Region { id: RegionId, name: Arc<str> },
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Zone { id, row } => write!(f, "zone {id} (row {row})"),
            Entity::Region { id, name } => write!(f, "region {name:?} ({id})"),
        }
    }
}

/// A per-entity failure collected into the run report instead of aborting.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{entity}: {reason}")]
pub struct EntityError {
    pub entity: Entity,
    pub reason: GeometryError,
}

/// Errors that stop a crosswalk run.
#[derive(Debug, Error)]
pub enum CrosswalkError {
    /// An input polygon is malformed and the caller asked to abort on invalid input.
    #[error("invalid geometry for {entity}: {source}")]
    InvalidGeometry {
        entity: Entity,
        #[source]
        source: GeometryError,
    },

    /// The two layers declare different coordinate reference systems.
    #[error("zones are in EPSG:{zones} but regions are in EPSG:{regions}; reproject before building the store")]
    CrsMismatch { zones: u32, regions: u32 },

    /// The spatial index produced a region the geometry store does not hold.
    #[error("index returned unknown {region} for zone {zone}")]
    IndexConsistency { zone: ZoneId, region: RegionId },

    /// Region rows are addressed by `u32`.
    #[error("{rows} region rows exceed the supported maximum of {}", u32::MAX)]
    TooManyRegions { rows: usize },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl From<EntityError> for CrosswalkError {
    fn from(err: EntityError) -> Self {
        CrosswalkError::InvalidGeometry { entity: err.entity, source: err.reason }
    }
}

pub type Result<T, E = CrosswalkError> = std::result::Result<T, E>;
