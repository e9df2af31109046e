#![doc = "Zone-to-region crosswalk by largest areal overlap"]
mod config;
mod crosswalk;
mod error;
mod geom;
mod index;
mod overlap;
mod record;
mod select;
mod types;

#[doc(inline)]
pub use config::{CrosswalkConfig, InvalidPolicy};

#[doc(inline)]
pub use crosswalk::{Crosswalk, CrosswalkReport, RunSummary, ZoneOutcome};

#[doc(inline)]
pub use error::{CrosswalkError, Entity, EntityError, GeometryError, Result};

#[doc(inline)]
pub use geom::{GeometryStore, Region, Zone};

#[doc(inline)]
pub use index::{LinearIndex, RegionIndex, SpatialIndex};

#[doc(inline)]
pub use overlap::{overlap_pct, OverlapComputer, DEFAULT_AREA_EPSILON};

#[doc(inline)]
pub use record::{AssignmentRecord, AssignmentStatus, OverlapRecord, ZoneDiagnostics};

#[doc(inline)]
pub use select::{AssignmentSelector, SecondaryKey, TieBreak, DEFAULT_TIE_EPSILON};

#[doc(inline)]
pub use types::{PolygonSet, RegionId, ZoneId};
