mod polygon_set;
mod region_id;
mod zone_id;

pub use polygon_set::PolygonSet;
pub use region_id::RegionId;
pub use zone_id::ZoneId;
