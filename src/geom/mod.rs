pub(crate) mod bbox;
mod store;
mod validate;

pub(crate) use bbox::BoundingBox;
pub use store::{GeometryStore, Region, Zone};
