use std::sync::Arc;

use ahash::AHashMap;
use geo::{BoundingRect, MultiPolygon, Rect};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::{
    config::InvalidPolicy,
    error::{CrosswalkError, Entity, EntityError, GeometryError, Result},
    geom::{bbox, validate::{prepare, Prepared}},
    types::{PolygonSet, RegionId, ZoneId},
};

/// A validated zone with its cached area and bounding box.
#[derive(Debug, Clone)]
pub struct Zone {
    id: ZoneId,
    row: usize,
    geometry: MultiPolygon<f64>,
    area: f64,
    bbox: Option<Rect<f64>>,
}

impl Zone {
    #[inline] pub fn id(&self) -> &ZoneId { &self.id }

    /// Position of the zone in the caller's input collection.
    #[inline] pub fn row(&self) -> usize { self.row }

    #[inline] pub fn geometry(&self) -> &MultiPolygon<f64> { &self.geometry }

    /// Planar area, in squared CRS units. Zero for degenerate zones.
    #[inline] pub fn area(&self) -> f64 { self.area }

    /// `None` only for a degenerate zone with no polygons.
    #[inline] pub fn bbox(&self) -> Option<&Rect<f64>> { self.bbox.as_ref() }

    #[inline] pub fn is_degenerate(&self) -> bool { self.area == 0.0 }
}

/// A validated region. Names may repeat; `id` is the input row.
#[derive(Debug, Clone)]
pub struct Region {
    id: RegionId,
    name: Arc<str>,
    geometry: MultiPolygon<f64>,
    area: f64,
    bbox: Rect<f64>,
}

impl Region {
    #[inline] pub fn id(&self) -> RegionId { self.id }

    #[inline] pub fn name(&self) -> &Arc<str> { &self.name }

    #[inline] pub fn geometry(&self) -> &MultiPolygon<f64> { &self.geometry }

    #[inline] pub fn area(&self) -> f64 { self.area }

    #[inline] pub fn bbox(&self) -> &Rect<f64> { &self.bbox }
}

/// Zones and regions of one run, validated and normalized into one planar
/// coordinate system. Immutable once built.
#[derive(Debug, Clone)]
pub struct GeometryStore {
    zones: Vec<Zone>,
    zone_lookup: AHashMap<ZoneId, usize>,
    regions: Vec<Option<Region>>, // indexed by RegionId; `None` for rejected rows
    num_regions: usize,
    epsg: Option<u32>,
    rejected: Vec<EntityError>,
}

impl GeometryStore {
    /// Validate both layers and cache per-polygon area and bounds.
    ///
    /// Invalid entities are dropped and reported through [`rejected`](Self::rejected)
    /// under [`InvalidPolicy::Skip`], or fail construction under [`InvalidPolicy::Abort`].
    /// Fails with [`CrosswalkError::CrsMismatch`] if both layers declare an EPSG code
    /// and the codes differ.
    pub fn new(zones: PolygonSet<ZoneId>, regions: PolygonSet<Arc<str>>, on_invalid: InvalidPolicy) -> Result<Self> {
        let epsg = match (zones.epsg(), regions.epsg()) {
            (Some(z), Some(r)) if z != r => return Err(CrosswalkError::CrsMismatch { zones: z, regions: r }),
            (z, r) => z.or(r),
        };

        let mut rejected = Vec::new();
        let mut reject = |err: EntityError| -> Result<()> {
            warn!("rejected {err}");
            match on_invalid {
                InvalidPolicy::Abort => Err(err.into()),
                InvalidPolicy::Skip => { rejected.push(err); Ok(()) }
            }
        };

        // Zones: validation runs in parallel, id bookkeeping in input order.
        let zone_features = zones.into_features();
        let prepared_zones: Vec<_> = zone_features.par_iter()
            .map(|(_, geometry)| prepare(geometry, true))
            .collect();

        let mut zone_list: Vec<Zone> = Vec::with_capacity(zone_features.len());
        let mut zone_lookup: AHashMap<ZoneId, usize> = AHashMap::with_capacity(zone_features.len());
        for (row, ((id, _), prepared)) in zone_features.into_iter().zip(prepared_zones).enumerate() {
            if let Some(&first) = zone_lookup.get(&id) {
                let first_row = zone_list[first].row;
                reject(EntityError { entity: Entity::Zone { id, row }, reason: GeometryError::DuplicateZoneId { first_row } })?;
                continue;
            }
            match prepared {
                Ok(Prepared { geometry, area }) => {
                    zone_lookup.insert(id.clone(), zone_list.len());
                    zone_list.push(Zone { bbox: geometry.bounding_rect(), id, row, geometry, area });
                }
                Err(reason) => reject(EntityError { entity: Entity::Zone { id, row }, reason })?,
            }
        }

        // Regions: rows keep their input position so RegionId never shifts.
        let region_features = regions.into_features();
        let num_regions = region_features.len();
        let too_many = || CrosswalkError::TooManyRegions { rows: num_regions };
        let prepared_regions: Vec<_> = region_features.par_iter()
            .map(|(_, geometry)| prepare(geometry, false))
            .collect();

        let mut region_list = Vec::with_capacity(num_regions);
        for (row, ((name, _), prepared)) in region_features.into_iter().zip(prepared_regions).enumerate() {
            let id = RegionId::try_from(row).map_err(|_| too_many())?;
            let bounds = prepared.as_ref().ok().and_then(|p| p.geometry.bounding_rect());
            match (prepared, bounds) {
                (Ok(Prepared { geometry, area }), Some(bbox)) => {
                    region_list.push(Some(Region { id, name, geometry, area, bbox }));
                }
                (Ok(_), None) => {
                    reject(EntityError { entity: Entity::Region { id, name }, reason: GeometryError::Empty })?;
                    region_list.push(None);
                }
                (Err(reason), _) => {
                    reject(EntityError { entity: Entity::Region { id, name }, reason })?;
                    region_list.push(None);
                }
            }
        }

        debug!(
            zones = zone_list.len(),
            regions = region_list.iter().flatten().count(),
            rejected = rejected.len(),
            "geometry store built"
        );

        Ok(Self { zones: zone_list, zone_lookup, regions: region_list, num_regions, epsg, rejected })
    }

    /// Number of valid zones.
    #[inline] pub fn num_zones(&self) -> usize { self.zones.len() }

    /// Number of region rows, including rejected ones.
    #[inline] pub fn num_regions(&self) -> usize { self.num_regions }

    /// The EPSG code shared by both layers, if either declared one.
    #[inline] pub fn epsg(&self) -> Option<u32> { self.epsg }

    /// Valid zones in input order.
    #[inline] pub fn zones(&self) -> &[Zone] { &self.zones }

    /// Get the zone at position `idx` of [`zones`](Self::zones).
    #[inline] pub fn zone(&self, idx: usize) -> Option<&Zone> { self.zones.get(idx) }

    /// Position of a zone in [`zones`](Self::zones).
    #[inline] pub fn zone_index(&self, id: &ZoneId) -> Option<usize> { self.zone_lookup.get(id).copied() }

    #[inline] pub fn zone_id(&self, idx: usize) -> Option<&ZoneId> { self.zones.get(idx).map(Zone::id) }

    /// Cached area of a zone.
    #[inline]
    pub fn zone_area(&self, id: &ZoneId) -> Option<f64> {
        self.zone_index(id).map(|idx| self.zones[idx].area)
    }

    #[inline]
    pub fn zone_geometry(&self, id: &ZoneId) -> Option<&MultiPolygon<f64>> {
        self.zone_index(id).map(|idx| &self.zones[idx].geometry)
    }

    /// Get a region by row; `None` if the row is unknown or was rejected.
    #[inline]
    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(id.index()).and_then(Option::as_ref)
    }

    #[inline]
    pub fn region_geometry(&self, id: RegionId) -> Option<&MultiPolygon<f64>> {
        self.region(id).map(Region::geometry)
    }

    #[inline]
    pub fn region_name(&self, id: RegionId) -> Option<&str> {
        self.region(id).map(|region| &*region.name)
    }

    /// Valid regions in row order.
    pub fn regions(&self) -> impl Iterator<Item = &Region> + '_ {
        self.regions.iter().flatten()
    }

    /// All valid regions carrying `name`, in row order.
    pub fn regions_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Region> + 'a {
        self.regions().filter(move |region| &*region.name == name)
    }

    /// Entities dropped during construction, in input order (zones first).
    #[inline] pub fn rejected(&self) -> &[EntityError] { &self.rejected }

    /// Bounding rectangle of all valid regions.
    pub fn region_bounds(&self) -> Option<Rect<f64>> {
        self.regions().map(|region| region.bbox).reduce(bbox::union)
    }
}
