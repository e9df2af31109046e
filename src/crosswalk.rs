use std::sync::Arc;

use rayon::{prelude::*, ThreadPoolBuilder};
use smallvec::SmallVec;
use tracing::{debug, info};

use crate::{
    config::CrosswalkConfig,
    error::{CrosswalkError, EntityError, Result},
    geom::{GeometryStore, Region, Zone},
    index::{RegionIndex, SpatialIndex},
    overlap::OverlapComputer,
    record::{AssignmentRecord, AssignmentStatus, OverlapRecord, ZoneDiagnostics},
    select::AssignmentSelector,
    types::{PolygonSet, ZoneId},
};

/// Assignment of one zone together with every candidate it was scored against,
/// best first.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneOutcome {
    pub assignment: AssignmentRecord,
    pub candidates: Vec<OverlapRecord>,
}

/// Counts of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub zones: usize,
    pub matched: usize,
    pub no_overlap: usize,
    pub below_threshold: usize,
    pub degenerate: usize,
    pub errors: usize,
}

impl RunSummary {
    fn tally(assignments: &[AssignmentRecord], errors: usize) -> Self {
        let mut summary = Self { zones: assignments.len(), errors, ..Self::default() };
        for record in assignments {
            match record.status {
                AssignmentStatus::Matched => summary.matched += 1,
                AssignmentStatus::NoOverlap => summary.no_overlap += 1,
                AssignmentStatus::BelowThreshold => summary.below_threshold += 1,
                AssignmentStatus::Degenerate => summary.degenerate += 1,
            }
        }
        summary
    }
}

/// Result of [`Crosswalk::run`].
#[derive(Debug, Clone)]
pub struct CrosswalkReport {
    /// One record per valid zone, in input order.
    pub assignments: Vec<AssignmentRecord>,
    /// Ranked candidate lists, present when diagnostics were requested.
    pub diagnostics: Option<Vec<ZoneDiagnostics>>,
    /// Entities rejected while building the geometry store.
    pub errors: Vec<EntityError>,
    pub summary: RunSummary,
}

impl CrosswalkReport {
    /// Assignment of `id`, if the zone was valid.
    pub fn assignment(&self, id: &ZoneId) -> Option<&AssignmentRecord> {
        self.assignments.iter().find(|record| &record.zone_id == id)
    }
}

/// Zone-to-region crosswalk over one pair of polygon layers.
///
/// The store and index are built once and read-only afterwards, so zones can
/// be assigned from any number of threads.
#[derive(Debug)]
pub struct Crosswalk<I: RegionIndex = SpatialIndex> {
    store: GeometryStore,
    index: I,
    config: CrosswalkConfig,
    computer: OverlapComputer,
    selector: AssignmentSelector,
}

impl Crosswalk<SpatialIndex> {
    /// Validate both layers and index the regions with an R-tree.
    pub fn new(zones: PolygonSet<ZoneId>, regions: PolygonSet<Arc<str>>, config: CrosswalkConfig) -> Result<Self> {
        Self::with_index(zones, regions, config, SpatialIndex::new)
    }
}

impl<I: RegionIndex> Crosswalk<I> {
    /// Validate both layers and index the regions with `build_index`.
    pub fn with_index(
        zones: PolygonSet<ZoneId>,
        regions: PolygonSet<Arc<str>>,
        config: CrosswalkConfig,
        build_index: impl FnOnce(&GeometryStore) -> I,
    ) -> Result<Self> {
        config.validate()?;
        let store = GeometryStore::new(zones, regions, config.on_invalid)?;
        let index = build_index(&store);
        Ok(Self {
            computer: OverlapComputer::new(config.area_epsilon),
            selector: AssignmentSelector::from_config(&config),
            store,
            index,
            config,
        })
    }

    #[inline] pub fn store(&self) -> &GeometryStore { &self.store }

    #[inline] pub fn index(&self) -> &I { &self.index }

    #[inline] pub fn config(&self) -> &CrosswalkConfig { &self.config }

    /// Regions whose bounding box meets the zone's, in `RegionId` order.
    fn gather(&self, zone: &Zone) -> Result<SmallVec<[&Region; 8]>> {
        let Some(bbox) = zone.bbox() else { return Ok(SmallVec::new()) };
        self.index.candidates(bbox).into_iter()
            .map(|id| self.store.region(id).ok_or_else(|| CrosswalkError::IndexConsistency {
                zone: zone.id().clone(),
                region: id,
            }))
            .collect()
    }

    /// Gather, score and select the assignment of a single zone.
    ///
    /// Fails only if the index returns a region the store does not hold.
    pub fn assign_zone(&self, zone: &Zone) -> Result<ZoneOutcome> {
        let mut candidates: Vec<OverlapRecord> = self.gather(zone)?.into_iter()
            .map(|region| self.computer.score(zone, region))
            .collect();
        let assignment = self.selector.select(zone.id(), zone.area(), &candidates);
        self.selector.rank(&mut candidates);
        Ok(ZoneOutcome { assignment, candidates })
    }

    /// Assign every valid zone, in input order.
    fn assign_all(&self) -> Result<Vec<ZoneOutcome>> {
        self.store.zones().par_iter()
            .map(|zone| self.assign_zone(zone))
            .collect()
    }

    /// Assign every valid zone on the configured worker pool and assemble the report.
    pub fn run(&self) -> Result<CrosswalkReport> {
        debug!(
            zones = self.store.num_zones(),
            regions = self.store.num_regions(),
            threads = ?self.config.threads,
            "starting crosswalk"
        );

        let outcomes = match self.config.threads {
            Some(threads) => ThreadPoolBuilder::new().num_threads(threads).build()?.install(|| self.assign_all())?,
            None => self.assign_all()?,
        };

        let (assignments, diagnostics): (Vec<_>, Vec<_>) = outcomes.into_iter()
            .map(|ZoneOutcome { assignment, candidates }| {
                let zone_id = assignment.zone_id.clone();
                (assignment, ZoneDiagnostics { zone_id, candidates })
            })
            .unzip();

        let errors = self.store.rejected().to_vec();
        let summary = RunSummary::tally(&assignments, errors.len());
        info!(
            zones = summary.zones,
            matched = summary.matched,
            no_overlap = summary.no_overlap,
            below_threshold = summary.below_threshold,
            degenerate = summary.degenerate,
            errors = summary.errors,
            "crosswalk complete"
        );

        Ok(CrosswalkReport {
            assignments,
            diagnostics: self.config.diagnostics.then_some(diagnostics),
            errors,
            summary,
        })
    }
}
