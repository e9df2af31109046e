use std::{cmp::Ordering, fmt, sync::Arc};

use serde::Deserialize;

use crate::{
    config::CrosswalkConfig,
    record::{AssignmentRecord, AssignmentStatus, OverlapRecord},
    types::ZoneId,
};

/// Overlap percentages within this distance of the best one are tied.
pub const DEFAULT_TIE_EPSILON: f64 = 1e-9;

/// Caller-supplied comparator used to break ties between candidates.
/// `Ordering::Less` means the first record wins.
#[derive(Clone)]
pub struct SecondaryKey(Arc<dyn Fn(&OverlapRecord, &OverlapRecord) -> Ordering + Send + Sync>);

impl SecondaryKey {
    pub fn new(cmp: impl Fn(&OverlapRecord, &OverlapRecord) -> Ordering + Send + Sync + 'static) -> Self {
        Self(Arc::new(cmp))
    }
}

impl fmt::Debug for SecondaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("SecondaryKey(..)") }
}

/// Secondary key for candidates whose overlap percentages tie.
///
/// Whatever the key, a remaining tie goes to the lower `RegionId`, so the
/// winner never depends on candidate iteration order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Lexicographically smallest region name wins.
    #[default]
    RegionName,
    /// Earliest region row wins.
    RegionOrder,
    #[serde(skip)]
    Custom(SecondaryKey),
}

impl TieBreak {
    /// Total order over candidates of one zone: the winner compares `Less`.
    pub fn compare(&self, a: &OverlapRecord, b: &OverlapRecord) -> Ordering {
        match self {
            TieBreak::RegionName => a.region_name.cmp(&b.region_name),
            TieBreak::RegionOrder => a.region.cmp(&b.region),
            TieBreak::Custom(key) => (key.0)(a, b),
        }
        .then_with(|| a.region.cmp(&b.region))
    }
}

/// Reduces one zone's scored candidates to its assignment. Stateless across zones.
#[derive(Debug, Clone)]
pub struct AssignmentSelector {
    tie_break: TieBreak,
    tie_epsilon: f64,
    min_overlap_pct: Option<f64>,
}

impl Default for AssignmentSelector {
    fn default() -> Self { Self::new(TieBreak::default()) }
}

impl AssignmentSelector {
    pub fn new(tie_break: TieBreak) -> Self {
        Self { tie_break, tie_epsilon: DEFAULT_TIE_EPSILON, min_overlap_pct: None }
    }

    pub fn from_config(config: &CrosswalkConfig) -> Self {
        Self {
            tie_break: config.tie_break.clone(),
            tie_epsilon: config.tie_epsilon,
            min_overlap_pct: config.min_overlap_pct,
        }
    }

    pub fn with_tie_epsilon(mut self, epsilon: f64) -> Self {
        self.tie_epsilon = epsilon;
        self
    }

    pub fn with_min_overlap_pct(mut self, pct: f64) -> Self {
        self.min_overlap_pct = Some(pct);
        self
    }

    #[inline] pub fn tie_break(&self) -> &TieBreak { &self.tie_break }

    /// Best overlap percentage among candidates with a positive overlap.
    fn best_pct(candidates: &[OverlapRecord]) -> Option<f64> {
        candidates.iter()
            .filter(|c| c.overlap_area > 0.0)
            .map(|c| c.overlap_pct)
            .reduce(f64::max)
    }

    /// Sort candidates best first: the tied leaders by the secondary key, then
    /// everything else by percentage descending, then by the secondary key.
    pub fn rank(&self, candidates: &mut [OverlapRecord]) {
        let best = Self::best_pct(candidates);
        let leads = |c: &OverlapRecord| {
            best.is_some_and(|best| c.overlap_area > 0.0 && c.overlap_pct >= best - self.tie_epsilon)
        };
        candidates.sort_by(|a, b| {
            leads(b).cmp(&leads(a))
                .then_with(|| if leads(a) { Ordering::Equal } else { b.overlap_pct.total_cmp(&a.overlap_pct) })
                .then_with(|| self.tie_break.compare(a, b))
        });
    }

    /// Select the assignment of one zone from all of its scored candidates.
    ///
    /// Zero-area zones resolve to [`AssignmentStatus::Degenerate`]. Zones
    /// without any positive overlap resolve to [`AssignmentStatus::NoOverlap`].
    pub fn select(&self, zone_id: &ZoneId, zone_area: f64, candidates: &[OverlapRecord]) -> AssignmentRecord {
        if !(zone_area > 0.0) {
            return AssignmentRecord::unassigned(zone_id.clone(), zone_area, AssignmentStatus::Degenerate);
        }
        let Some(best) = Self::best_pct(candidates) else {
            return AssignmentRecord::unassigned(zone_id.clone(), zone_area, AssignmentStatus::NoOverlap);
        };

        let winner = candidates.iter()
            .filter(|c| c.overlap_area > 0.0 && c.overlap_pct >= best - self.tie_epsilon)
            .min_by(|a, b| self.tie_break.compare(a, b))
            .unwrap_or_else(|| unreachable!("the best candidate is always tied with itself"));

        let below = self.min_overlap_pct.is_some_and(|min| winner.overlap_pct + self.tie_epsilon < min);
        AssignmentRecord {
            zone_id: zone_id.clone(),
            region: (!below).then_some(winner.region),
            region_name: (!below).then(|| winner.region_name.clone()),
            zone_area,
            overlap_area: winner.overlap_area,
            overlap_pct: winner.overlap_pct,
            status: if below { AssignmentStatus::BelowThreshold } else { AssignmentStatus::Matched },
        }
    }
}
