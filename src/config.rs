use serde::Deserialize;

use crate::{
    error::{CrosswalkError, Result},
    overlap::DEFAULT_AREA_EPSILON,
    select::{DEFAULT_TIE_EPSILON, TieBreak},
};

/// What to do when an input polygon fails validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidPolicy {
    /// Drop the entity, record it in the run's error list and continue.
    #[default]
    Skip,
    /// Fail store construction on the first invalid entity.
    Abort,
}

/// Tunables of a crosswalk run. Every field has a default, so a JSON config
/// file only needs the keys it changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CrosswalkConfig {
    /// Overlaps at or below `area_epsilon * zone_area` are treated as zero.
    pub area_epsilon: f64,
    /// Overlap percentages within this distance of the best one are tied.
    pub tie_epsilon: f64,
    /// Best matches covering less than this share of the zone are not assigned.
    pub min_overlap_pct: Option<f64>,
    /// Secondary key used to break ties on overlap percentage.
    pub tie_break: TieBreak,
    pub on_invalid: InvalidPolicy,
    /// Size of the worker pool; `None` uses the global rayon pool.
    pub threads: Option<usize>,
    /// Keep every zone's full candidate list in the report.
    pub diagnostics: bool,
}

impl Default for CrosswalkConfig {
    fn default() -> Self {
        Self {
            area_epsilon: DEFAULT_AREA_EPSILON,
            tie_epsilon: DEFAULT_TIE_EPSILON,
            min_overlap_pct: None,
            tie_break: TieBreak::default(),
            on_invalid: InvalidPolicy::default(),
            threads: None,
            diagnostics: false,
        }
    }
}

impl CrosswalkConfig {
    pub fn with_area_epsilon(mut self, epsilon: f64) -> Self {
        self.area_epsilon = epsilon;
        self
    }

    pub fn with_tie_epsilon(mut self, epsilon: f64) -> Self {
        self.tie_epsilon = epsilon;
        self
    }

    pub fn with_min_overlap_pct(mut self, pct: f64) -> Self {
        self.min_overlap_pct = Some(pct);
        self
    }

    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    pub fn with_on_invalid(mut self, policy: InvalidPolicy) -> Self {
        self.on_invalid = policy;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: bool) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Check that every field is in range.
    pub fn validate(&self) -> Result<()> {
        if !(self.area_epsilon >= 0.0 && self.area_epsilon.is_finite()) {
            return Err(CrosswalkError::Config(format!("area_epsilon must be finite and >= 0, got {}", self.area_epsilon)));
        }
        if !(self.tie_epsilon >= 0.0 && self.tie_epsilon.is_finite()) {
            return Err(CrosswalkError::Config(format!("tie_epsilon must be finite and >= 0, got {}", self.tie_epsilon)));
        }
        if let Some(pct) = self.min_overlap_pct {
            if !(0.0..=1.0).contains(&pct) {
                return Err(CrosswalkError::Config(format!("min_overlap_pct must be in [0, 1], got {pct}")));
            }
        }
        if self.threads == Some(0) {
            return Err(CrosswalkError::Config("threads must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = CrosswalkConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.area_epsilon, DEFAULT_AREA_EPSILON);
        assert_eq!(config.on_invalid, InvalidPolicy::Skip);
        assert!(matches!(config.tie_break, TieBreak::RegionName));
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(CrosswalkConfig::default().with_area_epsilon(-1.0).validate().is_err());
        assert!(CrosswalkConfig::default().with_tie_epsilon(f64::NAN).validate().is_err());
        assert!(CrosswalkConfig::default().with_min_overlap_pct(1.5).validate().is_err());
        assert!(CrosswalkConfig::default().with_threads(0).validate().is_err());
        assert!(CrosswalkConfig::default().with_min_overlap_pct(0.5).validate().is_ok());
    }

    #[test]
    fn deserializes_partial_json() {
        let config: CrosswalkConfig = serde_json::from_str(
            r#"{ "min_overlap_pct": 0.5, "tie_break": "region_order", "on_invalid": "abort" }"#
        ).unwrap();
        assert_eq!(config.min_overlap_pct, Some(0.5));
        assert!(matches!(config.tie_break, TieBreak::RegionOrder));
        assert_eq!(config.on_invalid, InvalidPolicy::Abort);
        assert_eq!(config.tie_epsilon, DEFAULT_TIE_EPSILON);
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(serde_json::from_str::<CrosswalkConfig>(r#"{ "epsilon": 1.0 }"#).is_err());
    }
}
