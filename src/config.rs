//! Analysis configuration
//!
//! The original scripts relied on implicit global defaults for thresholds and
//! windows; here every knob is an explicit field on [`AnalysisConfig`], passed
//! into each call. There is no process-wide mutable state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ResilienceError;

/// Default onset threshold: deviation below −5% of baseline
pub const DEFAULT_ONSET_THRESHOLD: f64 = -0.05;

/// Default minimum dwell (samples within threshold) to confirm recovery
pub const DEFAULT_MIN_DWELL: usize = 1;

/// Default minimum non-missing samples required to estimate a baseline
pub const DEFAULT_MIN_BASELINE_POINTS: usize = 3;

/// Inclusive timestamp range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.start && t <= self.end
    }
}

/// How the preprocessor treats missing samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapPolicy {
    /// Linear fill between nearest non-missing neighbors; edge gaps hold the
    /// nearest observed value
    #[default]
    Interpolate,
    /// Exclude missing points, shrinking the effective series
    Drop,
    /// Any missing point fails the analysis for that area
    Fail,
}

/// Configuration consumed by every analysis call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Pre-disruption window the baseline is estimated from
    pub baseline_window: TimeRange,
    pub gap_policy: GapPolicy,
    /// Negative fraction of baseline; deviation below `onset_threshold × level`
    /// marks disruption onset
    pub onset_threshold: f64,
    /// Consecutive samples within threshold required to confirm recovery
    pub min_dwell: usize,
    /// Samples after onset searched for the trough; `None` searches to the end
    pub max_lookahead: Option<usize>,
    /// Minimum non-missing baseline samples, below which analysis fails
    pub min_baseline_points: usize,
    /// Fixed integration window for the AUC model; when `None`, the located
    /// onset→recovery span is used
    pub fixed_auc_window: Option<TimeRange>,
    /// When true, a series with no detected disruption is an error rather
    /// than a zero/degenerate record
    pub require_disruption: bool,
}

impl AnalysisConfig {
    /// Config with defaults for everything except the baseline window, which
    /// has no sensible universal value.
    pub fn new(baseline_window: TimeRange) -> Self {
        Self {
            baseline_window,
            gap_policy: GapPolicy::default(),
            onset_threshold: DEFAULT_ONSET_THRESHOLD,
            min_dwell: DEFAULT_MIN_DWELL,
            max_lookahead: None,
            min_baseline_points: DEFAULT_MIN_BASELINE_POINTS,
            fixed_auc_window: None,
            require_disruption: false,
        }
    }

    /// Same config with a different baseline window (per-area overrides from
    /// the data source)
    pub fn with_baseline_window(&self, window: TimeRange) -> Self {
        Self {
            baseline_window: window,
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<(), ResilienceError> {
        if self.baseline_window.start > self.baseline_window.end {
            return Err(ResilienceError::Config(
                "baseline window start is after its end".to_string(),
            ));
        }
        if self.onset_threshold >= 0.0 {
            return Err(ResilienceError::Config(format!(
                "onset threshold must be a negative fraction of baseline, got {}",
                self.onset_threshold
            )));
        }
        if self.min_dwell == 0 {
            return Err(ResilienceError::Config(
                "minimum recovery dwell must be at least 1 sample".to_string(),
            ));
        }
        if self.min_baseline_points == 0 {
            return Err(ResilienceError::Config(
                "minimum baseline points must be at least 1".to_string(),
            ));
        }
        if let Some(range) = &self.fixed_auc_window {
            if range.start > range.end {
                return Err(ResilienceError::Config(
                    "fixed AUC window start is after its end".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn range(start_day: u32, end_day: u32) -> TimeRange {
        TimeRange::new(
            Utc.with_ymd_and_hms(2019, 9, start_day, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2019, 9, end_day, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::new(range(1, 7));
        assert_eq!(config.gap_policy, GapPolicy::Interpolate);
        assert_eq!(config.onset_threshold, DEFAULT_ONSET_THRESHOLD);
        assert_eq!(config.min_dwell, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let mut config = AnalysisConfig::new(range(1, 7));
        config.onset_threshold = 0.05;
        assert!(config.validate().is_err());

        config.onset_threshold = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_window() {
        let config = AnalysisConfig::new(range(7, 1));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_range_contains_is_inclusive() {
        let r = range(1, 7);
        assert!(r.contains(r.start));
        assert!(r.contains(r.end));
        assert!(!r.contains(r.end + chrono::Duration::seconds(1)));
    }
}
