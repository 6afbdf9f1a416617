//! Core types for the resilience analysis pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! analysis: raw series, cleaned series with baseline deviations, located
//! disruption windows, and the metrics records both models emit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::TimeRange;

/// Seconds per day, used to report all durations in day units
const SECONDS_PER_DAY: f64 = 86_400.0;

/// One sample of a mobility indicator.
///
/// A `None` value is an explicit missing sample; missing data is carried
/// through to the preprocessor rather than silently dropped, so gap-filling
/// stays auditable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    /// Observation timestamp (UTC)
    #[serde(rename = "t")]
    pub timestamp: DateTime<Utc>,
    /// Observed indicator value, `None` when the sample is missing
    #[serde(rename = "v")]
    pub value: Option<f64>,
}

impl TimePoint {
    pub fn new(timestamp: DateTime<Utc>, value: Option<f64>) -> Self {
        Self { timestamp, value }
    }
}

/// Ordered mobility time series for one geographic area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MobilitySeries {
    /// Area identifier (e.g., a census block group)
    pub area_id: String,
    /// Samples ordered by strictly increasing timestamp
    pub points: Vec<TimePoint>,
}

impl MobilitySeries {
    pub fn new(area_id: impl Into<String>, points: Vec<TimePoint>) -> Self {
        Self {
            area_id: area_id.into(),
            points,
        }
    }
}

/// Expected mobility level absent disruption, derived from pre-event data.
///
/// Immutable once produced; recomputed on every `prepare` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    /// Mean of non-missing values inside the baseline window
    pub level: f64,
    /// Window the level was estimated from
    pub window: TimeRange,
    /// Number of non-missing samples that contributed
    pub samples: usize,
}

/// One cleaned sample: gap-filled value plus its deviation from baseline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CleanedPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    /// value − baseline level
    pub deviation: f64,
    /// True when the value was filled rather than observed
    pub interpolated: bool,
}

/// Preprocessed series: gap-filled signal paired with its baseline.
///
/// Sole input to both resilience models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedSeries {
    pub area_id: String,
    pub baseline: Baseline,
    pub points: Vec<CleanedPoint>,
}

impl CleanedSeries {
    /// Days elapsed between two sample indices
    pub fn days_between(&self, from: usize, to: usize) -> f64 {
        let dt = self.points[to].timestamp - self.points[from].timestamp;
        dt.num_seconds() as f64 / SECONDS_PER_DAY
    }

    /// First index with a timestamp strictly after `t`, or `len` if none
    pub fn first_index_after(&self, t: DateTime<Utc>) -> usize {
        self.points
            .iter()
            .position(|p| p.timestamp > t)
            .unwrap_or(self.points.len())
    }
}

/// Located disruption: onset, trough, and recovery sample indices.
///
/// All-`None` means no disruption was detected, which is a valid terminal
/// outcome, not an error. When onset is present, trough is present and
/// onset ≤ trough; when recovery is present, trough < recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisruptionWindow {
    pub onset_index: Option<usize>,
    pub trough_index: Option<usize>,
    pub recovery_index: Option<usize>,
}

impl DisruptionWindow {
    /// Window for a series that never left the baseline band
    pub fn undisrupted() -> Self {
        Self {
            onset_index: None,
            trough_index: None,
            recovery_index: None,
        }
    }

    pub fn is_disrupted(&self) -> bool {
        self.onset_index.is_some()
    }

    pub fn is_recovered(&self) -> bool {
        // An undisrupted series is recovered by definition
        !self.is_disrupted() || self.recovery_index.is_some()
    }
}

/// Which resilience model produced a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelName {
    Triangle,
    Auc,
}

impl ModelName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelName::Triangle => "triangle",
            ModelName::Auc => "auc",
        }
    }
}

/// Recovery descriptors for one (area, model) pair.
///
/// Immutable value object consumed by the renderer and batch runner. Optional
/// fields are undefined for the case at hand and are reported as absent, never
/// as a silent zero: `recovery_rate` when recovery never happened,
/// `decline_rate`/`robustness` outside the triangle model, `raw_area` outside
/// the AUC model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub area_id: String,
    pub model: ModelName,
    /// Depth of the disruption: |deviation| at the trough
    pub magnitude: f64,
    /// Onset to recovery (or to series end when unrecovered), in days
    pub duration_days: f64,
    /// Rate of decline, magnitude per day from onset to trough
    pub decline_rate: Option<f64>,
    /// Rate of recovery, magnitude per day from trough to recovery
    pub recovery_rate: Option<f64>,
    /// 1 − magnitude/baseline, clamped to [0, 1]
    pub robustness: Option<f64>,
    /// Normalized loss fraction: area-based score over baseline × duration
    pub extent: f64,
    /// Unnormalized integrated |deviation| (AUC model only)
    pub raw_area: Option<f64>,
    pub recovered: bool,
}

impl MetricsRecord {
    /// Record for a series with no detected disruption: zero loss, recovered
    /// by definition.
    pub fn undisrupted(area_id: &str, model: ModelName) -> Self {
        Self {
            area_id: area_id.to_string(),
            model,
            magnitude: 0.0,
            duration_days: 0.0,
            decline_rate: None,
            recovery_rate: None,
            robustness: match model {
                ModelName::Triangle => Some(1.0),
                ModelName::Auc => None,
            },
            extent: 0.0,
            raw_area: match model {
                ModelName::Auc => Some(0.0),
                ModelName::Triangle => None,
            },
            recovered: true,
        }
    }
}
