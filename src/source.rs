//! Data source schema
//!
//! Serde schema for per-area input records: one `RawAreaRecord` per area,
//! carrying the series points and optional per-area baseline window bounds
//! that override the configured window. The core is agnostic to where the
//! records came from; this module only defines the wire shape and the NDJSON
//! / JSON-array parsers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{AnalysisConfig, TimeRange};
use crate::error::ResilienceError;
use crate::types::{MobilitySeries, TimePoint};

/// One area's raw input record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawAreaRecord {
    pub area_id: String,
    /// Per-area baseline window start, overriding the configured window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_start: Option<DateTime<Utc>>,
    /// Per-area baseline window end, overriding the configured window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_end: Option<DateTime<Utc>>,
    pub points: Vec<TimePoint>,
}

impl RawAreaRecord {
    pub fn into_series(self) -> MobilitySeries {
        MobilitySeries {
            area_id: self.area_id,
            points: self.points,
        }
    }

    /// Config for this area: the base config with the record's baseline
    /// bounds applied when both are present.
    pub fn area_config(&self, base: &AnalysisConfig) -> AnalysisConfig {
        match (self.baseline_start, self.baseline_end) {
            (Some(start), Some(end)) => base.with_baseline_window(TimeRange::new(start, end)),
            _ => base.clone(),
        }
    }
}

/// Parse newline-delimited JSON, one record per non-empty line.
pub fn parse_ndjson(input: &str) -> Result<Vec<RawAreaRecord>, ResilienceError> {
    input
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(ResilienceError::from))
        .collect()
}

/// Parse a JSON array of records.
pub fn parse_json_array(input: &str) -> Result<Vec<RawAreaRecord>, ResilienceError> {
    serde_json::from_str(input).map_err(ResilienceError::from)
}
