//! Plot payload encoding
//!
//! Encodes a finished area analysis into a renderer-facing JSON payload: the
//! cleaned curve with fill flags, the baseline band, the marked
//! onset/trough/recovery events, and the metric annotations. No plotting
//! logic lives here; a renderer consumes the payload as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ResilienceError;
use crate::pipeline::AreaAnalysis;
use crate::types::{CleanedPoint, MetricsRecord};
use crate::{CRATE_VERSION, PRODUCER_NAME};

/// Producer metadata stamped on every payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Event timestamps a renderer marks on the curve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotEvents {
    pub onset: Option<DateTime<Utc>>,
    pub trough: Option<DateTime<Utc>>,
    pub recovery: Option<DateTime<Utc>>,
}

/// Plot-ready bundle for one area
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotPayload {
    pub producer: PlotProducer,
    pub computed_at_utc: String,
    pub area_id: String,
    pub baseline_level: f64,
    pub baseline_start: DateTime<Utc>,
    pub baseline_end: DateTime<Utc>,
    pub curve: Vec<CleanedPoint>,
    pub events: PlotEvents,
    pub annotations: Vec<MetricsRecord>,
}

/// Encoder producing plot payloads for a renderer
pub struct PlotEncoder {
    instance_id: String,
}

impl Default for PlotEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PlotEncoder {
    /// Create an encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Encode an area analysis into a plot payload
    pub fn encode(&self, analysis: &AreaAnalysis) -> PlotPayload {
        let cleaned = &analysis.cleaned;
        let at = |i: Option<usize>| i.map(|i| cleaned.points[i].timestamp);

        PlotPayload {
            producer: PlotProducer {
                name: PRODUCER_NAME.to_string(),
                version: CRATE_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
            area_id: cleaned.area_id.clone(),
            baseline_level: cleaned.baseline.level,
            baseline_start: cleaned.baseline.window.start,
            baseline_end: cleaned.baseline.window.end,
            curve: cleaned.points.clone(),
            events: PlotEvents {
                onset: at(analysis.window.onset_index),
                trough: at(analysis.window.trough_index),
                recovery: at(analysis.window.recovery_index),
            },
            annotations: analysis.records.clone(),
        }
    }

    /// Encode to pretty-printed JSON
    pub fn encode_to_json(&self, analysis: &AreaAnalysis) -> Result<String, ResilienceError> {
        serde_json::to_string_pretty(&self.encode(analysis)).map_err(ResilienceError::Json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnalysisConfig, TimeRange};
    use crate::pipeline::analyze_area;
    use crate::types::{MobilitySeries, TimePoint};
    use chrono::TimeZone;

    fn ts(day: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 9, 1, 0, 0, 0).unwrap() + chrono::Duration::days(day)
    }

    fn analysis() -> AreaAnalysis {
        let values = [
            100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 100.0, //
            90.0, 75.0, 60.0, 60.0, 80.0, 90.0, 100.0,
        ];
        let series = MobilitySeries::new(
            "a",
            values
                .iter()
                .enumerate()
                .map(|(i, v)| TimePoint::new(ts(i as i64), Some(*v)))
                .collect(),
        );
        let config = AnalysisConfig::new(TimeRange::new(ts(0), ts(6)));
        analyze_area(&series, &config).unwrap()
    }

    #[test]
    fn test_payload_marks_events() {
        let payload = PlotEncoder::new().encode(&analysis());
        assert_eq!(payload.events.onset, Some(ts(7)));
        assert_eq!(payload.events.trough, Some(ts(9)));
        assert_eq!(payload.events.recovery, Some(ts(13)));
        assert_eq!(payload.curve.len(), 14);
        assert_eq!(payload.annotations.len(), 2);
        assert_eq!(payload.baseline_level, 100.0);
    }

    #[test]
    fn test_payload_json_shape() {
        let encoder = PlotEncoder::with_instance_id("fixed".to_string());
        let json = encoder.encode_to_json(&analysis()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["producer"]["name"], PRODUCER_NAME);
        assert_eq!(value["producer"]["instance_id"], "fixed");
        assert_eq!(value["annotations"][0]["model"], "triangle");
        assert_eq!(value["annotations"][1]["model"], "auc");
        assert!(value["curve"][4]["interpolated"].as_bool() == Some(false));
    }
}
