//! Area-Under-the-Curve model
//!
//! Integrates |deviation| over the analysis window with the trapezoidal rule,
//! taking each segment width from the actual timestamp gap, so irregular
//! sampling needs no special handling. Absolute deviation is integrated:
//! overshoot above baseline after the dip adds to the loss score rather than
//! canceling it.

use crate::config::AnalysisConfig;
use crate::error::ResilienceError;
use crate::locator::DisruptionLocator;
use crate::types::{CleanedSeries, MetricsRecord, ModelName};

/// AUC loss-score calculator
pub struct AucModel;

impl AucModel {
    /// Compute the AUC metrics record.
    ///
    /// The integration window is `fixed_auc_window` when configured;
    /// otherwise detection is delegated to [`DisruptionLocator`] and the
    /// onset→recovery span is used (to series end when recovery is absent).
    pub fn compute(
        cleaned: &CleanedSeries,
        config: &AnalysisConfig,
    ) -> Result<MetricsRecord, ResilienceError> {
        let threshold = config.onset_threshold * cleaned.baseline.level;

        let (start, end, recovered) = match config.fixed_auc_window {
            Some(range) => {
                let first = cleaned
                    .points
                    .iter()
                    .position(|p| range.contains(p.timestamp));
                let last = cleaned
                    .points
                    .iter()
                    .rposition(|p| range.contains(p.timestamp));
                match (first, last) {
                    (Some(a), Some(b)) if a < b => {
                        // With a caller-fixed window, recovery is judged by
                        // where the window leaves the signal.
                        let recovered = cleaned.points[b].deviation >= threshold;
                        (a, b, recovered)
                    }
                    _ => {
                        return Ok(MetricsRecord::undisrupted(&cleaned.area_id, ModelName::Auc))
                    }
                }
            }
            None => {
                let window = DisruptionLocator::locate(cleaned, config);
                let onset = match window.onset_index {
                    Some(o) => o,
                    None => {
                        if config.require_disruption {
                            return Err(ResilienceError::UnresolvedWindow(format!(
                                "area {}: no disruption detected",
                                cleaned.area_id
                            )));
                        }
                        return Ok(MetricsRecord::undisrupted(&cleaned.area_id, ModelName::Auc));
                    }
                };
                let end = window.recovery_index.unwrap_or(cleaned.points.len() - 1);
                (onset, end, window.recovery_index.is_some())
            }
        };

        let raw_area = trapezoid_abs_deviation(cleaned, start, end);
        let duration_days = cleaned.days_between(start, end);
        let extent = if duration_days > 0.0 {
            raw_area / (cleaned.baseline.level * duration_days)
        } else {
            0.0
        };

        let magnitude = cleaned.points[start..=end]
            .iter()
            .map(|p| -p.deviation)
            .fold(0.0_f64, f64::max);

        Ok(MetricsRecord {
            area_id: cleaned.area_id.clone(),
            model: ModelName::Auc,
            magnitude,
            duration_days,
            decline_rate: None,
            recovery_rate: None,
            robustness: None,
            extent,
            raw_area: Some(raw_area),
            recovered,
        })
    }
}

/// Trapezoidal integral of |deviation| between two sample indices, in
/// value × days units
fn trapezoid_abs_deviation(cleaned: &CleanedSeries, start: usize, end: usize) -> f64 {
    let mut area = 0.0;
    for i in start..end {
        let width = cleaned.days_between(i, i + 1);
        let a = cleaned.points[i].deviation.abs();
        let b = cleaned.points[i + 1].deviation.abs();
        area += 0.5 * (a + b) * width;
    }
    area
}
