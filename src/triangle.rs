//! Resilience Triangle model
//!
//! Treats the deviation-from-baseline curve as a triangle spanning onset,
//! trough, and recovery (or the last observed point when recovery never
//! happens) and derives magnitude, duration, decline/recovery rates,
//! robustness, and a normalized loss extent from its geometry.

use crate::config::AnalysisConfig;
use crate::error::ResilienceError;
use crate::types::{CleanedSeries, DisruptionWindow, MetricsRecord, ModelName};

/// Resilience Triangle metric calculator
pub struct TriangleModel;

impl TriangleModel {
    /// Compute triangle metrics for a located disruption window.
    ///
    /// A window with no detected disruption yields a zero/degenerate record
    /// (fully recovered by definition) unless `require_disruption` is set, in
    /// which case it is an [`ResilienceError::UnresolvedWindow`].
    pub fn compute(
        cleaned: &CleanedSeries,
        window: &DisruptionWindow,
        config: &AnalysisConfig,
    ) -> Result<MetricsRecord, ResilienceError> {
        let (onset, trough) = match (window.onset_index, window.trough_index) {
            (Some(o), Some(d)) => (o, d),
            _ => {
                if config.require_disruption {
                    return Err(ResilienceError::UnresolvedWindow(format!(
                        "area {}: no disruption detected",
                        cleaned.area_id
                    )));
                }
                return Ok(MetricsRecord::undisrupted(
                    &cleaned.area_id,
                    ModelName::Triangle,
                ));
            }
        };

        let recovered = window.recovery_index.is_some();
        let end = window.recovery_index.unwrap_or(cleaned.points.len() - 1);

        let level = cleaned.baseline.level;
        let magnitude = cleaned.points[trough].deviation.abs();
        let duration_days = cleaned.days_between(onset, end);

        let decline_days = cleaned.days_between(onset, trough);
        let decline_rate = (decline_days > 0.0).then(|| magnitude / decline_days);

        let recovery_rate = window.recovery_index.and_then(|r| {
            let days = cleaned.days_between(trough, r);
            (days > 0.0).then(|| magnitude / days)
        });

        // Deviation exceeding the baseline would push this negative; the
        // clamp keeps robustness in [0, 1].
        let robustness = (1.0 - magnitude / level).clamp(0.0, 1.0);

        let extent = normalized_triangle_extent(cleaned, onset, trough, end);

        Ok(MetricsRecord {
            area_id: cleaned.area_id.clone(),
            model: ModelName::Triangle,
            magnitude,
            duration_days,
            decline_rate,
            recovery_rate,
            robustness: Some(robustness),
            extent,
            raw_area: None,
            recovered,
        })
    }
}

/// Shoelace area of the onset/trough/endpoint triangle in deviation space
/// (days on the x-axis), normalized by baseline level × duration.
fn normalized_triangle_extent(
    cleaned: &CleanedSeries,
    onset: usize,
    trough: usize,
    end: usize,
) -> f64 {
    let duration = cleaned.days_between(onset, end);
    if duration <= 0.0 {
        return 0.0;
    }

    let (x1, y1) = (0.0, cleaned.points[onset].deviation);
    let (x2, y2) = (cleaned.days_between(onset, trough), cleaned.points[trough].deviation);
    let (x3, y3) = (duration, cleaned.points[end].deviation);

    let area = 0.5 * (x1 * (y2 - y3) + x2 * (y3 - y1) + x3 * (y1 - y2)).abs();
    area / (cleaned.baseline.level * duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnalysisConfig, TimeRange};
    use crate::locator::DisruptionLocator;
    use crate::preprocess::SeriesPreprocessor;
    use crate::types::{MobilitySeries, TimePoint};
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(day: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 9, 1, 0, 0, 0).unwrap() + chrono::Duration::days(day)
    }

    fn analyze(values: &[f64], config: &AnalysisConfig) -> MetricsRecord {
        let series = MobilitySeries::new(
            "a",
            values
                .iter()
                .enumerate()
                .map(|(i, v)| TimePoint::new(ts(i as i64), Some(*v)))
                .collect(),
        );
        let cleaned = SeriesPreprocessor::prepare(&series, config).unwrap();
        let window = DisruptionLocator::locate(&cleaned, config);
        TriangleModel::compute(&cleaned, &window, config).unwrap()
    }

    fn config() -> AnalysisConfig {
        AnalysisConfig::new(TimeRange::new(ts(0), ts(6)))
    }

    // Baseline 100 for 7 days, linear drop to -40 over 3 points,
    // 2 points at -40, rise back to baseline over 3 points.
    fn dip_and_recover() -> Vec<f64> {
        vec![
            100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 100.0, //
            90.0, 75.0, 60.0, 60.0, 80.0, 90.0, 100.0,
        ]
    }

    #[test]
    fn test_dip_and_recover_metrics() {
        let cfg = config();
        let rec = analyze(&dip_and_recover(), &cfg);

        assert_eq!(rec.magnitude, 40.0);
        assert!(rec.recovered);
        // onset day 7, recovery day 13
        assert_eq!(rec.duration_days, 6.0);
        assert_eq!(rec.robustness, Some(0.6));
        // decline: 40 over 2 days; recovery: 40 over 4 days
        assert_eq!(rec.decline_rate, Some(20.0));
        assert_eq!(rec.recovery_rate, Some(10.0));
        assert!(rec.extent > 0.0);
        assert_eq!(rec.raw_area, None);
    }

    #[test]
    fn test_extent_matches_shoelace_by_hand() {
        let cfg = config();
        let rec = analyze(&dip_and_recover(), &cfg);
        // vertices (0, -10), (2, -40), (6, 0) in (days, deviation)
        let area = 0.5_f64 * (0.0_f64 * (-40.0 - 0.0) + 2.0 * (0.0 + 10.0) + 6.0 * (-10.0 + 40.0)).abs();
        assert!((rec.extent - area / (100.0 * 6.0)).abs() < 1e-12);
    }

    #[test]
    fn test_unrecovered_duration_runs_to_series_end() {
        // Never returns inside the threshold band
        let cfg = config();
        let values = vec![
            100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 100.0, //
            80.0, 60.0, 60.0, 65.0, 70.0,
        ];
        let rec = analyze(&values, &cfg);
        assert!(!rec.recovered);
        // onset day 7 to last point day 11
        assert_eq!(rec.duration_days, 4.0);
        assert_eq!(rec.recovery_rate, None);
        assert!(rec.decline_rate.is_some());
    }

    #[test]
    fn test_no_disruption_yields_degenerate_record() {
        let cfg = config();
        let rec = analyze(&[100.0; 14], &cfg);
        assert_eq!(rec.magnitude, 0.0);
        assert_eq!(rec.extent, 0.0);
        assert_eq!(rec.robustness, Some(1.0));
        assert!(rec.recovered);
    }

    #[test]
    fn test_require_disruption_errors_on_flat_series() {
        let mut cfg = config();
        cfg.require_disruption = true;
        let series = MobilitySeries::new(
            "a",
            (0..14)
                .map(|i| TimePoint::new(ts(i), Some(100.0)))
                .collect(),
        );
        let cleaned = SeriesPreprocessor::prepare(&series, &cfg).unwrap();
        let window = DisruptionLocator::locate(&cleaned, &cfg);
        let err = TriangleModel::compute(&cleaned, &window, &cfg).unwrap_err();
        assert!(matches!(err, ResilienceError::UnresolvedWindow(_)));
    }

    #[test]
    fn test_robustness_clamped_when_deviation_exceeds_baseline() {
        // Values driven below zero: |deviation| > baseline, robustness
        // would be negative without the clamp.
        let cfg = config();
        let values = vec![
            100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 100.0, //
            50.0, -30.0, -30.0, 50.0, 100.0,
        ];
        let rec = analyze(&values, &cfg);
        assert_eq!(rec.magnitude, 130.0);
        assert_eq!(rec.robustness, Some(0.0));
    }

    #[test]
    fn test_window_rederivation_is_deterministic() {
        let cfg = config();
        let series = MobilitySeries::new(
            "a",
            dip_and_recover()
                .iter()
                .enumerate()
                .map(|(i, v)| TimePoint::new(ts(i as i64), Some(*v)))
                .collect(),
        );
        let cleaned = SeriesPreprocessor::prepare(&series, &cfg).unwrap();
        let first = DisruptionLocator::locate(&cleaned, &cfg);
        let rec1 = TriangleModel::compute(&cleaned, &first, &cfg).unwrap();
        let second = DisruptionLocator::locate(&cleaned, &cfg);
        let rec2 = TriangleModel::compute(&cleaned, &second, &cfg).unwrap();
        assert_eq!(first, second);
        assert_eq!(rec1, rec2);
    }
}
