//! Per-area analysis orchestration
//!
//! Public entry points tying the stages together: preprocess once, locate
//! once, then run both models over the shared cleaned series. Everything here
//! is a pure function of (series, config); batch iteration lives in
//! [`crate::batch`].

use crate::auc::AucModel;
use crate::config::AnalysisConfig;
use crate::error::ResilienceError;
use crate::locator::DisruptionLocator;
use crate::preprocess::SeriesPreprocessor;
use crate::triangle::TriangleModel;
use crate::types::{CleanedSeries, DisruptionWindow, MetricsRecord, MobilitySeries};

/// Full per-area analysis: the cleaned curve, the located window, and one
/// record per model. This is the bundle the renderer consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaAnalysis {
    pub cleaned: CleanedSeries,
    pub window: DisruptionWindow,
    pub records: Vec<MetricsRecord>,
}

/// Run both models over one area's series.
pub fn analyze_area(
    series: &MobilitySeries,
    config: &AnalysisConfig,
) -> Result<AreaAnalysis, ResilienceError> {
    let cleaned = SeriesPreprocessor::prepare(series, config)?;
    let window = DisruptionLocator::locate(&cleaned, config);

    let triangle = TriangleModel::compute(&cleaned, &window, config)?;
    let auc = AucModel::compute(&cleaned, config)?;

    Ok(AreaAnalysis {
        cleaned,
        window,
        records: vec![triangle, auc],
    })
}

/// Triangle metrics for one area, as a pure (series, config) → record call.
pub fn triangle_metrics(
    series: &MobilitySeries,
    config: &AnalysisConfig,
) -> Result<MetricsRecord, ResilienceError> {
    let cleaned = SeriesPreprocessor::prepare(series, config)?;
    let window = DisruptionLocator::locate(&cleaned, config);
    TriangleModel::compute(&cleaned, &window, config)
}

/// AUC metrics for one area, as a pure (series, config) → record call.
pub fn auc_metrics(
    series: &MobilitySeries,
    config: &AnalysisConfig,
) -> Result<MetricsRecord, ResilienceError> {
    let cleaned = SeriesPreprocessor::prepare(series, config)?;
    AucModel::compute(&cleaned, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimeRange;
    use crate::types::{ModelName, TimePoint};
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(day: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 9, 1, 0, 0, 0).unwrap() + chrono::Duration::days(day)
    }

    fn series() -> MobilitySeries {
        let values = [
            100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 100.0, //
            90.0, 75.0, 60.0, 60.0, 80.0, 90.0, 100.0,
        ];
        MobilitySeries::new(
            "483610223005",
            values
                .iter()
                .enumerate()
                .map(|(i, v)| TimePoint::new(ts(i as i64), Some(*v)))
                .collect(),
        )
    }

    fn config() -> AnalysisConfig {
        AnalysisConfig::new(TimeRange::new(ts(0), ts(6)))
    }

    #[test]
    fn test_analyze_area_produces_both_records() {
        let analysis = analyze_area(&series(), &config()).unwrap();
        assert_eq!(analysis.records.len(), 2);
        assert_eq!(analysis.records[0].model, ModelName::Triangle);
        assert_eq!(analysis.records[1].model, ModelName::Auc);
        assert!(analysis.window.is_disrupted());
        assert_eq!(analysis.records[0].area_id, "483610223005");
    }

    #[test]
    fn test_entry_points_agree_with_analyze_area() {
        let cfg = config();
        let analysis = analyze_area(&series(), &cfg).unwrap();
        assert_eq!(triangle_metrics(&series(), &cfg).unwrap(), analysis.records[0]);
        assert_eq!(auc_metrics(&series(), &cfg).unwrap(), analysis.records[1]);
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let cfg = config();
        let first = analyze_area(&series(), &cfg).unwrap();
        let second = analyze_area(&series(), &cfg).unwrap();
        assert_eq!(first, second);
    }
}
