//! Series preprocessing
//!
//! Aligns a raw mobility series against its pre-disruption baseline and fills
//! gaps according to the configured policy, producing the cleaned,
//! deviation-annotated signal both models consume. Pure transformation:
//! identical input and config yield a bit-identical [`CleanedSeries`].

use crate::config::{AnalysisConfig, GapPolicy};
use crate::error::ResilienceError;
use crate::types::{Baseline, CleanedPoint, CleanedSeries, MobilitySeries};

/// Preprocessor turning raw series into cleaned, baseline-relative signals
pub struct SeriesPreprocessor;

impl SeriesPreprocessor {
    /// Clean a raw series: validate ordering, estimate the baseline, fill
    /// gaps, and compute per-point deviations.
    pub fn prepare(
        series: &MobilitySeries,
        config: &AnalysisConfig,
    ) -> Result<CleanedSeries, ResilienceError> {
        config.validate()?;
        validate_ordering(series)?;

        let baseline = estimate_baseline(series, config)?;
        let filled = fill_gaps(series, config)?;

        let points = filled
            .into_iter()
            .map(|(timestamp, value, interpolated)| CleanedPoint {
                timestamp,
                value,
                deviation: value - baseline.level,
                interpolated,
            })
            .collect();

        Ok(CleanedSeries {
            area_id: series.area_id.clone(),
            baseline,
            points,
        })
    }
}

fn validate_ordering(series: &MobilitySeries) -> Result<(), ResilienceError> {
    if series.points.len() < 2 {
        return Err(ResilienceError::InvalidSeries(format!(
            "area {}: series has {} point(s), need at least 2",
            series.area_id,
            series.points.len()
        )));
    }
    for pair in series.points.windows(2) {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(ResilienceError::InvalidSeries(format!(
                "area {}: timestamps not strictly increasing at {}",
                series.area_id, pair[1].timestamp
            )));
        }
    }
    Ok(())
}

fn estimate_baseline(
    series: &MobilitySeries,
    config: &AnalysisConfig,
) -> Result<Baseline, ResilienceError> {
    let window = config.baseline_window;
    let values: Vec<f64> = series
        .points
        .iter()
        .filter(|p| window.contains(p.timestamp))
        .filter_map(|p| p.value)
        .collect();

    if values.len() < config.min_baseline_points {
        return Err(ResilienceError::InsufficientBaselineData(format!(
            "area {}: {} non-missing point(s) in baseline window, need {}",
            series.area_id,
            values.len(),
            config.min_baseline_points
        )));
    }

    let level = values.iter().sum::<f64>() / values.len() as f64;
    if level <= 0.0 {
        // Thresholds are fractions of the baseline; a non-positive level has
        // no meaningful deviation band.
        return Err(ResilienceError::InsufficientBaselineData(format!(
            "area {}: baseline level {} is not positive",
            series.area_id, level
        )));
    }

    Ok(Baseline {
        level,
        window,
        samples: values.len(),
    })
}

type FilledPoint = (chrono::DateTime<chrono::Utc>, f64, bool);

fn fill_gaps(
    series: &MobilitySeries,
    config: &AnalysisConfig,
) -> Result<Vec<FilledPoint>, ResilienceError> {
    match config.gap_policy {
        GapPolicy::Fail => series
            .points
            .iter()
            .map(|p| match p.value {
                Some(v) => Ok((p.timestamp, v, false)),
                None => Err(ResilienceError::IncompleteSeries(format!(
                    "area {}: missing sample at {}",
                    series.area_id, p.timestamp
                ))),
            })
            .collect(),
        GapPolicy::Drop => Ok(series
            .points
            .iter()
            .filter_map(|p| p.value.map(|v| (p.timestamp, v, false)))
            .collect()),
        GapPolicy::Interpolate => interpolate_gaps(series),
    }
}

/// Linear fill in time between nearest non-missing neighbors; gaps at either
/// edge hold the nearest observed value.
fn interpolate_gaps(series: &MobilitySeries) -> Result<Vec<FilledPoint>, ResilienceError> {
    let observed: Vec<(usize, f64)> = series
        .points
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.value.map(|v| (i, v)))
        .collect();

    if observed.is_empty() {
        return Err(ResilienceError::IncompleteSeries(format!(
            "area {}: series has no observed samples",
            series.area_id
        )));
    }

    let mut filled = Vec::with_capacity(series.points.len());
    for (i, p) in series.points.iter().enumerate() {
        if let Some(v) = p.value {
            filled.push((p.timestamp, v, false));
            continue;
        }

        let prev = observed.iter().rev().find(|(j, _)| *j < i);
        let next = observed.iter().find(|(j, _)| *j > i);
        let value = match (prev, next) {
            (Some(&(pj, pv)), Some(&(nj, nv))) => {
                let t0 = series.points[pj].timestamp;
                let t1 = series.points[nj].timestamp;
                let span = (t1 - t0).num_seconds() as f64;
                let offset = (p.timestamp - t0).num_seconds() as f64;
                pv + (nv - pv) * offset / span
            }
            (Some(&(_, pv)), None) => pv,
            (None, Some(&(_, nv))) => nv,
            (None, None) => unreachable!("observed is non-empty"),
        };
        filled.push((p.timestamp, value, true));
    }

    Ok(filled)
}
