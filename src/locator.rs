//! Disruption window location
//!
//! Scans a cleaned series for the onset, trough, and recovery of a single
//! disruption event. The onset must be sustained past the crossing sample, and
//! recovery must hold within the threshold band for the configured dwell, so
//! single-sample noise triggers neither.

use crate::config::AnalysisConfig;
use crate::types::{CleanedSeries, DisruptionWindow};

/// Locator identifying onset, trough, and recovery indices
pub struct DisruptionLocator;

impl DisruptionLocator {
    /// Locate the disruption window in a cleaned series.
    ///
    /// Returns an all-`None` window when deviation never crosses the onset
    /// threshold; callers treat that as "no disruption detected", not as a
    /// failure.
    pub fn locate(cleaned: &CleanedSeries, config: &AnalysisConfig) -> DisruptionWindow {
        let threshold = config.onset_threshold * cleaned.baseline.level;
        let scan_start = cleaned.first_index_after(cleaned.baseline.window.end);

        let onset = match find_onset(cleaned, scan_start, threshold) {
            Some(i) => i,
            None => return DisruptionWindow::undisrupted(),
        };

        let trough = find_trough(cleaned, onset, config.max_lookahead);
        let recovery = find_recovery(cleaned, trough, threshold, config.min_dwell);

        DisruptionWindow {
            onset_index: Some(onset),
            trough_index: Some(trough),
            recovery_index: recovery,
        }
    }
}

/// First index at or after `start` where deviation drops below `threshold`
/// and the following sample confirms it. A dip at the final sample has no
/// confirming successor and is skipped.
fn find_onset(cleaned: &CleanedSeries, start: usize, threshold: f64) -> Option<usize> {
    let points = &cleaned.points;
    for i in start..points.len() {
        if points[i].deviation < threshold {
            if i + 1 < points.len() && points[i + 1].deviation < threshold {
                return Some(i);
            }
        }
    }
    None
}

/// Index of minimum deviation from `onset` to the end of the series or the
/// lookahead horizon; ties resolve to the earliest index.
fn find_trough(cleaned: &CleanedSeries, onset: usize, max_lookahead: Option<usize>) -> usize {
    let last = cleaned.points.len() - 1;
    let horizon = match max_lookahead {
        Some(n) => last.min(onset + n),
        None => last,
    };

    let mut trough = onset;
    for i in onset..=horizon {
        if cleaned.points[i].deviation < cleaned.points[trough].deviation {
            trough = i;
        }
    }
    trough
}

/// First index after `trough` where deviation is back within `threshold` of
/// baseline and stays there for `min_dwell` consecutive samples. Running off
/// the end of the series counts as staying.
fn find_recovery(
    cleaned: &CleanedSeries,
    trough: usize,
    threshold: f64,
    min_dwell: usize,
) -> Option<usize> {
    let points = &cleaned.points;
    for i in trough + 1..points.len() {
        let dwell_end = points.len().min(i + min_dwell);
        if points[i..dwell_end].iter().all(|p| p.deviation >= threshold) {
            return Some(i);
        }
    }
    None
}
