//! Batch processing
//!
//! Repeated invocation of the per-area analysis with no shared state across
//! areas. A failing area is recorded and skipped; it never aborts the run,
//! and nothing is retried (the computation is deterministic, a retry would
//! reproduce the failure). Results export as NDJSON or a flat table with a
//! fixed column order, one row per area × model.

use std::io::{self, Write};

use serde::Serialize;
use uuid::Uuid;

use crate::config::AnalysisConfig;
use crate::pipeline;
use crate::source::RawAreaRecord;
use crate::types::{MetricsRecord, MobilitySeries};

/// Column order contract for the tabular export
pub const TABLE_COLUMNS: [&str; 10] = [
    "area_id",
    "model",
    "magnitude",
    "duration_days",
    "decline_rate",
    "recovery_rate",
    "robustness",
    "extent",
    "raw_area",
    "recovered",
];

/// A per-area failure captured during a batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AreaFailure {
    pub area_id: String,
    pub error: String,
}

/// Outcome of a batch run: partial results plus the failures that produced
/// no records
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    /// Identifier for this run, carried into exports for provenance
    pub run_id: Uuid,
    pub records: Vec<MetricsRecord>,
    pub failures: Vec<AreaFailure>,
}

impl BatchOutcome {
    pub fn areas_processed(&self) -> usize {
        self.records.len() / 2 // two records per successful area
    }
}

/// Runner iterating the per-area analysis over many areas
pub struct BatchRunner {
    config: AnalysisConfig,
}

impl BatchRunner {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Analyze every series with the runner's config.
    pub fn run(&self, areas: &[MobilitySeries]) -> BatchOutcome {
        let mut records = Vec::new();
        let mut failures = Vec::new();

        for series in areas {
            match pipeline::analyze_area(series, &self.config) {
                Ok(analysis) => records.extend(analysis.records),
                Err(e) => failures.push(AreaFailure {
                    area_id: series.area_id.clone(),
                    error: e.to_string(),
                }),
            }
        }

        BatchOutcome {
            run_id: Uuid::new_v4(),
            records,
            failures,
        }
    }

    /// Analyze raw input records, honoring per-record baseline overrides.
    pub fn run_records(&self, areas: Vec<RawAreaRecord>) -> BatchOutcome {
        let mut records = Vec::new();
        let mut failures = Vec::new();

        for record in areas {
            let config = record.area_config(&self.config);
            let series = record.into_series();
            match pipeline::analyze_area(&series, &config) {
                Ok(analysis) => records.extend(analysis.records),
                Err(e) => failures.push(AreaFailure {
                    area_id: series.area_id.clone(),
                    error: e.to_string(),
                }),
            }
        }

        BatchOutcome {
            run_id: Uuid::new_v4(),
            records,
            failures,
        }
    }
}

/// Write records as a comma-separated table, header first, columns in
/// [`TABLE_COLUMNS`] order. Undefined optional metrics render as empty cells.
pub fn write_table<W: Write>(records: &[MetricsRecord], out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", TABLE_COLUMNS.join(","))?;
    for r in records {
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{}",
            r.area_id,
            r.model.as_str(),
            r.magnitude,
            r.duration_days,
            opt_cell(r.decline_rate),
            opt_cell(r.recovery_rate),
            opt_cell(r.robustness),
            r.extent,
            opt_cell(r.raw_area),
            r.recovered,
        )?;
    }
    Ok(())
}

/// Write records as NDJSON, one record per line.
pub fn write_ndjson<W: Write>(records: &[MetricsRecord], out: &mut W) -> io::Result<()> {
    for r in records {
        let line = serde_json::to_string(r)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

fn opt_cell(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimeRange;
    use crate::source::parse_ndjson;
    use crate::types::TimePoint;
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(day: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 9, 1, 0, 0, 0).unwrap() + chrono::Duration::days(day)
    }

    fn daily_series(area: &str, values: &[Option<f64>]) -> MobilitySeries {
        MobilitySeries::new(
            area,
            values
                .iter()
                .enumerate()
                .map(|(i, v)| TimePoint::new(ts(i as i64), *v))
                .collect(),
        )
    }

    fn good_values() -> Vec<Option<f64>> {
        [
            100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 100.0, //
            90.0, 75.0, 60.0, 60.0, 80.0, 90.0, 100.0,
        ]
        .iter()
        .map(|v| Some(*v))
        .collect()
    }

    fn config() -> AnalysisConfig {
        AnalysisConfig::new(TimeRange::new(ts(0), ts(6)))
    }

    #[test]
    fn test_partial_failure_does_not_abort_run() {
        let good = daily_series("good", &good_values());
        // Baseline window entirely missing: InsufficientBaselineData
        let bad = daily_series("bad", &[None, None, None, None, None, None, None, Some(50.0)]);
        let also_good = daily_series("good2", &good_values());

        let outcome = BatchRunner::new(config()).run(&[good, bad, also_good]);
        assert_eq!(outcome.records.len(), 4);
        assert_eq!(outcome.areas_processed(), 2);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].area_id, "bad");
        assert!(outcome.failures[0].error.contains("baseline"));
    }

    #[test]
    fn test_run_records_applies_per_area_bounds() {
        let line = r#"{"area_id":"x","baseline_start":"2019-09-01T00:00:00Z","baseline_end":"2019-09-07T00:00:00Z","points":[]}"#;
        let mut records = parse_ndjson(line).unwrap();
        records[0].points = daily_series("x", &good_values()).points;

        // Base config with a useless window; the record's bounds rescue it.
        let base = AnalysisConfig::new(TimeRange::new(ts(100), ts(107)));
        let outcome = BatchRunner::new(base).run_records(records);
        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.records.len(), 2);
    }

    #[test]
    fn test_table_header_and_rows() {
        let outcome = BatchRunner::new(config()).run(&[daily_series("a", &good_values())]);
        let mut buf = Vec::new();
        write_table(&outcome.records, &mut buf).unwrap();
        let table = String::from_utf8(buf).unwrap();

        let mut lines = table.lines();
        assert_eq!(lines.next().unwrap(), TABLE_COLUMNS.join(","));

        let triangle_row = lines.next().unwrap();
        assert!(triangle_row.starts_with("a,triangle,40,6,"));
        let auc_row = lines.next().unwrap();
        assert!(auc_row.starts_with("a,auc,40,6,,,"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_undefined_optionals_are_empty_cells() {
        // Unrecovered series: recovery_rate must be an empty cell, not 0
        let values: Vec<Option<f64>> = [
            100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 80.0, 60.0, 60.0,
        ]
        .iter()
        .map(|v| Some(*v))
        .collect();
        let outcome = BatchRunner::new(config()).run(&[daily_series("a", &values)]);
        let mut buf = Vec::new();
        write_table(&outcome.records, &mut buf).unwrap();
        let table = String::from_utf8(buf).unwrap();

        let triangle_row = table.lines().nth(1).unwrap();
        let cells: Vec<&str> = triangle_row.split(',').collect();
        assert_eq!(cells.len(), TABLE_COLUMNS.len());
        assert_eq!(cells[5], ""); // recovery_rate
        assert_eq!(cells[9], "false");
    }

    #[test]
    fn test_ndjson_round_trips() {
        let outcome = BatchRunner::new(config()).run(&[daily_series("a", &good_values())]);
        let mut buf = Vec::new();
        write_ndjson(&outcome.records, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 2);
        let parsed: MetricsRecord = serde_json::from_str(text.lines().next().unwrap()).unwrap();
        assert_eq!(parsed, outcome.records[0]);
    }
}
