//! Resil CLI - command-line interface for mobility resilience analysis
//!
//! Commands:
//! - analyze: Analyze areas and emit plot-ready payloads
//! - batch: Analyze areas and emit a metrics table (one row per area × model)
//! - schema: Print input record schema

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{DateTime, Utc};
use mobility_resilience::batch::{write_ndjson, write_table, BatchRunner};
use mobility_resilience::source::{parse_json_array, parse_ndjson, RawAreaRecord};
use mobility_resilience::{
    analyze_area, AnalysisConfig, GapPolicy, PlotEncoder, ResilienceError, TimeRange,
    CRATE_VERSION,
};

/// Resil - resilience metrics for post-disaster mobility recovery
#[derive(Parser)]
#[command(name = "resil")]
#[command(version = CRATE_VERSION)]
#[command(about = "Compute mobility recovery metrics from area time series", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze areas and emit plot-ready payloads
    Analyze {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Analyze areas and emit a metrics table
    Batch {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "table")]
        output_format: BatchFormat,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Print input record schema
    Schema,
}

/// Configuration surface shared by analyze and batch
#[derive(Args)]
struct ConfigArgs {
    /// Baseline window start (RFC 3339); per-record bounds override this
    #[arg(long)]
    baseline_start: DateTime<Utc>,

    /// Baseline window end (RFC 3339)
    #[arg(long)]
    baseline_end: DateTime<Utc>,

    /// Gap-filling policy for missing samples
    #[arg(long, default_value = "interpolate")]
    gap_policy: GapPolicyArg,

    /// Onset threshold as a negative fraction of baseline
    #[arg(long, default_value = "-0.05", allow_hyphen_values = true)]
    onset_threshold: f64,

    /// Samples the signal must stay within threshold to confirm recovery
    #[arg(long, default_value = "1")]
    min_dwell: usize,

    /// Samples after onset searched for the trough
    #[arg(long)]
    max_lookahead: Option<usize>,

    /// Minimum non-missing samples in the baseline window
    #[arg(long, default_value = "3")]
    min_baseline_points: usize,

    /// Fixed AUC integration window start (RFC 3339)
    #[arg(long)]
    auc_start: Option<DateTime<Utc>>,

    /// Fixed AUC integration window end (RFC 3339)
    #[arg(long)]
    auc_end: Option<DateTime<Utc>>,

    /// Treat a series with no detected disruption as an error
    #[arg(long)]
    require_disruption: bool,
}

impl ConfigArgs {
    fn to_config(&self) -> Result<AnalysisConfig, ResilCliError> {
        let mut config =
            AnalysisConfig::new(TimeRange::new(self.baseline_start, self.baseline_end));
        config.gap_policy = self.gap_policy.into();
        config.onset_threshold = self.onset_threshold;
        config.min_dwell = self.min_dwell;
        config.max_lookahead = self.max_lookahead;
        config.min_baseline_points = self.min_baseline_points;
        config.fixed_auc_window = match (self.auc_start, self.auc_end) {
            (Some(start), Some(end)) => Some(TimeRange::new(start, end)),
            (None, None) => None,
            _ => {
                return Err(ResilCliError::BadArgs(
                    "both --auc-start and --auc-end are required for a fixed AUC window"
                        .to_string(),
                ))
            }
        };
        config.require_disruption = self.require_disruption;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one area record per line)
    Ndjson,
    /// JSON array of area records
    Json,
}

#[derive(Clone, ValueEnum)]
enum BatchFormat {
    /// Comma-separated table, header first
    Table,
    /// Newline-delimited JSON (one metrics record per line)
    Ndjson,
}

#[derive(Clone, Copy, ValueEnum)]
enum GapPolicyArg {
    Interpolate,
    Drop,
    Fail,
}

impl From<GapPolicyArg> for GapPolicy {
    fn from(arg: GapPolicyArg) -> Self {
        match arg {
            GapPolicyArg::Interpolate => GapPolicy::Interpolate,
            GapPolicyArg::Drop => GapPolicy::Drop,
            GapPolicyArg::Fail => GapPolicy::Fail,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("resil: {}", e.message());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), ResilCliError> {
    match cli.command {
        Commands::Analyze {
            input,
            output,
            input_format,
            config,
        } => cmd_analyze(&input, &output, input_format, &config),

        Commands::Batch {
            input,
            output,
            input_format,
            output_format,
            config,
        } => cmd_batch(&input, &output, input_format, output_format, &config),

        Commands::Schema => cmd_schema(),
    }
}

fn cmd_analyze(
    input: &PathBuf,
    output: &PathBuf,
    input_format: InputFormat,
    args: &ConfigArgs,
) -> Result<(), ResilCliError> {
    let config = args.to_config()?;
    let records = read_records(input, input_format)?;

    let encoder = PlotEncoder::new();
    let mut payloads = Vec::new();
    for record in records {
        let area_config = record.area_config(&config);
        let series = record.into_series();
        let analysis = analyze_area(&series, &area_config)?;
        payloads.push(encoder.encode_to_json(&analysis)?);
    }

    write_output(output, &(payloads.join("\n") + "\n"))
}

fn cmd_batch(
    input: &PathBuf,
    output: &PathBuf,
    input_format: InputFormat,
    output_format: BatchFormat,
    args: &ConfigArgs,
) -> Result<(), ResilCliError> {
    let config = args.to_config()?;
    let records = read_records(input, input_format)?;
    let total = records.len();

    let outcome = BatchRunner::new(config).run_records(records);

    for failure in &outcome.failures {
        eprintln!("resil: area {} skipped: {}", failure.area_id, failure.error);
    }
    eprintln!(
        "resil: run {}: {} of {} area(s) processed, {} failed",
        outcome.run_id,
        outcome.areas_processed(),
        total,
        outcome.failures.len()
    );

    let mut buf = Vec::new();
    match output_format {
        BatchFormat::Table => write_table(&outcome.records, &mut buf)?,
        BatchFormat::Ndjson => write_ndjson(&outcome.records, &mut buf)?,
    }
    write_output(output, &String::from_utf8_lossy(&buf))
}

fn cmd_schema() -> Result<(), ResilCliError> {
    println!("Input record schema (one per area):");
    println!();
    println!("  {{");
    println!("    \"area_id\": \"483610223005\",");
    println!("    \"baseline_start\": \"2019-09-02T00:00:00Z\",   (optional override)");
    println!("    \"baseline_end\":   \"2019-09-16T00:00:00Z\",   (optional override)");
    println!("    \"points\": [");
    println!("      {{\"t\": \"2019-09-02T00:00:00Z\", \"v\": 120.0}},");
    println!("      {{\"t\": \"2019-09-03T00:00:00Z\", \"v\": null}}   (missing sample)");
    println!("    ]");
    println!("  }}");
    println!();
    println!("Timestamps must be strictly increasing. Records are NDJSON (one per");
    println!("line) or a JSON array with --input-format json.");
    Ok(())
}

fn read_records(
    input: &PathBuf,
    format: InputFormat,
) -> Result<Vec<RawAreaRecord>, ResilCliError> {
    let data = if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            return Err(ResilCliError::BadArgs(
                "stdin is a TTY; pipe records in or pass --input <file>".to_string(),
            ));
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let records = match format {
        InputFormat::Ndjson => parse_ndjson(&data)?,
        InputFormat::Json => parse_json_array(&data)?,
    };

    if records.is_empty() {
        return Err(ResilCliError::NoRecords);
    }
    Ok(records)
}

fn write_output(output: &PathBuf, data: &str) -> Result<(), ResilCliError> {
    if output.to_string_lossy() == "-" {
        io::stdout().write_all(data.as_bytes())?;
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

// Error types

#[derive(Debug)]
enum ResilCliError {
    Io(io::Error),
    Analysis(ResilienceError),
    BadArgs(String),
    NoRecords,
}

impl ResilCliError {
    fn message(&self) -> String {
        match self {
            ResilCliError::Io(e) => format!("io error: {}", e),
            ResilCliError::Analysis(e) => e.to_string(),
            ResilCliError::BadArgs(msg) => msg.clone(),
            ResilCliError::NoRecords => "no area records found in input".to_string(),
        }
    }
}

impl From<io::Error> for ResilCliError {
    fn from(e: io::Error) -> Self {
        ResilCliError::Io(e)
    }
}

impl From<ResilienceError> for ResilCliError {
    fn from(e: ResilienceError) -> Self {
        ResilCliError::Analysis(e)
    }
}
