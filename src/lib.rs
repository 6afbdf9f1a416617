//! Mobility Resilience - recovery metrics for post-disaster mobility series
//!
//! Turns a raw mobility time series plus a pre-disruption baseline into a
//! small set of recovery descriptors through a deterministic pipeline:
//! preprocessing → disruption location → {Resilience Triangle, AUC} metrics.
//!
//! ## Modules
//!
//! - **Preprocess**: baseline estimation, gap filling, deviation computation
//! - **Locator**: onset/trough/recovery detection in the cleaned signal
//! - **Triangle / AUC**: the two independent resilience models
//! - **Batch / Source / Render**: thin collaborators around the core

pub mod auc;
pub mod batch;
pub mod config;
pub mod error;
pub mod locator;
pub mod pipeline;
pub mod preprocess;
pub mod render;
pub mod source;
pub mod triangle;
pub mod types;

pub use auc::AucModel;
pub use batch::{BatchOutcome, BatchRunner};
pub use config::{AnalysisConfig, GapPolicy, TimeRange};
pub use error::ResilienceError;
pub use locator::DisruptionLocator;
pub use pipeline::{analyze_area, auc_metrics, triangle_metrics, AreaAnalysis};
pub use preprocess::SeriesPreprocessor;
pub use render::{PlotEncoder, PlotPayload};
pub use triangle::TriangleModel;
pub use types::{
    CleanedSeries, DisruptionWindow, MetricsRecord, MobilitySeries, ModelName, TimePoint,
};

/// Crate version embedded in exported payloads
pub const CRATE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for exported payloads
pub const PRODUCER_NAME: &str = "mobility-resilience";
