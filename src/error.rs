//! Error types for mobility resilience analysis

use thiserror::Error;

/// Errors that can occur during analysis
#[derive(Debug, Error)]
pub enum ResilienceError {
    #[error("Invalid series: {0}")]
    InvalidSeries(String),

    #[error("Insufficient baseline data: {0}")]
    InsufficientBaselineData(String),

    #[error("Incomplete series: {0}")]
    IncompleteSeries(String),

    #[error("Unresolved disruption window: {0}")]
    UnresolvedWindow(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
