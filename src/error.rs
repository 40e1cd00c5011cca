//! Error types
//!
//! `InitError` is the only error a logger caller ever sees. `ReportError`
//! stays inside the reporters and is only logged.

use sentry::types::ParseDsnError;
use thiserror::Error;

/// Failure to construct a logger
#[derive(Debug, Error)]
pub enum InitError {
    #[error("invalid DSN: {0}")]
    InvalidDsn(#[from] ParseDsnError),

    #[error("failed to open sink file {path}: {source}")]
    SinkOpen {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failure reported by an ambient-context client for a single capture
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report rejected: {0}")]
    Rejected(String),

    #[error("reporter unavailable: {0}")]
    Unavailable(String),
}
