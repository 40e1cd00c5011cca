//! Remote error reporting
//!
//! Reports carry their own context (merged tags and optional user), so a
//! reporter never holds per-call state and nothing can leak from one capture
//! into the next. Backends that only understand ambient context are wrapped
//! in [`Bracketed`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::Arc;

use crate::config::ReporterConfig;
use crate::context::User;
use crate::error::InitError;

pub mod ambient;
pub mod client;

pub use ambient::{AmbientReporter, Bracketed};
pub use client::{SentryReporter, parse_dsn, redact_dsn};

/// Report severity, as understood by the remote service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Warning,
    Error,
    Fatal,
}

/// Outcome of a blocking capture. Callers treat both the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    GaveUp,
}

/// One error capture with the context that belongs to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub level: Level,
    /// Display text of the captured error
    pub message: String,
    /// Display text of each error in the source chain, outermost first
    pub chain: Vec<String>,
    pub tags: BTreeMap<String, String>,
    pub user: Option<User>,
}

impl Report {
    pub fn new(err: &dyn Error, level: Level) -> Self {
        let mut chain = vec![err.to_string()];
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }

        Self {
            level,
            message: err.to_string(),
            chain,
            tags: BTreeMap::new(),
            user: None,
        }
    }

    pub fn with_tags(mut self, tags: BTreeMap<String, String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_user(mut self, user: Option<User>) -> Self {
        self.user = user;
        self
    }
}

/// Sink for error reports
pub trait ErrorReporter: Send + Sync {
    /// Hand the report off and return immediately
    fn capture(&self, report: Report);

    /// Return only once the report was sent or delivery was abandoned
    fn capture_and_wait(&self, report: Report) -> Delivery;
}

impl<T: ErrorReporter + ?Sized> ErrorReporter for Arc<T> {
    fn capture(&self, report: Report) {
        (**self).capture(report)
    }

    fn capture_and_wait(&self, report: Report) -> Delivery {
        (**self).capture_and_wait(report)
    }
}

impl<T: ErrorReporter + ?Sized> ErrorReporter for Box<T> {
    fn capture(&self, report: Report) {
        (**self).capture(report)
    }

    fn capture_and_wait(&self, report: Report) -> Delivery {
        (**self).capture_and_wait(report)
    }
}

/// Reporter used when no DSN is configured; drops everything
#[derive(Debug, Default)]
pub struct DisabledReporter;

impl ErrorReporter for DisabledReporter {
    fn capture(&self, report: Report) {
        log::debug!("Reporting disabled, dropping {:?} report: {}", report.level, report.message);
    }

    fn capture_and_wait(&self, report: Report) -> Delivery {
        self.capture(report);
        Delivery::Sent
    }
}

/// Build the reporter described by `config`.
///
/// An empty DSN disables reporting; a malformed one is an error.
pub fn configure(config: &ReporterConfig) -> Result<Box<dyn ErrorReporter>, InitError> {
    if config.dsn.trim().is_empty() {
        log::info!("No DSN configured, remote reporting disabled");
        return Ok(Box::new(DisabledReporter));
    }

    let reporter = SentryReporter::new(config)?;
    log::info!("Reporting to {}", redact_dsn(&config.dsn)?);
    Ok(Box::new(reporter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Wrapped {
        inner: std::io::Error,
    }

    impl fmt::Display for Wrapped {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "failed to flush ledger")
        }
    }

    impl Error for Wrapped {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.inner)
        }
    }

    #[test]
    fn test_report_collects_source_chain() {
        let err = Wrapped {
            inner: std::io::Error::other("disk full"),
        };
        let report = Report::new(&err, Level::Error);
        assert_eq!(report.message, "failed to flush ledger");
        assert_eq!(report.chain, vec!["failed to flush ledger", "disk full"]);
        assert!(report.tags.is_empty());
        assert!(report.user.is_none());
    }

    #[test]
    fn test_level_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Level::Warning).unwrap(), "\"warning\"");
        assert_eq!(serde_json::to_string(&Level::Fatal).unwrap(), "\"fatal\"");
    }

    #[test]
    fn test_configure_empty_dsn_is_disabled() {
        let config = ReporterConfig::default();
        let reporter = configure(&config).unwrap();
        let report = Report::new(&std::io::Error::other("x"), Level::Fatal);
        assert_eq!(reporter.capture_and_wait(report), Delivery::Sent);
    }

    #[test]
    fn test_configure_invalid_dsn_fails() {
        let config = ReporterConfig {
            dsn: "not a url".to_string(),
            ..ReporterConfig::default()
        };
        assert!(configure(&config).is_err());
    }
}
