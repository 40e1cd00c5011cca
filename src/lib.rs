//! Severity logging facade with remote error reporting
//!
//! [`SeverityLogger`] writes human-readable lines to a local [`LineSink`]
//! and forwards WARN/ERROR/FATAL errors, with optional per-call
//! [`LogContext`], to an [`ErrorReporter`]. `error` and `fatal_error`
//! terminate the process after writing; `fatal_error` first waits for the
//! report to be delivered.
//!
//! ```no_run
//! use sevlog::{LogContext, SeverityLogger, StreamSink, User};
//! use sevlog::config::ReporterConfig;
//!
//! let config = ReporterConfig {
//!     dsn: "https://public@errors.example.com/42".to_string(),
//!     ..ReporterConfig::default()
//! };
//! let logger = SeverityLogger::new(Box::new(StreamSink::stderr()), &config)?;
//!
//! sevlog::infof!(logger, "listening on {}", 8080);
//!
//! let ctx = LogContext::new()
//!     .with_user(User::default().with_id("42"))
//!     .with_tag("job", "nightly");
//! logger.warn(&std::io::Error::other("slow disk"), Some(&ctx));
//! # Ok::<(), sevlog::InitError>(())
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod logger;
pub mod reporter;
pub mod sink;

pub use context::{LogContext, User};
pub use error::{InitError, ReportError};
pub use logger::SeverityLogger;
pub use reporter::{Delivery, ErrorReporter, Level, Report};
pub use sink::{Flags, LineSink, SharedBuffer, StreamSink};
