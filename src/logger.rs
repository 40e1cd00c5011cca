//! Severity logger
//!
//! Routes each call by severity:
//!
//! | call          | local line     | remote capture     | afterwards |
//! |---------------|----------------|--------------------|------------|
//! | `debug`       | debug sink     | none               | continue   |
//! | `info(f)`     | `INFO: ...`    | none               | continue   |
//! | `warn`        | `WARN: ...`    | non-blocking       | continue   |
//! | `error`       | `ERROR: ...`   | non-blocking       | exit 1     |
//! | `fatal_error` | `ERROR: ...`   | blocking           | exit 1     |

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::fmt::{self, Display};
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::config::{Config, ReporterConfig};
use crate::context::LogContext;
use crate::error::InitError;
use crate::reporter::{self, ErrorReporter, Level, Report};
use crate::sink::{Flags, LineSink, StreamSink};

pub struct SeverityLogger {
    sink: Mutex<Box<dyn LineSink>>,
    debug_sink: Mutex<Box<dyn LineSink>>,
    reporter: Box<dyn ErrorReporter>,
    default_tags: BTreeMap<String, String>,
}

impl SeverityLogger {
    /// Build a logger writing to `sink` and reporting per `config`.
    ///
    /// Fails when the reporter cannot be built from the configuration.
    pub fn new(sink: Box<dyn LineSink>, config: &ReporterConfig) -> Result<Self, InitError> {
        let reporter = reporter::configure(config)?;
        Ok(Self::with_reporter(sink, reporter, config.default_tags.clone()))
    }

    /// Build a logger around an already constructed reporter
    pub fn with_reporter(
        sink: Box<dyn LineSink>,
        reporter: Box<dyn ErrorReporter>,
        default_tags: BTreeMap<String, String>,
    ) -> Self {
        let prefix = sink.prefix();
        let debug_sink = StreamSink::new(io::stderr(), &prefix, Flags::STD | Flags::SHORT_FILE);

        Self {
            sink: Mutex::new(sink),
            debug_sink: Mutex::new(Box::new(debug_sink)),
            reporter,
            default_tags,
        }
    }

    /// Build sinks and reporter from a loaded configuration
    pub fn from_config(config: &Config) -> Result<Self, InitError> {
        let sink = config.sink.open()?;
        let debug_sink = config.debug_sink.open()?;
        Ok(Self::new(Box::new(sink), &config.reporter)?.with_debug_sink(Box::new(debug_sink)))
    }

    /// Replace the sink used by `debug`
    pub fn with_debug_sink(mut self, sink: Box<dyn LineSink>) -> Self {
        self.debug_sink = Mutex::new(sink);
        self
    }

    pub fn default_tags(&self) -> &BTreeMap<String, String> {
        &self.default_tags
    }

    // A panic inside a sink (panic family, test exit hooks) poisons the
    // lock; the sink itself is still usable.
    fn sink(&self) -> MutexGuard<'_, Box<dyn LineSink>> {
        self.sink.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn debug_sink(&self) -> MutexGuard<'_, Box<dyn LineSink>> {
        self.debug_sink.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn report(&self, err: &dyn Error, level: Level, context: Option<&LogContext>) -> Report {
        Report::new(err, level)
            .with_tags(LogContext::merged_tags(context, &self.default_tags))
            .with_user(context.and_then(|ctx| ctx.user.clone()))
    }

    /// Message, error text and pretty-printed environment to the debug sink
    #[track_caller]
    pub fn debug(&self, msg: &str, err: Option<&dyn Error>, environment: Option<&HashMap<String, String>>) {
        let e = err.map(|e| e.to_string()).unwrap_or_default();
        let formatted = environment
            .map(|env| render_environment(&env.iter().collect::<BTreeMap<_, _>>()))
            .unwrap_or_default();

        self.debug_sink().printf(format_args!("DEBUG: {}. {}\n{}\n", msg, e, formatted));
    }

    #[track_caller]
    pub fn info(&self, msg: &str) {
        self.sink().printf(format_args!("INFO: {}\n", msg));
    }

    /// `info` with format substitution; see also [`infof!`](crate::infof)
    #[track_caller]
    pub fn infof(&self, args: fmt::Arguments<'_>) {
        self.sink().printf(format_args!("INFO: {}\n", args));
    }

    /// Log and report without terminating
    #[track_caller]
    pub fn warn(&self, err: &dyn Error, context: Option<&LogContext>) {
        self.reporter.capture(self.report(err, Level::Warning, context));
        self.sink().printf(format_args!("WARN: {}\n", err));
    }

    /// Report without waiting, log, then terminate
    #[track_caller]
    pub fn error(&self, err: &dyn Error, context: Option<&LogContext>) -> ! {
        self.reporter.capture(self.report(err, Level::Error, context));
        self.sink().fatalf(format_args!("ERROR: {}\n", err))
    }

    /// Report and wait for delivery, log, then terminate
    #[track_caller]
    pub fn fatal_error(&self, err: &dyn Error, context: Option<&LogContext>) -> ! {
        let delivery = self.reporter.capture_and_wait(self.report(err, Level::Fatal, context));
        log::debug!("Fatal report delivery: {:?}", delivery);
        self.sink().fatalf(format_args!("ERROR: {}\n", err))
    }

    #[track_caller]
    pub fn fatal(&self, values: &[&dyn Display]) -> ! {
        self.sink().fatal(values)
    }

    #[track_caller]
    pub fn fatalf(&self, args: fmt::Arguments<'_>) -> ! {
        self.sink().fatalf(args)
    }

    #[track_caller]
    pub fn fatalln(&self, values: &[&dyn Display]) -> ! {
        self.sink().fatalln(values)
    }

    #[track_caller]
    pub fn panic(&self, values: &[&dyn Display]) -> ! {
        self.sink().panic(values)
    }

    #[track_caller]
    pub fn panicf(&self, args: fmt::Arguments<'_>) -> ! {
        self.sink().panicf(args)
    }

    #[track_caller]
    pub fn panicln(&self, values: &[&dyn Display]) -> ! {
        self.sink().panicln(values)
    }

    #[track_caller]
    pub fn print(&self, values: &[&dyn Display]) {
        self.sink().print(values)
    }

    #[track_caller]
    pub fn printf(&self, args: fmt::Arguments<'_>) {
        self.sink().printf(args)
    }

    #[track_caller]
    pub fn println(&self, values: &[&dyn Display]) {
        self.sink().println(values)
    }

    #[track_caller]
    pub fn output(&self, line: &str) -> io::Result<()> {
        self.sink().output(line)
    }

    pub fn flags(&self) -> Flags {
        self.sink().flags()
    }

    pub fn set_flags(&self, flags: Flags) {
        self.sink().set_flags(flags)
    }

    pub fn prefix(&self) -> String {
        self.sink().prefix()
    }

    pub fn set_prefix(&self, prefix: &str) {
        self.sink().set_prefix(prefix)
    }

    pub fn set_output(&self, out: Box<dyn Write + Send>) {
        self.sink().set_output(out)
    }
}

/// Four-space indented JSON, or the `Debug` form if that fails
pub(crate) fn render_environment<T: Serialize + fmt::Debug + ?Sized>(env: &T) -> String {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);

    match env.serialize(&mut ser) {
        Ok(()) => String::from_utf8(buf).unwrap_or_else(|_| format!("{:?}", env)),
        Err(e) => {
            log::debug!("Falling back to debug formatting for environment: {}", e);
            format!("{:?}", env)
        }
    }
}

/// `logger.infof(format_args!(...))` shorthand
#[macro_export]
macro_rules! infof {
    ($logger:expr, $($arg:tt)+) => {
        $logger.infof(format_args!($($arg)+))
    };
}
