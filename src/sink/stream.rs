//! Writer-backed sink with Go-style line headers

use chrono::{Local, NaiveDateTime, Utc};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::panic::Location;
use std::path::Path;

use super::{Flags, LineSink};
use crate::error::InitError;

/// Sink writing `prefix + header + message + '\n'` to any writer
pub struct StreamSink {
    out: Box<dyn Write + Send>,
    prefix: String,
    flags: Flags,
    exit: fn(i32) -> !,
}

impl StreamSink {
    pub fn new(out: impl Write + Send + 'static, prefix: &str, flags: Flags) -> Self {
        Self {
            out: Box::new(out),
            prefix: prefix.to_string(),
            flags,
            exit: std::process::exit,
        }
    }

    pub fn stderr() -> Self {
        Self::new(io::stderr(), "", Flags::STD)
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout(), "", Flags::STD)
    }

    /// Open `path` for appending, creating it if needed
    pub fn file<P: AsRef<Path>>(path: P, prefix: &str, flags: Flags) -> Result<Self, InitError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| InitError::SinkOpen {
                path: path.display().to_string(),
                source,
            })?;
        Ok(Self::new(file, prefix, flags))
    }

    /// Replace the process exit hook used by the fatal path
    pub fn with_exit(mut self, exit: fn(i32) -> !) -> Self {
        self.exit = exit;
        self
    }

    /// Render one entry exactly as it will be written
    pub fn format_line(&self, line: &str, location: &Location<'_>) -> String {
        let now = Utc::now();
        let stamp = if self.flags.contains(Flags::UTC) {
            now.naive_utc()
        } else {
            now.with_timezone(&Local).naive_local()
        };
        self.format_line_at(line, stamp, location)
    }

    fn format_line_at(&self, line: &str, stamp: NaiveDateTime, location: &Location<'_>) -> String {
        let mut buf = String::with_capacity(self.prefix.len() + line.len() + 32);

        if !self.flags.contains(Flags::MSG_PREFIX) {
            buf.push_str(&self.prefix);
        }

        if self.flags.contains(Flags::DATE) {
            buf.push_str(&stamp.format("%Y/%m/%d ").to_string());
        }
        if self.flags.contains(Flags::TIME) || self.flags.contains(Flags::MICROSECONDS) {
            buf.push_str(&stamp.format("%H:%M:%S").to_string());
            if self.flags.contains(Flags::MICROSECONDS) {
                buf.push_str(&stamp.format("%.6f").to_string());
            }
            buf.push(' ');
        }

        if self.flags.contains(Flags::SHORT_FILE) || self.flags.contains(Flags::LONG_FILE) {
            let file = if self.flags.contains(Flags::SHORT_FILE) {
                location.file().rsplit(['/', '\\']).next().unwrap_or(location.file())
            } else {
                location.file()
            };
            buf.push_str(&format!("{}:{}: ", file, location.line()));
        }

        if self.flags.contains(Flags::MSG_PREFIX) {
            buf.push_str(&self.prefix);
        }

        buf.push_str(line);
        if !line.ends_with('\n') {
            buf.push('\n');
        }
        buf
    }
}

impl LineSink for StreamSink {
    #[track_caller]
    fn output(&mut self, line: &str) -> io::Result<()> {
        let rendered = self.format_line(line, Location::caller());
        self.out.write_all(rendered.as_bytes())?;
        self.out.flush()
    }

    fn terminate(&mut self, code: i32) -> ! {
        let _ = self.out.flush();
        (self.exit)(code)
    }

    fn flags(&self) -> Flags {
        self.flags
    }

    fn set_flags(&mut self, flags: Flags) {
        self.flags = flags;
    }

    fn prefix(&self) -> String {
        self.prefix.clone()
    }

    fn set_prefix(&mut self, prefix: &str) {
        self.prefix = prefix.to_string();
    }

    fn set_output(&mut self, out: Box<dyn Write + Send>) {
        self.out = out;
    }
}
