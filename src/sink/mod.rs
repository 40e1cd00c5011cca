//! Local line sinks
//!
//! A sink receives fully formatted lines and writes them somewhere. Every
//! passthrough operation (print/fatal/panic families) is a provided method
//! built on the few primitives an implementation supplies, so a logger only
//! ever forwards to its sink.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::io::{self, Write};
use std::ops::{BitOr, BitOrAssign};
use std::sync::{Arc, Mutex, PoisonError};

pub mod stream;

pub use stream::StreamSink;

/// Exit status used by every terminating path
pub const FATAL_EXIT_CODE: i32 = 1;

/// Header flags, bit-compatible with Go's `log` package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags(u32);

impl Flags {
    pub const NONE: Flags = Flags(0);
    /// Local date: 2009/01/23
    pub const DATE: Flags = Flags(1);
    /// Local time: 01:23:23
    pub const TIME: Flags = Flags(1 << 1);
    /// Microsecond resolution, assumes TIME
    pub const MICROSECONDS: Flags = Flags(1 << 2);
    /// Full file path and line number
    pub const LONG_FILE: Flags = Flags(1 << 3);
    /// Final path element and line number, overrides LONG_FILE
    pub const SHORT_FILE: Flags = Flags(1 << 4);
    /// Use UTC instead of the local time zone
    pub const UTC: Flags = Flags(1 << 5);
    /// Move the prefix from the start of the line to before the message
    pub const MSG_PREFIX: Flags = Flags(1 << 6);
    pub const STD: Flags = Flags(Self::DATE.0 | Self::TIME.0);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn from_bits(bits: u32) -> Self {
        Flags(bits & 0x7f)
    }

    pub const fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

impl BitOrAssign for Flags {
    fn bitor_assign(&mut self, rhs: Flags) {
        self.0 |= rhs.0;
    }
}

impl Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = Flag::ALL
            .iter()
            .filter(|flag| self.contains(Flags::from(**flag)))
            .map(|flag| flag.to_string())
            .collect();
        if names.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", names.join("|"))
        }
    }
}

/// Single named flag, as written in configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flag {
    Date,
    Time,
    Microseconds,
    LongFile,
    ShortFile,
    Utc,
    MsgPrefix,
}

impl Flag {
    pub const ALL: [Flag; 7] = [
        Flag::Date,
        Flag::Time,
        Flag::Microseconds,
        Flag::LongFile,
        Flag::ShortFile,
        Flag::Utc,
        Flag::MsgPrefix,
    ];
}

impl Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}

impl From<Flag> for Flags {
    fn from(flag: Flag) -> Flags {
        match flag {
            Flag::Date => Flags::DATE,
            Flag::Time => Flags::TIME,
            Flag::Microseconds => Flags::MICROSECONDS,
            Flag::LongFile => Flags::LONG_FILE,
            Flag::ShortFile => Flags::SHORT_FILE,
            Flag::Utc => Flags::UTC,
            Flag::MsgPrefix => Flags::MSG_PREFIX,
        }
    }
}

impl FromIterator<Flag> for Flags {
    fn from_iter<I: IntoIterator<Item = Flag>>(iter: I) -> Self {
        iter.into_iter().fold(Flags::NONE, |acc, flag| acc | Flags::from(flag))
    }
}

/// Destination for formatted log lines.
///
/// Implementors supply `output`, `terminate` and the state accessors; the
/// print, fatal and panic families come for free.
pub trait LineSink: Send {
    /// Write one entry, returning the I/O result
    #[track_caller]
    fn output(&mut self, line: &str) -> io::Result<()>;

    /// End the process. Called after the fatal line has been written.
    fn terminate(&mut self, code: i32) -> !;

    fn flags(&self) -> Flags;
    fn set_flags(&mut self, flags: Flags);
    fn prefix(&self) -> String;
    fn set_prefix(&mut self, prefix: &str);
    fn set_output(&mut self, out: Box<dyn Write + Send>);

    /// Write one entry, swallowing I/O errors
    #[track_caller]
    fn write(&mut self, line: &str) {
        if let Err(e) = self.output(line) {
            log::debug!("Failed to write log line: {}", e);
        }
    }

    /// Write one entry, then terminate the process
    #[track_caller]
    fn write_fatal(&mut self, line: &str) -> ! {
        self.write(line);
        self.terminate(FATAL_EXIT_CODE)
    }

    #[track_caller]
    fn print(&mut self, values: &[&dyn Display]) {
        self.write(&concat(values));
    }

    #[track_caller]
    fn printf(&mut self, args: fmt::Arguments<'_>) {
        self.write(&args.to_string());
    }

    #[track_caller]
    fn println(&mut self, values: &[&dyn Display]) {
        self.write(&join(values));
    }

    #[track_caller]
    fn fatal(&mut self, values: &[&dyn Display]) -> ! {
        self.write_fatal(&concat(values))
    }

    #[track_caller]
    fn fatalf(&mut self, args: fmt::Arguments<'_>) -> ! {
        self.write_fatal(&args.to_string())
    }

    #[track_caller]
    fn fatalln(&mut self, values: &[&dyn Display]) -> ! {
        self.write_fatal(&join(values))
    }

    #[track_caller]
    fn panic(&mut self, values: &[&dyn Display]) -> ! {
        let msg = concat(values);
        self.write(&msg);
        panic!("{}", msg)
    }

    #[track_caller]
    fn panicf(&mut self, args: fmt::Arguments<'_>) -> ! {
        let msg = args.to_string();
        self.write(&msg);
        panic!("{}", msg)
    }

    #[track_caller]
    fn panicln(&mut self, values: &[&dyn Display]) -> ! {
        let msg = join(values);
        self.write(&msg);
        panic!("{}", msg)
    }
}

fn concat(values: &[&dyn Display]) -> String {
    values.iter().map(|v| v.to_string()).collect()
}

fn join(values: &[&dyn Display]) -> String {
    values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(" ")
}

/// Cloneable in-memory writer; every clone sees the same bytes.
///
/// Handy as a `set_output` target when lines must be inspected afterwards.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded
    pub fn contents(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).to_string()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(|s| s.to_string()).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut bytes = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
