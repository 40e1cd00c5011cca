use eyre::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::InitError;
use crate::sink::{Flag, Flags, StreamSink};

/// Main sevlog configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub log_level: LogLevel,
    pub sink: SinkConfig,
    /// Fields left out fall back to the debug defaults, not the main sink's
    #[serde(default = "SinkConfig::debug", deserialize_with = "SinkConfig::deserialize_debug")]
    pub debug_sink: SinkConfig,
    pub reporter: ReporterConfig,
}

/// Filter for the crate's own diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }

    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Off => log::LevelFilter::Off,
        }
    }
}

/// Where a sink writes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkTarget {
    Stdout,
    #[default]
    Stderr,
    /// Append to `path`
    File,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SinkConfig {
    pub target: SinkTarget,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub prefix: String,
    pub flags: Vec<Flag>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReporterConfig {
    /// Empty disables remote reporting
    pub dsn: String,
    pub environment: Option<String>,
    pub release: Option<String>,
    pub logger_name: String,
    /// Defaults to $HOSTNAME
    pub server_name: Option<String>,
    pub default_tags: BTreeMap<String, String>,
    /// Upper bound on a blocking capture, and on draining at shutdown
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            sink: SinkConfig::default(),
            debug_sink: SinkConfig::debug(),
            reporter: ReporterConfig::default(),
        }
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            target: SinkTarget::Stderr,
            path: None,
            prefix: String::new(),
            flags: vec![Flag::Date, Flag::Time],
        }
    }
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            dsn: String::new(),
            environment: None,
            release: None,
            logger_name: "sevlog".to_string(),
            server_name: None,
            default_tags: BTreeMap::new(),
            timeout_secs: 5,
        }
    }
}

impl SinkConfig {
    /// Debug sink defaults: stderr with date, time and short file name
    pub fn debug() -> Self {
        Self {
            flags: vec![Flag::Date, Flag::Time, Flag::ShortFile],
            ..Self::default()
        }
    }

    fn deserialize_debug<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Default, Deserialize)]
        struct Partial {
            target: Option<SinkTarget>,
            path: Option<PathBuf>,
            prefix: Option<String>,
            flags: Option<Vec<Flag>>,
        }

        let partial = Option::<Partial>::deserialize(deserializer)?.unwrap_or_default();
        let base = Self::debug();
        Ok(Self {
            target: partial.target.unwrap_or(base.target),
            path: partial.path.or(base.path),
            prefix: partial.prefix.unwrap_or(base.prefix),
            flags: partial.flags.unwrap_or(base.flags),
        })
    }

    pub fn flags(&self) -> Flags {
        self.flags.iter().copied().collect()
    }

    /// Build the configured sink
    pub fn open(&self) -> Result<StreamSink, InitError> {
        match self.target {
            SinkTarget::Stdout => Ok(StreamSink::new(std::io::stdout(), &self.prefix, self.flags())),
            SinkTarget::Stderr => Ok(StreamSink::new(std::io::stderr(), &self.prefix, self.flags())),
            SinkTarget::File => {
                let path = self.path.as_ref().ok_or_else(|| InitError::SinkOpen {
                    path: String::new(),
                    source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "file sink requires a path"),
                })?;
                StreamSink::file(Config::expand_path(path), &self.prefix, self.flags())
            }
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        if let Ok(env_path) = std::env::var("SEVLOG_CONFIG") {
            let path = PathBuf::from(env_path);
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from SEVLOG_CONFIG: {}", e);
                    }
                }
            }
        }

        if let Ok(dir) = std::env::var("SEVLOG_DIR") {
            let path = PathBuf::from(dir).join("sevlog.yaml");
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from SEVLOG_DIR: {}", e);
                    }
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let path = config_dir.join("sevlog").join("sevlog.yaml");
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", path.display(), e);
                    }
                }
            }
        }

        // Try ./sevlog.yaml (for development)
        let local_config = PathBuf::from("sevlog.yaml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load local config: {}", e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Directory holding sevlog.yaml
    pub fn sevlog_dir() -> PathBuf {
        std::env::var("SEVLOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("sevlog"))
    }

    /// Expand a path that may contain ~ or env vars
    pub fn expand_path(path: &Path) -> PathBuf {
        let path_str = path.to_string_lossy();
        let expanded = shellexpand::full(&path_str).unwrap_or_else(|_| path_str.clone());
        PathBuf::from(expanded.as_ref())
    }
}
