use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;

/// Output format for commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

impl OutputFormat {
    /// Resolve the effective output format.
    /// If user specified a format, use it.
    /// Otherwise: TTY → Text, non-TTY (pipe) → Json
    pub fn resolve(user_choice: Option<OutputFormat>) -> OutputFormat {
        match user_choice {
            Some(fmt) => fmt,
            None => {
                if std::io::stdout().is_terminal() {
                    OutputFormat::Text
                } else {
                    OutputFormat::Json
                }
            }
        }
    }
}

#[derive(Parser)]
#[command(
    name = "sevlog",
    about = "Severity logging with remote error reporting",
    version = env!("GIT_DESCRIBE"),
    after_help = "Diagnostics are written to: ~/.local/share/sevlog/logs/sevlog.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to sevlog.yaml config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, help = "Suppress non-error output")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// User and tag flags shared by the reporting commands
#[derive(Args, Debug, Clone, Default)]
pub struct ContextArgs {
    /// User id
    #[arg(long)]
    pub user_id: Option<String>,

    /// User name
    #[arg(long)]
    pub username: Option<String>,

    /// User email
    #[arg(long)]
    pub email: Option<String>,

    /// User IP address
    #[arg(long)]
    pub ip: Option<String>,

    /// Tag as key=value (repeatable)
    #[arg(long = "tag", value_parser = parse_key_val)]
    pub tags: Vec<(String, String)>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write an INFO line
    Info {
        /// Message
        message: String,
    },

    /// Write a DEBUG entry to the debug sink
    Debug {
        /// Message
        message: String,

        /// Error text to include
        #[arg(long)]
        error: Option<String>,

        /// Environment entry as key=value (repeatable)
        #[arg(long = "env", value_parser = parse_key_val)]
        env: Vec<(String, String)>,
    },

    /// Write a WARN line and report the error without waiting
    Warn {
        /// Error text
        error: String,

        #[command(flatten)]
        context: ContextArgs,
    },

    /// Write an ERROR line, report without waiting, exit 1
    Error {
        /// Error text
        error: String,

        #[command(flatten)]
        context: ContextArgs,
    },

    /// Report and wait for delivery, write an ERROR line, exit 1
    FatalError {
        /// Error text
        error: String,

        #[command(flatten)]
        context: ContextArgs,
    },

    /// Write the given words as one line
    Print {
        /// Words, joined by spaces
        #[arg(required = true)]
        words: Vec<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Diagnose setup issues
    Doctor,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        /// Output format (default: text for TTY, json for pipes)
        #[arg(long, short = 'o', value_enum)]
        format: Option<OutputFormat>,
    },

    /// Get a configuration value
    Get {
        /// Configuration key (dot notation)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,

        /// New value
        value: String,
    },
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}
