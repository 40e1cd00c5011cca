use clap::Parser;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;

mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::severity;
use sevlog::SeverityLogger;
use sevlog::config::{Config, LogLevel};

fn setup_logging(log_level: &LogLevel, verbose: bool, quiet: bool) -> Result<()> {
    // SEVLOG_LOG_DIR overrides the default location
    let log_dir = std::env::var("SEVLOG_LOG_DIR").map(PathBuf::from).unwrap_or_else(|_| {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sevlog")
            .join("logs")
    });

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("sevlog.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    // RUST_LOG env var takes precedence, otherwise use flags, then config
    let mut builder = env_logger::Builder::new();

    if std::env::var("RUST_LOG").is_ok() {
        builder.parse_default_env();
    } else if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    } else if quiet {
        builder.filter_level(log::LevelFilter::Error);
    } else {
        builder.filter_level(log_level.to_level_filter());
    }

    builder.target(env_logger::Target::Pipe(target)).init();

    info!("Logging initialized, writing to: {}", log_file.display());
    info!(
        "Log level: {} (from {})",
        log_level.as_filter(),
        if std::env::var("RUST_LOG").is_ok() { "RUST_LOG env" } else { "config" }
    );
    Ok(())
}

fn run(cli: Cli, config: Config) -> Result<()> {
    let logger = || SeverityLogger::from_config(&config).context("Failed to initialize logger");

    match cli.command {
        Commands::Info { message } => severity::info(&logger()?, &message),
        Commands::Debug { message, error, env } => severity::debug(&logger()?, &message, error.as_deref(), &env),
        Commands::Warn { error, context } => severity::warn(&logger()?, &error, &context),
        Commands::Error { error, context } => severity::error(&logger()?, &error, &context),
        Commands::FatalError { error, context } => severity::fatal_error(&logger()?, &error, &context),
        Commands::Print { words } => severity::print(&logger()?, &words),
        Commands::Config { action } => commands::config::run(action, &config),
        Commands::Doctor => commands::doctor::run(&config),
        Commands::Completions { shell } => commands::completions::run(shell),
    }
}

fn main() -> Result<()> {
    // Parse CLI arguments first
    let cli = Cli::parse();

    // Load configuration (before logging, so log messages in Config::load are silent)
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(&config.log_level, cli.verbose, cli.quiet).context("Failed to setup logging")?;

    info!("Starting sevlog with config from: {:?}", cli.config);

    run(cli, config).context("Command failed")?;

    Ok(())
}
