use colored::*;
use eyre::{Context, Result};
use std::fs;

use sevlog::config::Config;
use sevlog::reporter::{parse_dsn, redact_dsn};

use crate::cli::{ConfigAction, OutputFormat};

pub fn run(action: ConfigAction, config: &Config) -> Result<()> {
    match action {
        ConfigAction::Show { format } => show(OutputFormat::resolve(format), config),
        ConfigAction::Get { key } => get(&key, config),
        ConfigAction::Set { key, value } => set(&key, &value, config),
    }
}

fn show(format: OutputFormat, config: &Config) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&redacted(config))?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(&redacted(config))?);
        }
        OutputFormat::Text => {
            println!("{}", "sevlog Configuration".bold());
            println!();

            println!("{}: {}", "log_level".cyan(), config.log_level.as_filter());
            println!();

            println!("{}:", "sink".cyan());
            println!("  target: {:?}", config.sink.target);
            println!("  prefix: {:?}", config.sink.prefix);
            println!("  flags: {}", config.sink.flags());
            println!();

            println!("{}:", "debug_sink".cyan());
            println!("  target: {:?}", config.debug_sink.target);
            println!("  flags: {}", config.debug_sink.flags());
            println!();

            println!("{}:", "reporter".cyan());
            println!("  dsn: {}", lookup("reporter.dsn", config).unwrap_or_default());
            println!("  environment: {}", config.reporter.environment.as_deref().unwrap_or("-"));
            println!("  release: {}", config.reporter.release.as_deref().unwrap_or("-"));
            println!("  logger_name: {}", config.reporter.logger_name);
            for (key, value) in &config.reporter.default_tags {
                println!("  tag {}={}", key, value);
            }
        }
    }

    Ok(())
}

/// Copy of `config` that is safe to print
fn redacted(config: &Config) -> Config {
    let mut shown = config.clone();
    if !config.reporter.dsn.trim().is_empty() {
        shown.reporter.dsn = redact_dsn(&config.reporter.dsn).unwrap_or_else(|_| "(invalid)".to_string());
    }
    shown
}

fn lookup(key: &str, config: &Config) -> Option<String> {
    match key {
        "log_level" | "log-level" => Some(config.log_level.as_filter().to_string()),
        "sink.prefix" => Some(config.sink.prefix.clone()),
        "sink.flags" => Some(config.sink.flags().to_string()),
        "reporter.dsn" => Some(match redact_dsn(&config.reporter.dsn) {
            Ok(dsn) => dsn,
            Err(_) if config.reporter.dsn.trim().is_empty() => "(disabled)".to_string(),
            Err(_) => "(invalid)".to_string(),
        }),
        "reporter.environment" => config.reporter.environment.clone(),
        "reporter.release" => config.reporter.release.clone(),
        "reporter.logger_name" => Some(config.reporter.logger_name.clone()),
        "reporter.timeout_secs" => Some(config.reporter.timeout_secs.to_string()),
        _ => None,
    }
}

fn get(key: &str, config: &Config) -> Result<()> {
    match lookup(key, config) {
        Some(v) => println!("{}", v),
        None => {
            eprintln!("{} Unknown config key: {}", "✗".red(), key);
            std::process::exit(1);
        }
    }

    Ok(())
}

fn set(key: &str, value: &str, config: &Config) -> Result<()> {
    println!("{} Setting {} = {}", "→".blue(), key.cyan(), value.green());

    let mut new_config = config.clone();

    match key {
        "log_level" | "log-level" => {
            new_config.log_level =
                serde_yaml::from_str(value).context("Invalid log level (trace, debug, info, warn, error, off)")?;
        }
        "sink.prefix" => new_config.sink.prefix = value.to_string(),
        "reporter.dsn" => {
            if !value.is_empty() {
                parse_dsn(value).context("Invalid DSN")?;
            }
            new_config.reporter.dsn = value.to_string();
        }
        "reporter.environment" => new_config.reporter.environment = Some(value.to_string()),
        "reporter.release" => new_config.reporter.release = Some(value.to_string()),
        "reporter.logger_name" => new_config.reporter.logger_name = value.to_string(),
        "reporter.timeout_secs" => {
            new_config.reporter.timeout_secs = value.parse().context("Invalid number of seconds")?;
        }
        _ => {
            eyre::bail!("Unknown config key: {}", key);
        }
    }

    let config_path = Config::sevlog_dir().join("sevlog.yaml");
    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let yaml_str = serde_yaml::to_string(&new_config).context("Failed to serialize config")?;
    fs::write(&config_path, yaml_str).context("Failed to write config file")?;

    println!("  {} Saved to {}", "✓".green(), config_path.display());

    Ok(())
}
