//! Diagnose sevlog setup issues

use colored::*;
use eyre::Result;

use sevlog::config::{Config, SinkTarget};
use sevlog::reporter::redact_dsn;

pub fn run(config: &Config) -> Result<()> {
    println!("{}", "sevlog Doctor".bold());
    println!("{}", "═".repeat(50));
    println!();

    let mut issues = 0;

    let config_file = Config::sevlog_dir().join("sevlog.yaml");
    if config_file.exists() {
        println!("{} Config file: {}", "✓".green(), config_file.display());
    } else {
        println!("{} No config file at {} (using defaults)", "⚠".yellow(), config_file.display());
    }

    for (name, sink) in [("Sink", &config.sink), ("Debug sink", &config.debug_sink)] {
        match sink.target {
            SinkTarget::File => match sink.open() {
                Ok(_) => {
                    let path = sink.path.as_deref().map(|p| p.display().to_string()).unwrap_or_default();
                    println!("{} {}: file {}", "✓".green(), name, path);
                }
                Err(e) => {
                    println!("{} {}: {}", "✗".red(), name, e);
                    issues += 1;
                }
            },
            target => println!("{} {}: {:?}", "✓".green(), name, target),
        }
    }

    if config.reporter.dsn.trim().is_empty() {
        println!("{} Reporter: disabled (no DSN)", "⚠".yellow());
    } else {
        match redact_dsn(&config.reporter.dsn) {
            Ok(dsn) => {
                println!("{} Reporter: {}", "✓".green(), dsn);
            }
            Err(e) => {
                println!("{} Reporter: {}", "✗".red(), e);
                issues += 1;
            }
        }
    }

    if config.reporter.environment.is_none() {
        println!("{} Reporter environment not set", "⚠".yellow());
    }

    println!();
    if issues == 0 {
        println!("{} No issues found", "✓".green().bold());
    } else {
        println!("{} {} issue(s) found", "✗".red().bold(), issues);
        eyre::bail!("{} issue(s) found", issues);
    }

    Ok(())
}
