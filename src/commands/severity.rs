//! Severity commands: drive a configured logger from the shell

use eyre::Result;
use std::collections::HashMap;
use std::fmt;

use sevlog::{LogContext, SeverityLogger, User};

use crate::cli::ContextArgs;

/// Error built from command-line text
#[derive(Debug)]
struct CliError(String);

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for CliError {}

impl ContextArgs {
    /// None when no context flag was given
    pub fn to_context(&self) -> Option<LogContext> {
        let user = User {
            id: self.user_id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            ip_address: self.ip.clone(),
        };

        if user.is_empty() && self.tags.is_empty() {
            return None;
        }

        let mut ctx = LogContext::new();
        if !user.is_empty() {
            ctx = ctx.with_user(user);
        }
        for (key, value) in &self.tags {
            ctx = ctx.with_tag(key, value);
        }
        Some(ctx)
    }
}

pub fn info(logger: &SeverityLogger, message: &str) -> Result<()> {
    logger.info(message);
    Ok(())
}

pub fn debug(logger: &SeverityLogger, message: &str, error: Option<&str>, env: &[(String, String)]) -> Result<()> {
    let err = error.map(|e| CliError(e.to_string()));
    let env: HashMap<String, String> = env.iter().cloned().collect();
    let env = if env.is_empty() { None } else { Some(&env) };

    logger.debug(message, err.as_ref().map(|e| e as &dyn std::error::Error), env);
    Ok(())
}

pub fn warn(logger: &SeverityLogger, error: &str, context: &ContextArgs) -> Result<()> {
    logger.warn(&CliError(error.to_string()), context.to_context().as_ref());
    Ok(())
}

pub fn error(logger: &SeverityLogger, error: &str, context: &ContextArgs) -> ! {
    logger.error(&CliError(error.to_string()), context.to_context().as_ref())
}

pub fn fatal_error(logger: &SeverityLogger, error: &str, context: &ContextArgs) -> ! {
    logger.fatal_error(&CliError(error.to_string()), context.to_context().as_ref())
}

pub fn print(logger: &SeverityLogger, words: &[String]) -> Result<()> {
    let values: Vec<&dyn fmt::Display> = words.iter().map(|w| w as &dyn fmt::Display).collect();
    logger.println(&values);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_flags_no_context() {
        assert!(ContextArgs::default().to_context().is_none());
    }

    #[test]
    fn test_context_from_flags() {
        let args = ContextArgs {
            email: Some("ops@example.com".to_string()),
            tags: vec![("job".to_string(), "nightly".to_string())],
            ..ContextArgs::default()
        };
        let ctx = args.to_context().unwrap();
        assert_eq!(ctx.user.and_then(|u| u.email).as_deref(), Some("ops@example.com"));
        assert_eq!(ctx.tags.get("job").map(String::as_str), Some("nightly"));
    }

    #[test]
    fn test_tags_only_context_has_no_user() {
        let args = ContextArgs {
            tags: vec![("job".to_string(), "nightly".to_string())],
            ..ContextArgs::default()
        };
        assert!(args.to_context().unwrap().user.is_none());
    }
}
