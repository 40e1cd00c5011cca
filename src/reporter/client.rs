//! Reporter backed by the Sentry client
//!
//! Every report becomes a complete `protocol::Event` carrying its own user
//! and tags, so the hub's scope stays empty between captures. Queueing,
//! transport and rate limiting belong to the client; a blocking capture
//! flushes it.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use sentry::protocol::{Event, Exception, IpAddress};
use sentry::types::{Dsn, ParseDsnError};
use sentry::{Client, ClientOptions, Hub, Scope, TransportFactory};

use super::{Delivery, ErrorReporter, Level, Report};
use crate::config::ReporterConfig;
use crate::context::User;
use crate::error::InitError;

/// Parse and validate a DSN
pub fn parse_dsn(raw: &str) -> Result<Dsn, InitError> {
    Ok(raw.trim().parse::<Dsn>()?)
}

/// DSN text with the secret key removed
pub fn redact_dsn(raw: &str) -> Result<String, InitError> {
    parse_dsn(raw)?;
    let mut url = url::Url::parse(raw.trim()).map_err(|_| InitError::InvalidDsn(ParseDsnError::InvalidUrl))?;
    // Only fails for URLs that cannot carry credentials, which a DSN always can
    let _ = url.set_password(None);
    Ok(url.to_string())
}

/// `ErrorReporter` over a dedicated `sentry::Hub`
pub struct SentryReporter {
    hub: Hub,
    client: Arc<Client>,
    logger_name: String,
    flush_timeout: Duration,
}

impl SentryReporter {
    /// Start a client with the default HTTP transport
    pub fn new(config: &ReporterConfig) -> Result<Self, InitError> {
        Self::build(config, None)
    }

    /// Start a client on a caller-supplied transport
    pub fn with_transport(config: &ReporterConfig, transport: Arc<dyn TransportFactory>) -> Result<Self, InitError> {
        Self::build(config, Some(transport))
    }

    fn build(config: &ReporterConfig, transport: Option<Arc<dyn TransportFactory>>) -> Result<Self, InitError> {
        let dsn = parse_dsn(&config.dsn)?;
        let flush_timeout = Duration::from_secs(config.timeout_secs);

        let options = sentry::apply_defaults(ClientOptions {
            dsn: Some(dsn),
            environment: config.environment.clone().map(Cow::Owned),
            release: config.release.clone().map(Cow::Owned),
            server_name: server_name(config).map(Cow::Owned),
            shutdown_timeout: flush_timeout,
            transport,
            ..ClientOptions::default()
        });

        let client = Arc::new(Client::from_config(options));
        let hub = Hub::new(Some(client.clone()), Arc::new(Scope::default()));

        Ok(Self {
            hub,
            client,
            logger_name: config.logger_name.clone(),
            flush_timeout,
        })
    }

    fn event_for(&self, report: Report) -> Event<'static> {
        // Sentry lists the root cause first
        let exceptions: Vec<Exception> = report
            .chain
            .iter()
            .rev()
            .map(|value| Exception {
                ty: "Error".to_string(),
                value: Some(value.clone()),
                ..Exception::default()
            })
            .collect();

        Event {
            level: report.level.into(),
            logger: Some(self.logger_name.clone()),
            message: Some(report.message),
            exception: exceptions.into(),
            tags: report.tags,
            user: report.user.filter(|user| !user.is_empty()).map(sentry_user),
            ..Event::default()
        }
    }
}

impl ErrorReporter for SentryReporter {
    fn capture(&self, report: Report) {
        let level = report.level;
        let event_id = self.hub.capture_event(self.event_for(report));
        log::debug!("Queued {:?} report {}", level, event_id);
    }

    fn capture_and_wait(&self, report: Report) -> Delivery {
        self.capture(report);
        if self.client.flush(Some(self.flush_timeout)) {
            Delivery::Sent
        } else {
            log::warn!("Report queue not drained within {:?}", self.flush_timeout);
            Delivery::GaveUp
        }
    }
}

impl Drop for SentryReporter {
    fn drop(&mut self) {
        self.client.close(Some(self.flush_timeout));
    }
}

impl From<Level> for sentry::Level {
    fn from(level: Level) -> Self {
        match level {
            Level::Warning => sentry::Level::Warning,
            Level::Error => sentry::Level::Error,
            Level::Fatal => sentry::Level::Fatal,
        }
    }
}

fn sentry_user(user: User) -> sentry::User {
    sentry::User {
        id: user.id,
        username: user.username,
        email: user.email,
        ip_address: user.ip_address.and_then(|ip| ip.parse().ok()).map(IpAddress::Exact),
        ..sentry::User::default()
    }
}

/// Configured server name, else $HOSTNAME
fn server_name(config: &ReporterConfig) -> Option<String> {
    config
        .server_name
        .clone()
        .or_else(|| std::env::var("HOSTNAME").ok().filter(|h| !h.is_empty()))
}
