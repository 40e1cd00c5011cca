//! Per-call reporting context

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// User identity attached to a report. All fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "ip_address", skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
}

impl User {
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_username(mut self, username: &str) -> Self {
        self.username = Some(username.to_string());
        self
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    pub fn with_ip_address(mut self, ip: &str) -> Self {
        self.ip_address = Some(ip.to_string());
        self
    }

    /// True when no identity field is set
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.username.is_none() && self.email.is_none() && self.ip_address.is_none()
    }
}

/// Context for exactly one `warn`/`error`/`fatal_error` call.
///
/// Consumed by reference; nothing in it is retained once the call returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogContext {
    pub user: Option<User>,
    pub tags: BTreeMap<String, String>,
}

impl LogContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a user identity
    pub fn with_user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }

    /// Add a tag
    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_string(), value.to_string());
        self
    }

    /// Merge default tags under this context's tags. Context tags win.
    pub fn merged_tags(context: Option<&LogContext>, defaults: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        let mut tags = defaults.clone();
        if let Some(ctx) = context {
            tags.extend(ctx.tags.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        tags
    }
}
