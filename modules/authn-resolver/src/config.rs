//! Configuration for the authentication resolver.

use std::net::IpAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_cookie_name() -> String {
    "BFF_SESSION".to_owned()
}

fn default_session_ttl_secs() -> u64 {
    30 * 60
}

fn default_store_timeout_ms() -> u64 {
    500
}

/// Settings for the dual-auth resolver and its validators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AuthnConfig {
    /// Name of the session cookie.
    pub cookie_name: String,
    /// Sliding session TTL, in seconds.
    pub session_ttl_secs: u64,
    /// Timeout applied to every session-store call, in milliseconds.
    /// Elapse is a dependency failure, never an implicit allow.
    pub store_timeout_ms: u64,
    /// Session binding (anti-hijacking) settings.
    pub binding: BindingConfig,
    /// Reverse proxies whose `X-Forwarded-For` entries are trusted.
    pub trusted_proxies: Vec<IpAddr>,
}

impl Default for AuthnConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            session_ttl_secs: default_session_ttl_secs(),
            store_timeout_ms: default_store_timeout_ms(),
            binding: BindingConfig::default(),
            trusted_proxies: Vec::new(),
        }
    }
}

impl AuthnConfig {
    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    #[must_use]
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

/// Session binding behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct BindingConfig {
    /// Master switch. Off is intended for non-production environments only.
    pub enabled: bool,
    /// When both fingerprint and IP mismatch: strict rejects the request,
    /// permissive allows it and emits a security warning.
    pub strict: bool,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            strict: true,
        }
    }
}
