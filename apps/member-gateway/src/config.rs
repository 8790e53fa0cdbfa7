//! Application configuration: defaults, YAML file, `MG_` environment
//! overrides, merged in that order via figment.

use std::net::SocketAddr;
use std::path::Path;

use authn_resolver::AuthnConfig;
use authz_resolver::AuthzConfig;
use chrono::{DateTime, Utc};
use figment::Figment;
use figment::providers::{Env, Format as _, Serialized, Yaml};
use gateway_security::{DelegateType, Persona, Sensitivity};
use serde::{Deserialize, Serialize};
use session_store::SessionStoreConfig;

fn default_listen_addr() -> SocketAddr {
    "127.0.0.1:8080"
        .parse()
        .unwrap_or(SocketAddr::from(([127, 0, 0, 1], 8080)))
}

fn default_true() -> bool {
    true
}

fn default_log_filter() -> String {
    "info".to_owned()
}

fn default_resource_type() -> String {
    "document".to_owned()
}

/// Top-level configuration for the gateway binary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub log: LogConfig,
    pub authn: AuthnConfig,
    pub authz: AuthzConfig,
    pub session_store: SessionStoreConfig,
    /// Identity source stub backing the login endpoint.
    pub identities: Vec<IdentitySeed>,
    /// Delegate assignment table backing the permissions source.
    pub delegate_assignments: Vec<AssignmentSeed>,
    /// Seed documents served by the demo document endpoints.
    pub documents: Vec<DocumentSeed>,
}

impl AppConfig {
    /// Merge defaults, an optional YAML file, and `MG_` env overrides
    /// (nested keys separated by `__`).
    ///
    /// # Errors
    ///
    /// Fails on unreadable files, unknown fields, or type mismatches.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        Ok(figment.merge(Env::prefixed("MG_").split("__")).extract()?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    /// Whether issued cookies carry the `Secure` attribute. Off only for
    /// plain-HTTP development setups.
    pub cookie_secure: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            cookie_secure: default_true(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LogConfig {
    /// `tracing_subscriber` env-filter directive.
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            format: LogFormat::default(),
        }
    }
}

/// One login-capable identity in the stub directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentitySeed {
    pub username: String,
    pub password: String,
    pub user_id: String,
    pub enterprise_id: String,
    pub persona: Persona,
}

/// One delegate assignment row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssignmentSeed {
    pub delegate_user_id: String,
    pub target_enterprise_id: String,
    pub delegate_types: Vec<DelegateType>,
    /// Active immediately when absent.
    #[serde(default)]
    pub effective_from: Option<DateTime<Utc>>,
    /// Open-ended when absent.
    #[serde(default)]
    pub effective_until: Option<DateTime<Utc>>,
}

/// One seeded document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentSeed {
    pub id: String,
    pub title: String,
    pub content: String,
    pub owner_id: String,
    #[serde(default)]
    pub sensitivity: Sensitivity,
    #[serde(default = "default_resource_type")]
    pub resource_type: String,
    #[serde(default)]
    pub partner_id: Option<String>,
}
