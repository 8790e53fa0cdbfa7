//! Configuration for the authorization layer.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_permissions_timeout_ms() -> u64 {
    500
}

fn default_denied_resource_types() -> BTreeSet<String> {
    ["document".to_owned()].into_iter().collect()
}

/// Settings for the persona gate and policy engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AuthzConfig {
    /// Timeout applied to every permissions-source call, in milliseconds.
    /// Elapse is a dependency failure, never an implicit allow.
    pub permissions_timeout_ms: u64,
    /// Resource types the `config_specialist` persona may never touch,
    /// independent of any other attribute.
    pub config_specialist_denied_resource_types: BTreeSet<String>,
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            permissions_timeout_ms: default_permissions_timeout_ms(),
            config_specialist_denied_resource_types: default_denied_resource_types(),
        }
    }
}

impl AuthzConfig {
    #[must_use]
    pub fn permissions_timeout(&self) -> Duration {
        Duration::from_millis(self.permissions_timeout_ms)
    }
}
