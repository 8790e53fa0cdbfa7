//! Session binding validation — the anti-hijacking check.
//!
//! A session is bound to the device fingerprint and client IP captured at
//! creation. The fingerprint is the stronger signal: a matching fingerprint
//! allows the request even from a new IP, because mobile clients roam between
//! networks constantly. IP match alone is the fallback. When both signals
//! mismatch, strict mode rejects the request (without invalidating the
//! session server-side); permissive mode allows it but emits a distinguishable
//! security-warning event.

use gateway_errors::AuthError;
use session_store::SessionRecord;

use crate::client_info::ClientInfo;
use crate::config::BindingConfig;

/// Stateless binding check over a session record and current client signals.
#[derive(Debug, Clone)]
pub struct SessionBindingValidator {
    config: BindingConfig,
}

impl SessionBindingValidator {
    #[must_use]
    pub fn new(config: BindingConfig) -> Self {
        Self { config }
    }

    /// Apply the binding decision table.
    ///
    /// # Errors
    ///
    /// [`AuthError::SessionBindingViolation`] when both signals mismatch and
    /// strict mode is on.
    pub fn validate(&self, record: &SessionRecord, client: &ClientInfo) -> Result<(), AuthError> {
        if !self.config.enabled {
            return Ok(());
        }

        let fingerprint_matches = matches!(
            (&record.device_fingerprint, &client.device_fingerprint),
            (Some(stored), Some(current)) if stored == current
        );
        if fingerprint_matches {
            return Ok(());
        }

        let ip_matches = matches!(
            (&record.client_ip, &client.ip),
            (Some(stored), Some(current)) if stored == current
        );
        if ip_matches {
            return Ok(());
        }

        if self.config.strict {
            return Err(AuthError::SessionBindingViolation);
        }

        tracing::warn!(
            event = "security.binding_mismatch",
            session_id = %record.session_id,
            user_id = %record.user_id,
            stored_ip = ?record.client_ip,
            current_ip = ?client.ip,
            "both binding signals mismatch; allowing per permissive mode"
        );
        Ok(())
    }
}
