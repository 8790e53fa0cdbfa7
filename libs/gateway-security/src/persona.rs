//! Persona, delegate-type, and auth-type enums shared across the gateway.
//!
//! All enums parse case-insensitively with dashes and underscores treated as
//! equivalent, because partner systems disagree on header formatting
//! (`case-worker`, `CASE_WORKER`, `CaseWorker` all arrive in the wild).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A value that could not be parsed into one of the gateway enums.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unrecognized value '{0}'")]
pub struct ParseEnumError(pub String);

/// Normalize an incoming enum token: trim, lowercase, dashes to underscores.
fn normalize(raw: &str) -> String {
    raw.trim().to_ascii_lowercase().replace('-', "_")
}

/// How the request's identity was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    /// Browser end-user carrying a session cookie issued at login.
    Session,
    /// Partner system asserting identity via headers behind the mTLS edge.
    Proxy,
}

impl AuthType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::Proxy => "proxy",
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The role a request operates under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    /// A member acting on their own data.
    #[serde(rename = "self")]
    SelfService,
    /// A member acting on behalf of another member under delegate grants.
    Delegate,
    /// Partner-side agent persona.
    Agent,
    /// Partner-side case worker persona.
    CaseWorker,
    /// Partner-side configuration specialist persona.
    ConfigSpecialist,
}

impl Persona {
    /// Personas established through a browser session.
    #[must_use]
    pub fn is_session_based(self) -> bool {
        matches!(self, Self::SelfService | Self::Delegate)
    }

    /// Personas asserted by a partner system behind the mTLS edge.
    #[must_use]
    pub fn is_proxy_based(self) -> bool {
        !self.is_session_based()
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SelfService => "self",
            Self::Delegate => "delegate",
            Self::Agent => "agent",
            Self::CaseWorker => "case_worker",
            Self::ConfigSpecialist => "config_specialist",
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Persona {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "self" | "self_service" => Ok(Self::SelfService),
            "delegate" => Ok(Self::Delegate),
            "agent" => Ok(Self::Agent),
            "case_worker" => Ok(Self::CaseWorker),
            "config_specialist" => Ok(Self::ConfigSpecialist),
            _ => Err(ParseEnumError(s.to_owned())),
        }
    }
}

/// Composable delegate grants qualifying a [`Persona::Delegate`] scope.
///
/// Access rules require specific combinations keyed to resource sensitivity;
/// the grants themselves are data on the session record and the permissions
/// source, never hardcoded into handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DelegateType {
    /// Designated authorized adult.
    Daa,
    /// Personal-representative grant.
    Rpr,
    /// Release-of-information grant.
    Roi,
}

impl DelegateType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daa => "DAA",
            Self::Rpr => "RPR",
            Self::Roi => "ROI",
        }
    }
}

impl fmt::Display for DelegateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DelegateType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "daa" => Ok(Self::Daa),
            "rpr" => Ok(Self::Rpr),
            "roi" => Ok(Self::Roi),
            _ => Err(ParseEnumError(s.to_owned())),
        }
    }
}
