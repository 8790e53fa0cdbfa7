//! Dual-authentication resolution.
//!
//! Produces exactly one trustworthy [`gateway_security::AuthContext`] per
//! request — from a session cookie validated against the session store and
//! its binding signals, or from partner headers vetted by the upstream mTLS
//! edge — or fails closed with a typed error.

pub mod binding;
pub mod client_info;
pub mod config;
pub mod partner;
pub mod resolver;

pub use binding::SessionBindingValidator;
pub use client_info::{ClientInfo, ClientInfoExtractor};
pub use config::{AuthnConfig, BindingConfig};
pub use partner::{IdpProvider, PartnerHeaderAuthenticator, headers};
pub use resolver::{DualAuthResolver, RouteClass};
