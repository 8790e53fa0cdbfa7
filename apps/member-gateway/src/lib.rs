//! The member gateway: a backend-for-frontend that authenticates browser
//! sessions and partner-asserted identities, gates requests by persona, and
//! authorizes resource access through an ABAC policy engine.

pub mod config;
pub mod documents;
pub mod handlers;
pub mod identity;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::AppConfig;
pub use server::{build_router, run};
pub use state::{AppState, build_state};
