pub mod error;
pub mod response;

pub use error::AuthError;
pub use response::{ErrorBody, sanitize_reason};
