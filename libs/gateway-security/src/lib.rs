pub mod attributes;
pub mod context;
pub mod extract;
pub mod persona;

pub use attributes::{Action, ResourceAttributes, Sensitivity, SubjectAttributes};
pub use context::{AuthContext, AuthContextBuilder};
pub use extract::Auth;
pub use persona::{AuthType, DelegateType, ParseEnumError, Persona};
