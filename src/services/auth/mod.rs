pub mod bearer;
pub mod credential_store;
pub mod factory;
pub mod hash;
pub mod scope;
pub mod token;

pub use bearer::{AuthError, BearerAuth};
pub use credential_store::SqlCredentialStore;
pub use factory::build_bearer_auth;
