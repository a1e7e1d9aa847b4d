//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Services orchestrate the forge client, the session holder and the
//! clone collaborator.

mod clone;
mod login;

pub use clone::{CloneTarget, GitCloner, RepositoryCloner, validate_clone_url};
pub use login::LoginService;
