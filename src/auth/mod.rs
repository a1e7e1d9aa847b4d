//! Code forge OAuth authentication
//!
//! Handles:
//! - The consent/callback/success page flow
//! - Single-user session management

mod oauth;
pub mod session;

pub use oauth::auth_router;
pub use session::{CloneRecord, Session, SessionHolder};
