//! Session management
//!
//! One process-wide session for a single demo user. Readers get an
//! `Arc` snapshot; writers build a complete `Session` first and publish
//! it with a single swap, so a reader never sees half a login.

use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::forge::{AccessToken, UserProfile};

/// Most recent clone performed by the logged-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloneRecord {
    /// URL that was cloned
    pub url: String,
    /// Local working directory it was cloned into
    pub path: PathBuf,
}

/// Authenticated session data
#[derive(Clone)]
pub struct Session {
    /// Token granted by the forge
    pub access_token: AccessToken,
    /// Profile and repositories fetched with that token
    pub profile: UserProfile,
    /// Per-action state, kept apart from the identity
    pub last_clone: Option<CloneRecord>,
    /// When the login completed
    pub authenticated_at: DateTime<Utc>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &self.access_token)
            .field("login", &self.profile.login_name)
            .field("last_clone", &self.last_clone)
            .field("authenticated_at", &self.authenticated_at)
            .finish()
    }
}

/// Holder for the single session
///
/// Created empty at startup. There is no logout; a new login replaces
/// the session wholesale.
#[derive(Debug, Default)]
pub struct SessionHolder {
    current: RwLock<Option<Arc<Session>>>,
}

impl SessionHolder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a login has completed
    pub fn is_authenticated(&self) -> bool {
        self.snapshot().is_some()
    }

    /// Profile of the logged-in user, if any
    pub fn current_user(&self) -> Option<UserProfile> {
        self.snapshot().map(|session| session.profile.clone())
    }

    /// Consistent view of the whole session
    pub fn snapshot(&self) -> Option<Arc<Session>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Publish a new session
    ///
    /// Call only after both the token exchange and the user fetch have
    /// succeeded. A second call replaces the first entirely.
    pub fn complete_login(&self, token: AccessToken, profile: UserProfile) {
        let session = Arc::new(Session {
            access_token: token,
            profile,
            last_clone: None,
            authenticated_at: Utc::now(),
        });

        tracing::info!(login = %session.profile.login_name, "Session established");
        self.publish(session);
    }

    /// Attach a clone record to the session it was started from
    ///
    /// Writes only if `expected` is still the published session, so a
    /// clone never lands on a login that replaced it. Returns `false`
    /// when the session changed or nobody is logged in.
    pub fn record_clone(&self, expected: &Arc<Session>, record: CloneRecord) -> bool {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(existing) if Arc::ptr_eq(existing, expected) => {
                let mut updated = Session::clone(existing);
                updated.last_clone = Some(record);
                *guard = Some(Arc::new(updated));
                true
            }
            _ => false,
        }
    }

    fn publish(&self, session: Arc<Session>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
    }
}
