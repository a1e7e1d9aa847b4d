//! Login service
//!
//! Runs the two network phases of a login and publishes the session
//! only once both have succeeded.

use std::sync::Arc;

use crate::auth::SessionHolder;
use crate::config::OAuthConfig;
use crate::error::AppError;
use crate::forge::{ForgeClient, UserProfile};

/// Login service
pub struct LoginService {
    forge: ForgeClient,
    oauth: OAuthConfig,
    sessions: Arc<SessionHolder>,
}

impl LoginService {
    /// Create new login service
    pub fn new(forge: ForgeClient, oauth: OAuthConfig, sessions: Arc<SessionHolder>) -> Self {
        Self {
            forge,
            oauth,
            sessions,
        }
    }

    /// Exchange `code`, fetch the user, and replace the session
    ///
    /// On any failure the session is left exactly as it was.
    pub async fn login(&self, code: &str) -> Result<UserProfile, AppError> {
        let result = self.exchange_and_fetch(code).await;

        use crate::metrics::LOGINS_TOTAL;
        match &result {
            Ok(_) => LOGINS_TOTAL.with_label_values(&["success"]).inc(),
            Err(error) => LOGINS_TOTAL.with_label_values(&[error.error_type()]).inc(),
        }

        result
    }

    async fn exchange_and_fetch(&self, code: &str) -> Result<UserProfile, AppError> {
        let token = self.forge.exchange_code_for_token(code, &self.oauth).await?;
        let profile = self.forge.fetch_user(&token.access_token).await?;

        self.sessions.complete_login(token, profile.clone());
        Ok(profile)
    }
}
