//! Code forge client
//!
//! Handles:
//! - Building the consent URL
//! - Exchanging an authorization code for an access token
//! - Fetching the user profile and repository listing

mod models;
mod token;
mod user;

pub use models::{AccessToken, Repository, UserProfile};

use url::Url;

use crate::config::{ForgeConfig, HttpConfig, OAuthConfig};
use crate::error::AppError;

/// Scope requested on the consent page
pub const OAUTH_SCOPE: &str = "repo";

/// HTTP client adapter for the forge's OAuth and REST endpoints
///
/// Cheap to clone; the inner `reqwest::Client` is reference counted.
#[derive(Clone)]
pub struct ForgeClient {
    http: reqwest::Client,
    endpoints: ForgeConfig,
}

impl ForgeClient {
    /// Build a client with the configured timeout and user agent
    pub fn new(endpoints: ForgeConfig, http: &HttpConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("forgelink/", env!("CARGO_PKG_VERSION")))
            .timeout(http.timeout())
            .build()
            .map_err(|e| AppError::Internal(e.into()))?;

        Ok(Self {
            http: client,
            endpoints,
        })
    }

    /// Consent page URL the browser is sent to from `/authorize`
    pub fn authorize_url(&self, oauth: &OAuthConfig) -> Result<Url, AppError> {
        Url::parse_with_params(
            &self.endpoints.authorize_url,
            &[
                ("client_id", oauth.client_id.as_str()),
                ("redirect_uri", oauth.redirect_uri.as_str()),
                ("scope", OAUTH_SCOPE),
                ("response_type", "code token"),
                ("response_mode", "query"),
            ],
        )
        .map_err(|e| AppError::Config(format!("forge.authorize_url is invalid: {}", e)))
    }

    fn user_endpoint(&self) -> String {
        format!("{}/user", self.endpoints.api_base_url.trim_end_matches('/'))
    }
}

fn record_request(operation: &str, status: &str) {
    use crate::metrics::FORGE_REQUESTS_TOTAL;
    FORGE_REQUESTS_TOTAL
        .with_label_values(&[operation, status])
        .inc();
}
