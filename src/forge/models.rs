//! Code forge API payloads
//!
//! Field names follow the GitHub REST API.

use serde::{Deserialize, Serialize};

/// Successful token endpoint response
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub scope: String,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Error body the token endpoint returns with HTTP 200
#[derive(Debug, Deserialize)]
pub(crate) struct TokenErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Token endpoint reply, either shape
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum TokenEndpointResponse {
    Granted(AccessToken),
    Denied(TokenErrorResponse),
}

/// Authenticated user (or a repository owner)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "login")]
    pub login_name: String,
    #[serde(rename = "url", default)]
    pub profile_url: String,
    #[serde(rename = "repos_url", default)]
    pub repositories_url: String,
    #[serde(rename = "type", default)]
    pub account_type: String,
    #[serde(rename = "site_admin", default)]
    pub is_site_admin: bool,
    /// First page of `repositories_url`; empty for repository owners
    #[serde(default)]
    pub repositories: Vec<Repository>,
}

/// Repository snapshot from the listing endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "private", default)]
    pub is_private: bool,
    pub owner: UserProfile,
    #[serde(rename = "url", default)]
    pub api_url: String,
    #[serde(default)]
    pub clone_url: String,
    #[serde(rename = "language", default)]
    pub primary_language: Option<String>,
}
