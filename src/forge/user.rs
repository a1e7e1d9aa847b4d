//! Profile and repository listing

use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use url::Url;

use super::models::{Repository, UserProfile};
use super::{ForgeClient, record_request};
use crate::error::{AppError, FetchStage};

impl ForgeClient {
    /// Fetch the authenticated user and their repositories
    ///
    /// Two dependent calls: the profile, then the profile's `repos_url`.
    /// Only the first page of repositories is captured. If either call
    /// fails nothing is returned. `repos_url` must share the origin of
    /// `forge.api_base_url`.
    pub async fn fetch_user(&self, access_token: &str) -> Result<UserProfile, AppError> {
        let mut profile: UserProfile = self
            .get_json(&self.user_endpoint(), access_token, FetchStage::Profile)
            .await?;

        if profile.repositories_url.trim().is_empty() {
            return Err(AppError::Fetch {
                stage: FetchStage::Profile,
                cause: "profile has no repos_url".to_string(),
            });
        }
        self.require_api_origin(&profile.repositories_url)?;

        let repositories: Vec<Repository> = self
            .get_json(
                &profile.repositories_url,
                access_token,
                FetchStage::Repositories,
            )
            .await?;

        tracing::debug!(
            login = %profile.login_name,
            repositories = repositories.len(),
            "Fetched user profile"
        );

        profile.repositories = repositories;
        Ok(profile)
    }

    /// The bearer token only goes to the configured API origin
    fn require_api_origin(&self, repositories_url: &str) -> Result<(), AppError> {
        let fail = |cause: String| AppError::Fetch {
            stage: FetchStage::Repositories,
            cause,
        };

        let api = Url::parse(&self.endpoints.api_base_url)
            .map_err(|e| fail(format!("invalid api base URL: {}", e)))?;
        let target = Url::parse(repositories_url)
            .map_err(|e| fail(format!("invalid repos_url: {}", e)))?;

        if target.origin() != api.origin() {
            tracing::warn!(
                repos_url = %repositories_url,
                "Refusing to send the access token outside the forge API"
            );
            return Err(fail(format!(
                "repos_url {} is not on {}",
                repositories_url,
                api.origin().ascii_serialization()
            )));
        }
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        access_token: &str,
        stage: FetchStage,
    ) -> Result<T, AppError> {
        let fail = |cause: String| AppError::Fetch { stage, cause };

        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                record_request(stage.as_str(), "transport_error");
                fail(e.to_string())
            })?;

        let status = response.status();
        record_request(stage.as_str(), status.as_str());
        if !status.is_success() {
            return Err(fail(format!("HTTP {}", status)));
        }

        let body = response.bytes().await.map_err(|e| fail(e.to_string()))?;
        serde_json::from_slice(&body).map_err(|e| fail(format!("undecodable body: {}", e)))
    }
}
