//! Authorization code exchange

use reqwest::header::ACCEPT;

use super::models::{AccessToken, TokenEndpointResponse};
use super::{ForgeClient, record_request};
use crate::config::OAuthConfig;
use crate::error::AppError;

impl ForgeClient {
    /// Exchange an authorization code for an access token
    ///
    /// POSTs a form to the token endpoint and asks for JSON back. The
    /// code is not validated here; callers reject blank codes at the
    /// HTTP boundary.
    ///
    /// # Errors
    /// `AppError::Exchange` on transport failure, an undecodable body,
    /// or an error reply from the provider
    pub async fn exchange_code_for_token(
        &self,
        code: &str,
        oauth: &OAuthConfig,
    ) -> Result<AccessToken, AppError> {
        let form = [
            ("client_id", oauth.client_id.as_str()),
            ("client_secret", oauth.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", oauth.redirect_uri.as_str()),
        ];

        let response = self
            .http
            .post(&self.endpoints.token_url)
            .header(ACCEPT, "application/json")
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                record_request("token", "transport_error");
                AppError::Exchange(e.to_string())
            })?;

        let status = response.status();
        record_request("token", status.as_str());

        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::Exchange(e.to_string()))?;

        let decoded: TokenEndpointResponse = serde_json::from_slice(&body).map_err(|e| {
            tracing::warn!(%status, error = %e, "Token endpoint returned an undecodable body");
            AppError::Exchange(format!("undecodable token response (HTTP {}): {}", status, e))
        })?;

        match decoded {
            TokenEndpointResponse::Granted(token) if !token.access_token.trim().is_empty() => {
                tracing::debug!(
                    token_type = %token.token_type,
                    scope = %token.scope,
                    "Authorization code exchanged"
                );
                Ok(token)
            }
            TokenEndpointResponse::Granted(_) => Err(AppError::Exchange(
                "token endpoint returned an empty access token".to_string(),
            )),
            TokenEndpointResponse::Denied(denied) => {
                let detail = denied.error_description.unwrap_or(denied.error);
                Err(AppError::Exchange(detail))
            }
        }
    }
}
