//! Error types for ForgeLink
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` so handlers can return it directly.

use std::fmt;

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Which half of the user fetch failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    /// `GET /user`
    Profile,
    /// `GET {repos_url}`
    Repositories,
}

impl FetchStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchStage::Profile => "profile",
            FetchStage::Repositories => "repositories",
        }
    }
}

impl fmt::Display for FetchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application-wide error type
///
/// Every variant maps to an HTTP status and a plain-text body.
#[derive(Debug, Error)]
pub enum AppError {
    /// Token endpoint unreachable or returned an undecodable body (502)
    #[error("Token exchange failed: {0}")]
    Exchange(String),

    /// Profile or repository listing call failed (502)
    #[error("Fetching {stage} failed: {cause}")]
    Fetch { stage: FetchStage, cause: String },

    /// Clone command rejected, missing, or exited non-zero (422)
    #[error("Clone failed: {0}")]
    Clone(String),

    /// Requested page has no template (404)
    #[error("Page not found: {0}")]
    TemplateNotFound(String),

    /// Callback arrived without `code` or `error_description` (400)
    #[error("Authorization callback carried neither a code nor an error description")]
    MissingAuthorizationCode,

    /// Template rendering failed (500)
    #[error("Template error: {0}")]
    Template(String),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl AppError {
    /// Label used for the error counter
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Exchange(_) => "exchange",
            AppError::Fetch { .. } => "fetch",
            AppError::Clone(_) => "clone",
            AppError::TemplateNotFound(_) => "template_not_found",
            AppError::MissingAuthorizationCode => "missing_authorization_code",
            AppError::Template(_) => "template",
            AppError::Config(_) => "config",
            AppError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Exchange(_) | AppError::Fetch { .. } => StatusCode::BAD_GATEWAY,
            AppError::Clone(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::TemplateNotFound(_) => StatusCode::NOT_FOUND,
            AppError::MissingAuthorizationCode => StatusCode::BAD_REQUEST,
            AppError::Template(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    /// Convert error to a plain-text HTTP response
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Internal(_) | AppError::Template(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::warn!(error = %self, "Request rejected");
        }

        use crate::metrics::ERRORS_TOTAL;
        ERRORS_TOTAL.with_label_values(&[self.error_type()]).inc();

        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            message,
        )
            .into_response()
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
