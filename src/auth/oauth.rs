//! Code forge OAuth flow
//!
//! Implements the OAuth 2.0 authorization code flow as five browser
//! page transitions: authorize, redirect, error or success.

use axum::{
    Router,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::json;

use crate::AppState;
use crate::error::AppError;
use crate::templates::TemplateId;

/// Create authentication router
///
/// Routes:
/// - GET /authorize - Redirect to the forge's consent page
/// - GET /redirect - OAuth callback
/// - GET /error - Authorization denied
/// - GET /success - Exchange the code, then show the profile
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/authorize", get(authorize))
        .route("/redirect", get(oauth_callback))
        .route("/error", get(error_page))
        .route("/success", get(success_page))
}

// =============================================================================
// Consent
// =============================================================================

/// GET /authorize
///
/// Redirects the browser to the forge's consent page.
async fn authorize(State(state): State<AppState>) -> Result<Redirect, AppError> {
    let url = state.forge.authorize_url(&state.config.oauth)?;
    tracing::debug!(client_id = %state.config.oauth.client_id, "Redirecting to consent page");
    Ok(Redirect::temporary(url.as_str()))
}

// =============================================================================
// Callback
// =============================================================================

/// Query parameters from the forge callback
#[derive(Debug, Deserialize)]
struct CallbackQuery {
    /// Authorization code (on consent)
    code: Option<String>,
    /// Human-readable reason (on denial)
    error_description: Option<String>,
}

/// GET /redirect
///
/// Dispatches the callback to `/success` or `/error`.
async fn oauth_callback(Query(query): Query<CallbackQuery>) -> Result<Redirect, AppError> {
    if let Some(code) = non_blank(query.code.as_deref()) {
        tracing::info!("Authorization granted");
        return Ok(Redirect::temporary(&format!(
            "/success?code={}",
            urlencoding::encode(code)
        )));
    }

    if let Some(description) = non_blank(query.error_description.as_deref()) {
        tracing::info!(error_description = %description, "Authorization denied");
        return Ok(Redirect::temporary(&format!(
            "/error?error_description={}",
            urlencoding::encode(description)
        )));
    }

    Err(AppError::MissingAuthorizationCode)
}

#[derive(Debug, Deserialize)]
struct ErrorQuery {
    error_description: Option<String>,
}

/// GET /error
///
/// Shows the provider's error description, escaped by the template.
async fn error_page(
    State(state): State<AppState>,
    Query(query): Query<ErrorQuery>,
) -> Result<Response, AppError> {
    let Some(description) = non_blank(query.error_description.as_deref()) else {
        return Ok(Redirect::temporary("/").into_response());
    };

    let page = state
        .templates
        .render(TemplateId::Error, &json!({ "error_description": description }))?;
    Ok(page.into_response())
}

// =============================================================================
// Success
// =============================================================================

#[derive(Debug, Deserialize)]
struct SuccessQuery {
    code: Option<String>,
}

/// GET /success
///
/// # Steps
/// 1. With a code: exchange it, fetch the user, replace the session,
///    then redirect to the bare `/success` so a reload never replays
///    the single-use code
/// 2. Without a code: reuse the existing session, no network calls
/// 3. Nobody logged in: back to the home page
async fn success_page(
    State(state): State<AppState>,
    Query(query): Query<SuccessQuery>,
) -> Result<Response, AppError> {
    if let Some(code) = non_blank(query.code.as_deref()) {
        state.login.login(code).await?;
        return Ok(Redirect::to("/success").into_response());
    }

    let Some(session) = state.sessions.snapshot() else {
        return Ok(Redirect::temporary("/").into_response());
    };

    let page = state.templates.render(
        TemplateId::Success,
        &json!({
            "profile": session.profile,
            "last_clone": session.last_clone,
        }),
    )?;
    Ok(page.into_response())
}

// =============================================================================
// Helpers
// =============================================================================

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
