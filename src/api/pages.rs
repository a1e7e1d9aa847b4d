//! Page routes outside the OAuth flow
//!
//! Home page, clone action and the not-found fallback.

use axum::{
    Router,
    extract::{Query, State},
    http::Uri,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::json;

use crate::AppState;
use crate::auth::CloneRecord;
use crate::error::AppError;
use crate::templates::TemplateId;

/// Create page router
///
/// Routes:
/// - GET / - Redirect to /index
/// - GET /index - Home page
/// - GET /clone?url= - Clone a repository
pub fn pages_router() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::temporary("/index") }))
        .route("/index", get(index_page))
        .route("/clone", get(clone_repository))
}

/// GET /index
async fn index_page(State(state): State<AppState>) -> Result<Response, AppError> {
    if state.sessions.is_authenticated() {
        return Ok(Redirect::temporary("/success").into_response());
    }

    Ok(state
        .templates
        .render(TemplateId::Index, &json!({}))?
        .into_response())
}

#[derive(Debug, Deserialize)]
struct CloneQuery {
    #[serde(default)]
    url: String,
}

/// GET /clone?url=<repo-url>
///
/// Clones into the configured root and remembers the result on the
/// session. Requires a logged-in user.
async fn clone_repository(
    State(state): State<AppState>,
    Query(query): Query<CloneQuery>,
) -> Result<Response, AppError> {
    let Some(session) = state.sessions.snapshot() else {
        return Ok(Redirect::temporary("/").into_response());
    };

    let url = query.url.trim();
    let result = state.cloner.clone_repository(url).await;

    use crate::metrics::CLONES_TOTAL;
    let outcome = if result.is_ok() { "success" } else { "failure" };
    CLONES_TOTAL.with_label_values(&[outcome]).inc();

    let record = CloneRecord {
        url: url.to_string(),
        path: result?,
    };
    if !state.sessions.record_clone(&session, record.clone()) {
        tracing::warn!(url = %record.url, "Session changed during the clone; record dropped");
    }

    Ok(state
        .templates
        .render(
            TemplateId::Clone,
            &json!({
                "profile": session.profile,
                "clone": record,
            }),
        )?
        .into_response())
}

/// Fallback for paths with no page
pub(crate) async fn page_not_found(uri: Uri) -> AppError {
    AppError::TemplateNotFound(uri.path().to_string())
}
