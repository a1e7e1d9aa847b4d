//! E2E tests for the clone action

mod common;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;
use common::{TestServer, repository_json};
use forgelink::auth::SessionHolder;
use forgelink::config::CloneConfig;
use forgelink::error::AppError;
use forgelink::service::{RepositoryCloner, validate_clone_url};
use reqwest::StatusCode;
use serde_json::json;

/// Validates like the real cloner but never spawns a process
#[derive(Default)]
struct RecordingCloner {
    calls: Mutex<Vec<String>>,
}

#[async_trait]
impl RepositoryCloner for RecordingCloner {
    async fn clone_repository(&self, url: &str) -> Result<PathBuf, AppError> {
        let config = CloneConfig {
            root: PathBuf::from("/srv/clones"),
            program: "git".to_string(),
            allowed_schemes: vec!["https".to_string()],
            allowed_hosts: vec!["github.com".to_string()],
        };
        let target = validate_clone_url(url, &config)?;
        self.calls.lock().unwrap().push(url.to_string());
        Ok(config.root.join(target.repo_name))
    }
}

/// Logs in again while the clone is running
#[derive(Default)]
struct ReloginCloner {
    sessions: OnceLock<Arc<SessionHolder>>,
}

#[async_trait]
impl RepositoryCloner for ReloginCloner {
    async fn clone_repository(&self, _url: &str) -> Result<PathBuf, AppError> {
        let sessions = self.sessions.get().unwrap();
        let current = sessions.snapshot().unwrap();
        let mut token = current.access_token.clone();
        token.access_token = "T2".to_string();
        sessions.complete_login(token, current.profile.clone());
        Ok(PathBuf::from("/srv/clones/hello-world"))
    }
}

async fn logged_in_server(cloner: Arc<RecordingCloner>) -> TestServer {
    let server = TestServer::with_cloner(cloner).await;
    server
        .mount_successful_login("abc123", "T", json!([repository_json("hello-world")]))
        .await;
    assert_eq!(server.login("abc123").await.status(), StatusCode::OK);
    server
}

#[tokio::test]
async fn test_clone_renders_location_and_records_it() {
    let cloner = Arc::new(RecordingCloner::default());
    let server = logged_in_server(Arc::clone(&cloner)).await;

    let response = server
        .get("/clone?url=https%3A%2F%2Fgithub.com%2Foctocat%2Fhello-world.git")
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("/srv/clones/hello-world"));
    assert_eq!(
        cloner.calls.lock().unwrap().as_slice(),
        ["https://github.com/octocat/hello-world.git"]
    );

    let record = server
        .state
        .sessions
        .snapshot()
        .unwrap()
        .last_clone
        .clone()
        .unwrap();
    assert_eq!(record.url, "https://github.com/octocat/hello-world.git");
    assert_eq!(record.path, PathBuf::from("/srv/clones/hello-world"));

    let success = server.get("/success").await.text().await.unwrap();
    assert!(success.contains("Last cloned"));
}

#[tokio::test]
async fn test_clone_rejects_shell_metacharacters() {
    let cloner = Arc::new(RecordingCloner::default());
    let server = logged_in_server(Arc::clone(&cloner)).await;

    let response = server
        .get("/clone?url=https%3A%2F%2Fgithub.com%2Foctocat%2Fhello.git%3Btouch%20%2Ftmp%2Fpwned")
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.text().await.unwrap().starts_with("Clone failed"));
    assert!(cloner.calls.lock().unwrap().is_empty());
    assert!(server.state.sessions.snapshot().unwrap().last_clone.is_none());
}

#[tokio::test]
async fn test_clone_without_url_is_rejected() {
    let cloner = Arc::new(RecordingCloner::default());
    let server = logged_in_server(cloner).await;

    let response = server.get("/clone").await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_clone_requires_login() {
    let cloner = Arc::new(RecordingCloner::default());
    let server = TestServer::with_cloner(cloner.clone()).await;

    let response = server
        .get("/clone?url=https%3A%2F%2Fgithub.com%2Foctocat%2Fhello-world.git")
        .await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert!(cloner.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_clone_is_not_recorded_on_a_replacing_session() {
    let cloner = Arc::new(ReloginCloner::default());
    let server = TestServer::with_cloner(cloner.clone()).await;
    server
        .mount_successful_login("abc123", "T", json!([repository_json("hello-world")]))
        .await;
    assert_eq!(server.login("abc123").await.status(), StatusCode::OK);
    cloner
        .sessions
        .set(Arc::clone(&server.state.sessions))
        .unwrap();

    let response = server
        .get("/clone?url=https%3A%2F%2Fgithub.com%2Foctocat%2Fhello-world.git")
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let session = server.state.sessions.snapshot().unwrap();
    assert_eq!(session.access_token.access_token, "T2");
    assert!(session.last_clone.is_none());
}
