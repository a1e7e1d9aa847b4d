//! Common test utilities for E2E tests

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use forgelink::{AppState, config, service::RepositoryCloner};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN_PATH: &str = "/login/oauth/access_token";

/// Test server instance backed by a fake code forge
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub forge: MockServer,
    pub _temp_dir: TempDir,
    /// Client that does not follow redirects
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        Self::build(None).await
    }

    /// Create a test server with a custom clone collaborator
    pub async fn with_cloner(cloner: Arc<dyn RepositoryCloner>) -> Self {
        Self::build(Some(cloner)).await
    }

    async fn build(cloner: Option<Arc<dyn RepositoryCloner>>) -> Self {
        forgelink::metrics::init_metrics();

        let forge = MockServer::start().await;
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&forge, temp_dir.path().join("clones"));

        let mut state = AppState::new(config).unwrap();
        if let Some(cloner) = cloner {
            state = state.with_cloner(cloner);
        }

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = forgelink::build_router(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr: format!("http://{}", addr),
            state,
            forge,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// GET without following redirects
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    /// Mount a token endpoint, profile and repository listing that all succeed
    ///
    /// Each endpoint expects exactly one call.
    pub async fn mount_successful_login(&self, code: &str, token: &str, repositories: Value) {
        mount_token_endpoint(
            &self.forge,
            code,
            ResponseTemplate::new(200).set_body_json(token_json(token)),
        )
        .await;

        Mock::given(method("GET"))
            .and(path("/user"))
            .and(header("authorization", format!("Bearer {}", token).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile_json(&self.forge)))
            .expect(1)
            .mount(&self.forge)
            .await;

        Mock::given(method("GET"))
            .and(path("/users/octocat/repos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(repositories))
            .expect(1)
            .mount(&self.forge)
            .await;
    }

    /// Drive the browser flow from the callback through `/success`
    ///
    /// Follows redirects like a browser and returns the first page that
    /// is not one.
    pub async fn login(&self, code: &str) -> reqwest::Response {
        let mut response = self.get(&format!("/redirect?code={}", code)).await;
        assert_eq!(response.status(), reqwest::StatusCode::TEMPORARY_REDIRECT);

        for _ in 0..5 {
            if !response.status().is_redirection() {
                return response;
            }
            let location = response.headers()[reqwest::header::LOCATION]
                .to_str()
                .unwrap()
                .to_string();
            response = self.get(&location).await;
        }
        panic!("too many redirects while logging in with {}", code);
    }
}

/// Configuration pointing every forge endpoint at the mock server
pub fn test_config(forge: &MockServer, clone_root: PathBuf) -> config::AppConfig {
    config::AppConfig {
        server: config::ServerConfig {
            listen_addr: "127.0.0.1:0".to_string(),
        },
        oauth: config::OAuthConfig {
            client_id: "test-client-id".to_string(),
            client_secret: "test-client-secret".to_string(),
            redirect_uri: "http://localhost:8000/redirect".to_string(),
        },
        forge: config::ForgeConfig {
            authorize_url: "https://github.com/login/oauth/authorize".to_string(),
            token_url: format!("{}{}", forge.uri(), TOKEN_PATH),
            api_base_url: forge.uri(),
        },
        http: config::HttpConfig { timeout_seconds: 5 },
        templates: config::TemplatesConfig {
            dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/html")),
        },
        clone: config::CloneConfig {
            root: clone_root,
            program: "git".to_string(),
            allowed_schemes: vec!["https".to_string()],
            allowed_hosts: vec!["github.com".to_string()],
        },
        logging: config::LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        },
    }
}

/// Token endpoint that expects `code` once
pub async fn mount_token_endpoint(forge: &MockServer, code: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(header("accept", "application/json"))
        .and(body_string_contains(format!("code={}", code).as_str()))
        .respond_with(response)
        .expect(1)
        .mount(forge)
        .await;
}

pub fn token_json(token: &str) -> Value {
    json!({
        "access_token": token,
        "token_type": "bearer",
        "scope": "repo"
    })
}

pub fn profile_json(forge: &MockServer) -> Value {
    json!({
        "login": "octocat",
        "id": 1,
        "url": format!("{}/users/octocat", forge.uri()),
        "html_url": "https://github.com/octocat",
        "repos_url": format!("{}/users/octocat/repos", forge.uri()),
        "type": "User",
        "site_admin": false
    })
}

pub fn repository_json(name: &str) -> Value {
    json!({
        "id": 1296269,
        "name": name,
        "full_name": format!("octocat/{}", name),
        "description": format!("{} description", name),
        "private": false,
        "owner": {
            "login": "octocat",
            "url": "https://api.github.com/users/octocat",
            "type": "User",
            "site_admin": false
        },
        "url": format!("https://api.github.com/repos/octocat/{}", name),
        "clone_url": format!("https://github.com/octocat/{}.git", name),
        "language": "Rust"
    })
}
