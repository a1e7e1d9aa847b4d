//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration files (config/default.toml, config/local.toml)
//! 3. Environment variables (FORGELINK__*)
//! 4. The well-known OAuth app variables (OAUTH_CLIENT_ID, OAUTH_CLIENT_SECRET,
//!    OAUTH_REDIRECT_URI, LISTEN_ADDR), which win over everything else

use serde::Deserialize;
use std::{net::SocketAddr, path::PathBuf, time::Duration};

use crate::error::AppError;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub oauth: OAuthConfig,
    pub forge: ForgeConfig,
    pub http: HttpConfig,
    pub templates: TemplatesConfig,
    pub clone: CloneConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:8000" or ":8000")
    pub listen_addr: String,
}

impl ServerConfig {
    /// Parse the listen address
    ///
    /// A bare `:port` binds every interface.
    pub fn socket_addr(&self) -> Result<SocketAddr, AppError> {
        let raw = self.listen_addr.trim();
        let normalized = match raw.strip_prefix(':') {
            Some(port) => format!("0.0.0.0:{}", port),
            None => raw.to_string(),
        };
        normalized.parse().map_err(|_| {
            AppError::Config(format!(
                "server.listen_addr {:?} is not a valid socket address",
                self.listen_addr
            ))
        })
    }
}

/// OAuth app registration values
#[derive(Clone, Deserialize)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Callback URL registered with the forge (points at `/redirect`)
    pub redirect_uri: String,
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

/// Code forge endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct ForgeConfig {
    /// Consent page (e.g., "https://github.com/login/oauth/authorize")
    pub authorize_url: String,
    /// Token endpoint (e.g., "https://github.com/login/oauth/access_token")
    pub token_url: String,
    /// REST API root (e.g., "https://api.github.com")
    pub api_base_url: String,
}

/// Outbound HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds (default: 30)
    pub timeout_seconds: u64,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Template configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TemplatesConfig {
    /// Directory holding index.html, error.html, success.html and clone.html
    pub dir: PathBuf,
}

/// Clone action configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CloneConfig {
    /// Directory repositories are cloned into
    pub root: PathBuf,
    /// Version-control executable (default: "git")
    pub program: String,
    /// URL schemes accepted for cloning (default: ["https"])
    pub allowed_schemes: Vec<String>,
    /// Hosts accepted for cloning; empty allows any host
    pub allowed_hosts: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Errors
    /// Returns error if configuration is invalid or required
    /// OAuth values are missing
    pub fn load() -> Result<Self, AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            // Start with default values
            .set_default("server.listen_addr", "127.0.0.1:8000")?
            .set_default("oauth.client_id", "")?
            .set_default("oauth.client_secret", "")?
            .set_default("oauth.redirect_uri", "")?
            .set_default("forge.authorize_url", "https://github.com/login/oauth/authorize")?
            .set_default("forge.token_url", "https://github.com/login/oauth/access_token")?
            .set_default("forge.api_base_url", "https://api.github.com")?
            .set_default("http.timeout_seconds", 30)?
            .set_default("templates.dir", "html")?
            .set_default("clone.root", "clones")?
            .set_default("clone.program", "git")?
            .set_default("clone.allowed_schemes", vec!["https"])?
            .set_default("clone.allowed_hosts", vec!["github.com"])?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (FORGELINK__*)
            .add_source(
                Environment::with_prefix("FORGELINK")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("clone.allowed_schemes")
                    .with_list_parse_key("clone.allowed_hosts"),
            )
            .set_override_option("oauth.client_id", env_value("OAUTH_CLIENT_ID"))?
            .set_override_option("oauth.client_secret", env_value("OAUTH_CLIENT_SECRET"))?
            .set_override_option("oauth.redirect_uri", env_value("OAUTH_REDIRECT_URI"))?
            .set_override_option("server.listen_addr", env_value("LISTEN_ADDR"))?
            .build()?;

        let app_config: Self = config.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }

    pub(crate) fn validate(&self) -> Result<(), AppError> {
        let required = [
            ("oauth.client_id (OAUTH_CLIENT_ID)", &self.oauth.client_id),
            (
                "oauth.client_secret (OAUTH_CLIENT_SECRET)",
                &self.oauth.client_secret,
            ),
            (
                "oauth.redirect_uri (OAUTH_REDIRECT_URI)",
                &self.oauth.redirect_uri,
            ),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(AppError::Config(format!("{} must not be empty", key)));
            }
        }

        let urls = [
            ("oauth.redirect_uri", &self.oauth.redirect_uri),
            ("forge.authorize_url", &self.forge.authorize_url),
            ("forge.token_url", &self.forge.token_url),
            ("forge.api_base_url", &self.forge.api_base_url),
        ];
        for (key, value) in urls {
            require_http_url(key, value)?;
        }

        self.server.socket_addr()?;

        if self.http.timeout_seconds == 0 {
            return Err(AppError::Config(
                "http.timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if self.clone.allowed_schemes.is_empty() {
            return Err(AppError::Config(
                "clone.allowed_schemes must list at least one scheme".to_string(),
            ));
        }

        if self.clone.program.trim().is_empty() {
            return Err(AppError::Config(
                "clone.program must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

fn require_http_url(key: &str, value: &str) -> Result<(), AppError> {
    let parsed = url::Url::parse(value.trim())
        .map_err(|e| AppError::Config(format!("{} is not a valid URL: {}", key, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(AppError::Config(format!(
            "{} must be an absolute http(s) URL",
            key
        )));
    }
    Ok(())
}
