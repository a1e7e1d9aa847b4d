//! Repository clone service
//!
//! Clones a repository URL to local disk by running the version-control
//! executable directly. The URL is validated before anything is spawned
//! and is passed as a single argument, never through a shell.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use url::Url;

use crate::config::CloneConfig;
use crate::error::AppError;

/// Characters that never appear in a clone URL we accept
const FORBIDDEN_CHARACTERS: &[char] = &[
    ';', '|', '&', '$', '`', '<', '>', '(', ')', '\'', '"', '\\', '*', '?', '{', '}', '[', ']',
    '!', '#',
];

/// Narrow interface to the clone collaborator
#[async_trait]
pub trait RepositoryCloner: Send + Sync {
    /// Clone `url` and return the local working directory
    async fn clone_repository(&self, url: &str) -> Result<PathBuf, AppError>;
}

/// A clone URL that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneTarget {
    pub url: Url,
    /// Directory name derived from the last path segment
    pub repo_name: String,
}

/// Validate a clone URL against the configured allow-lists
///
/// # Errors
/// `AppError::Clone` describing the first problem found
pub fn validate_clone_url(raw: &str, config: &CloneConfig) -> Result<CloneTarget, AppError> {
    let reject = |reason: &str| AppError::Clone(format!("refusing to clone {:?}: {}", raw, reason));

    if raw.is_empty() {
        return Err(AppError::Clone("no repository URL given".to_string()));
    }
    if raw.starts_with('-') {
        return Err(reject("URL must not start with '-'"));
    }
    if raw
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || FORBIDDEN_CHARACTERS.contains(&c))
    {
        return Err(reject("URL contains shell metacharacters or whitespace"));
    }

    let url = Url::parse(raw).map_err(|e| reject(&e.to_string()))?;

    if !config
        .allowed_schemes
        .iter()
        .any(|scheme| scheme.eq_ignore_ascii_case(url.scheme()))
    {
        return Err(reject(&format!("scheme {:?} is not allowed", url.scheme())));
    }

    let host = url.host_str().ok_or_else(|| reject("URL has no host"))?;
    if !config.allowed_hosts.is_empty()
        && !config
            .allowed_hosts
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(host))
    {
        return Err(reject(&format!("host {:?} is not allowed", host)));
    }

    if !url.username().is_empty() || url.password().is_some() {
        return Err(reject("URL must not embed credentials"));
    }

    let repo_name = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|segment| segment.strip_suffix(".git").unwrap_or(segment))
        .filter(|name| {
            !name.is_empty()
                && *name != "."
                && *name != ".."
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        })
        .ok_or_else(|| reject("URL does not name a repository"))?
        .to_string();

    Ok(CloneTarget { url, repo_name })
}

/// Clones with the configured version-control program (git by default)
pub struct GitCloner {
    config: CloneConfig,
}

impl GitCloner {
    pub fn new(config: CloneConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl RepositoryCloner for GitCloner {
    async fn clone_repository(&self, url: &str) -> Result<PathBuf, AppError> {
        let target = validate_clone_url(url, &self.config)?;

        tokio::fs::create_dir_all(&self.config.root)
            .await
            .map_err(|e| {
                AppError::Clone(format!(
                    "cannot create {}: {}",
                    self.config.root.display(),
                    e
                ))
            })?;
        let root = tokio::fs::canonicalize(&self.config.root)
            .await
            .map_err(|e| AppError::Internal(e.into()))?;

        let destination = root.join(&target.repo_name);
        if tokio::fs::try_exists(&destination).await.unwrap_or(true) {
            return Err(AppError::Clone(format!(
                "{} already exists",
                destination.display()
            )));
        }

        tracing::info!(url = %target.url, destination = %destination.display(), "Cloning repository");

        let output = Command::new(&self.config.program)
            .arg("clone")
            .arg("--")
            .arg(target.url.as_str())
            .arg(&destination)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    AppError::Clone(format!("{} was not found", self.config.program))
                }
                _ => AppError::Clone(format!("failed to run {}: {}", self.config.program, e)),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr.trim();
            return Err(AppError::Clone(if detail.is_empty() {
                format!("{} exited with {}", self.config.program, output.status)
            } else {
                format!("{} exited with {}: {}", self.config.program, output.status, detail)
            }));
        }

        tracing::info!(destination = %destination.display(), "Repository cloned");
        Ok(destination)
    }
}
