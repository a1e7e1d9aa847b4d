//! Page templates
//!
//! Every page has an explicit template id. All templates are read and
//! compiled once at startup; a missing or broken file aborts the process.

use std::path::Path;
use std::sync::Arc;

use axum::response::Html;
use handlebars::{Handlebars, handlebars_helper};
use serde::Serialize;

use crate::error::AppError;

/// Pages the router can render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateId {
    Index,
    Error,
    Success,
    Clone,
}

impl TemplateId {
    pub const ALL: [TemplateId; 4] = [
        TemplateId::Index,
        TemplateId::Error,
        TemplateId::Success,
        TemplateId::Clone,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TemplateId::Index => "index",
            TemplateId::Error => "error",
            TemplateId::Success => "success",
            TemplateId::Clone => "clone",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            TemplateId::Index => "index.html",
            TemplateId::Error => "error.html",
            TemplateId::Success => "success.html",
            TemplateId::Clone => "clone.html",
        }
    }
}

// Percent-encodes a value for use inside a query string
handlebars_helper!(url_encode: |value: str| urlencoding::encode(value).into_owned());

/// Compiled template registry
#[derive(Clone)]
pub struct Templates {
    registry: Arc<Handlebars<'static>>,
}

impl Templates {
    /// Load every required template from `dir`
    ///
    /// # Errors
    /// `AppError::Config` if a template is missing or fails to parse
    pub fn load(dir: &Path) -> Result<Self, AppError> {
        let mut registry = Handlebars::new();
        registry.register_helper("url_encode", Box::new(url_encode));

        for id in TemplateId::ALL {
            let path = dir.join(id.file_name());
            if !path.is_file() {
                return Err(AppError::Config(format!(
                    "required template {} not found",
                    path.display()
                )));
            }
            registry
                .register_template_file(id.name(), &path)
                .map_err(|e| {
                    AppError::Config(format!("template {} is invalid: {}", path.display(), e))
                })?;
        }

        tracing::info!(dir = %dir.display(), "Templates loaded");
        Ok(Self {
            registry: Arc::new(registry),
        })
    }

    /// Render a page; values are HTML-escaped
    pub fn render<T: Serialize>(&self, id: TemplateId, data: &T) -> Result<Html<String>, AppError> {
        self.registry
            .render(id.name(), data)
            .map(Html)
            .map_err(|e| AppError::Template(e.to_string()))
    }
}
