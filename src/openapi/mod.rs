//! API documentation module.
//!
//! Builds a `utoipa` OpenAPI document from the configured title,
//! description, version, and tags, and serves the rendered document as
//! JSON at the configured path.

use axum::routing::get;
use axum::Json;
use utoipa::openapi::tag::TagBuilder;
use utoipa::openapi::{InfoBuilder, OpenApi, OpenApiBuilder};

use crate::config::ServerDefaults;
use crate::server::App;

/// Documentation configuration.
#[derive(Debug, Clone)]
pub struct SwaggerOptions {
    pub title: String,
    pub description: Option<String>,
    pub version: String,
    pub tags: Vec<String>,
    /// Route the document is served at.
    pub path: String,
}

impl Default for SwaggerOptions {
    fn default() -> Self {
        Self {
            title: "API".to_string(),
            description: None,
            version: "1.0".to_string(),
            tags: Vec::new(),
            path: ServerDefaults::DOCS_PATH.to_string(),
        }
    }
}

impl SwaggerOptions {
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Build the documentation model.
    pub fn build_document(&self) -> OpenApi {
        let info = InfoBuilder::new()
            .title(self.title.clone())
            .description(self.description.clone())
            .version(self.version.clone())
            .build();
        let tags: Vec<_> = self
            .tags
            .iter()
            .map(|tag| TagBuilder::new().name(tag.clone()).build())
            .collect();
        OpenApiBuilder::new()
            .info(info)
            .tags(if tags.is_empty() { None } else { Some(tags) })
            .build()
    }
}

/// Render the document and expose it. Returns the serving path, normalized
/// to start with `/`.
pub fn install_docs(app: &mut App, options: &SwaggerOptions) -> String {
    let document = options.build_document();
    let handler = move || {
        let document = document.clone();
        async move { Json(document) }
    };
    let path = crate::server::app::normalize_route_path(&options.path);
    app.route(&path, get(handler));
    path
}
