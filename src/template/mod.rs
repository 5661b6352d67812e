//! Notification template registry.
//!
//! This module provides:
//! - Typed template data, one variant per built-in template
//! - The five built-in templates (welcome, verification, password reset,
//!   file share, storage quota)
//! - Configuration-declared templates with `{{variable}}` placeholders
//! - A registry mapping template names to pure render functions
//!
//! # Example
//!
//! ```ignore
//! let registry = TemplateRegistry::with_builtin("Ara");
//!
//! let data = TemplateData::PasswordReset(PasswordReset {
//!     username: "alice".to_string(),
//!     reset_url: "https://app.example.com/reset?token=abc".to_string(),
//! });
//!
//! let rendered = registry.resolve(data.name(), &data)?;
//! ```

pub mod builtin;
pub mod data;
pub mod substitution;

use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use thiserror::Error;

pub use data::{
    AccountWelcome, EmailVerification, FileShareNotice, PasswordReset, StorageQuotaWarning,
    TemplateData,
};
pub use substitution::PlaceholderTemplate;

/// Template-specific error type
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Invalid template: {0}")]
    InvalidTemplate(String),
}

/// Result type for template operations
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Output of a render function
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedMessage {
    pub subject: String,
    pub html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// A pure render function: no I/O, same data in, same message out.
pub type RenderFn = Arc<dyn Fn(&TemplateData) -> RenderedMessage + Send + Sync>;

/// Name-keyed render functions
pub struct TemplateRegistry {
    renderers: DashMap<String, RenderFn>,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            renderers: DashMap::new(),
        }
    }

    /// Create a registry holding the built-in templates
    pub fn with_builtin(product_name: &str) -> Self {
        let registry = Self::new();
        builtin::register_builtins(&registry, product_name);
        registry
    }

    /// Store a renderer under `name`. An existing entry is replaced.
    ///
    /// Returns `true` when an earlier renderer was replaced.
    pub fn register<F>(&self, name: impl Into<String>, render: F) -> bool
    where
        F: Fn(&TemplateData) -> RenderedMessage + Send + Sync + 'static,
    {
        let name = name.into();
        let replaced = self
            .renderers
            .insert(name.clone(), Arc::new(render))
            .is_some();

        if replaced {
            tracing::debug!(template = %name, "Template renderer replaced");
        }

        replaced
    }

    /// Register a configuration-declared template after validating it
    pub fn register_placeholder(&self, template: PlaceholderTemplate) -> TemplateResult<()> {
        template.validate()?;

        let name = template.name.clone();
        self.register(name, move |data: &TemplateData| template.render(data));
        Ok(())
    }

    /// Render `data` with the template registered under `name`
    pub fn resolve(&self, name: &str, data: &TemplateData) -> TemplateResult<RenderedMessage> {
        // Clone the Arc so the shard lock is released before rendering
        let render = self
            .renderers
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))?;

        Ok(render(data))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.renderers.contains_key(name)
    }

    /// Registered template names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .renderers
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }
}

/// Escape text for interpolation into HTML
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
