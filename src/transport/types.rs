use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SmtpConfig;

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Transport-specific error type
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Failed to build transport: {0}")]
    Build(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Message rejected: {0}")]
    Rejected(String),

    #[error("Attachment error: {0}")]
    Attachment(String),
}

impl TransportError {
    /// Short label used for the failure metric
    pub fn kind(&self) -> &'static str {
        match self {
            TransportError::Build(_) => "build",
            TransportError::InvalidAddress(_) => "invalid_address",
            TransportError::Connection(_) => "connection",
            TransportError::Rejected(_) => "rejected",
            TransportError::Attachment(_) => "attachment",
        }
    }
}

/// Where an attachment's bytes come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentSource {
    /// Inline content
    Content(String),
    /// File read at delivery time
    Path(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    #[serde(flatten)]
    pub source: AttachmentSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl Attachment {
    pub fn from_content(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            source: AttachmentSource::Content(content.into()),
            content_type: None,
        }
    }

    pub fn from_path(filename: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            filename: filename.into(),
            source: AttachmentSource::Path(path.into()),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn content_type_or_default(&self) -> &str {
        self.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE)
    }
}

/// Envelope sender
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub name: String,
    pub address: String,
}

impl Sender {
    pub fn from_config(config: &SmtpConfig) -> Self {
        Self {
            name: config.from_name.clone(),
            address: config.from_address.clone(),
        }
    }
}

/// A fully rendered message handed to the transport
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub from: Sender,
    pub to: String,
    pub subject: String,
    pub html: Option<String>,
    pub text: Option<String>,
    pub attachments: Vec<Attachment>,
}

/// A live connection able to deliver rendered messages.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Deliver one message. Returns the message identifier.
    async fn deliver(&self, email: &OutboundEmail) -> Result<String, TransportError>;

    /// Check connectivity against the configured endpoint.
    async fn verify(&self) -> Result<(), TransportError>;
}

/// Builds transport handles from settings. Construction performs no I/O.
pub trait TransportConnector: Send + Sync {
    fn connect(&self, config: &SmtpConfig) -> Result<Arc<dyn MailTransport>, TransportError>;
}
