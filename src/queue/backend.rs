//! Job queue trait and the queued job model.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::notification::NotificationRequest;
use crate::template::TemplateData;
use crate::transport::Attachment;

/// Error types for queue operations
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Notification queue is disabled")]
    Disabled,

    #[error("Notification queue is full (size: {size})")]
    Full { size: usize },

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Queue unavailable: {0}")]
    Unavailable(String),
}

/// Content carried by a job so the worker can render it later
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub template_data: Value,
}

/// A notification admitted to the queue.
///
/// Holds raw content plus template name and data, never rendered output
/// or a transport handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationJob {
    pub id: Uuid,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_name: Option<String>,
    #[serde(default)]
    pub payload: JobPayload,
    pub enqueued_at: DateTime<Utc>,
    /// Delivery attempts made by the worker so far
    #[serde(default)]
    pub attempts: u32,
}

impl NotificationJob {
    pub fn from_request(request: &NotificationRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            to: request.to.clone(),
            subject: request.subject.clone(),
            template_name: request.template_name().map(str::to_string),
            payload: JobPayload {
                html: request.html.clone(),
                text: request.text.clone(),
                attachments: request.attachments.clone(),
                template_data: request
                    .template
                    .as_ref()
                    .map(TemplateData::to_value)
                    .unwrap_or(Value::Null),
            },
            enqueued_at: Utc::now(),
            attempts: 0,
        }
    }

    /// Rebuild the request, retyping the template data by name.
    pub fn to_request(&self) -> NotificationRequest {
        NotificationRequest {
            to: self.to.clone(),
            subject: self.subject.clone(),
            html: self.payload.html.clone(),
            text: self.payload.text.clone(),
            template: self
                .template_name
                .as_deref()
                .map(|name| TemplateData::from_parts(name, self.payload.template_data.clone())),
            attachments: self.payload.attachments.clone(),
        }
    }
}

/// Queue collaborator: admits jobs and hands them to the worker in order.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Backend name for health output ("memory", "redis")
    fn backend_type(&self) -> &'static str;

    /// Admit a job. Errors mean the job was not admitted.
    async fn enqueue(&self, job: NotificationJob) -> Result<(), QueueError>;

    /// Take the oldest job, if any.
    async fn dequeue(&self) -> Result<Option<NotificationJob>, QueueError>;

    /// Jobs waiting
    async fn len(&self) -> Result<usize, QueueError>;
}
