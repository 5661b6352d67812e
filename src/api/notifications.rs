//! Notification endpoints.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::notification::{BulkResult, DeliveryOutcome, NotificationRequest};
use crate::server::AppState;
use crate::template::TemplateData;
use crate::transport::Attachment;

/// Upper bound on notifications accepted by one bulk call
const MAX_BULK_SIZE: usize = 1000;

/// A notification as received over HTTP
#[derive(Debug, Deserialize)]
pub struct NotificationPayload {
    /// Recipient address
    pub to: String,
    pub subject: Option<String>,
    pub html: Option<String>,
    pub text: Option<String>,
    /// Registered template name
    pub template: Option<String>,
    /// Template data, a JSON object
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub attachments: Vec<AttachmentPayload>,
}

impl NotificationPayload {
    /// Convert to a dispatcher request. Fails when an attachment does not
    /// carry inline content.
    pub fn into_request(self) -> Result<NotificationRequest> {
        let attachments = self
            .attachments
            .into_iter()
            .map(AttachmentPayload::into_attachment)
            .collect::<Result<Vec<_>>>()?;

        Ok(NotificationRequest {
            to: self.to,
            subject: self.subject,
            html: self.html,
            text: self.text,
            template: self
                .template
                .map(|name| TemplateData::from_parts(&name, self.data)),
            attachments,
        })
    }
}

/// An attachment as received over HTTP. Only inline content is accepted;
/// server-side files are never attached on behalf of a caller.
#[derive(Debug, Deserialize)]
pub struct AttachmentPayload {
    pub filename: String,
    pub content: Option<String>,
    pub content_type: Option<String>,
    /// Accepted by the parser only so it can be refused with a 400
    #[serde(default)]
    pub path: Option<String>,
}

impl AttachmentPayload {
    pub fn into_attachment(self) -> Result<Attachment> {
        if self.path.is_some() {
            return Err(AppError::Validation(format!(
                "Attachment '{}': file paths are not accepted, send inline content",
                self.filename
            )));
        }

        if self.filename.trim().is_empty() {
            return Err(AppError::Validation(
                "Attachment filename must not be empty".to_string(),
            ));
        }

        let Some(content) = self.content else {
            return Err(AppError::Validation(format!(
                "Attachment '{}' has no content",
                self.filename
            )));
        };

        let attachment = Attachment::from_content(self.filename, content);
        Ok(match self.content_type {
            Some(content_type) => attachment.with_content_type(content_type),
            None => attachment,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct BulkNotificationRequest {
    pub notifications: Vec<NotificationPayload>,
}

#[derive(Debug, Deserialize)]
pub struct ValidateAddressRequest {
    pub address: String,
}

/// Response for synchronous sends
#[derive(Debug, Serialize)]
pub struct SendNotificationResponse {
    /// Whether the transport accepted the message
    pub success: bool,
    /// "sent", "skipped" or "failed"
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<DeliveryOutcome> for SendNotificationResponse {
    fn from(outcome: DeliveryOutcome) -> Self {
        let success = outcome.is_sent();
        let label = outcome.as_str();

        let (message_id, reason) = match outcome {
            DeliveryOutcome::Sent { message_id } => (Some(message_id), None),
            DeliveryOutcome::Skipped(reason) => (None, Some(reason.to_string())),
            DeliveryOutcome::Failed(failure) => (None, Some(failure.to_string())),
        };

        Self {
            success,
            outcome: label,
            message_id,
            reason,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QueueNotificationResponse {
    pub job_id: Uuid,
    pub queued_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ValidateAddressResponse {
    pub address: String,
    pub valid: bool,
}

/// POST /api/v1/notifications/send - Deliver now
#[tracing::instrument(
    name = "http.send_notification",
    skip(state, payload),
    fields(recipient = %payload.to)
)]
pub async fn send_notification(
    State(state): State<AppState>,
    Json(payload): Json<NotificationPayload>,
) -> Result<Json<SendNotificationResponse>> {
    let outcome = state.dispatcher.send(payload.into_request()?).await;
    Ok(Json(outcome.into()))
}

/// POST /api/v1/notifications/queue - Admit to the job queue
#[tracing::instrument(
    name = "http.queue_notification",
    skip(state, payload),
    fields(recipient = %payload.to)
)]
pub async fn queue_notification(
    State(state): State<AppState>,
    Json(payload): Json<NotificationPayload>,
) -> Result<(StatusCode, Json<QueueNotificationResponse>)> {
    let job_id = state.dispatcher.send_async(payload.into_request()?).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(QueueNotificationResponse {
            job_id,
            queued_at: Utc::now(),
        }),
    ))
}

/// POST /api/v1/notifications/bulk - Admit many notifications
#[tracing::instrument(
    name = "http.bulk_notifications",
    skip(state, request),
    fields(count = request.notifications.len())
)]
pub async fn bulk_notifications(
    State(state): State<AppState>,
    Json(request): Json<BulkNotificationRequest>,
) -> Result<Json<BulkResult>> {
    if request.notifications.len() > MAX_BULK_SIZE {
        return Err(AppError::Validation(format!(
            "At most {} notifications per bulk request",
            MAX_BULK_SIZE
        )));
    }

    let requests = request
        .notifications
        .into_iter()
        .map(NotificationPayload::into_request)
        .collect::<Result<Vec<_>>>()?;

    Ok(Json(state.dispatcher.send_bulk(requests).await))
}

/// POST /api/v1/addresses/validate - Syntactic address check
#[tracing::instrument(name = "http.validate_address", skip(state, request))]
pub async fn validate_address(
    State(state): State<AppState>,
    Json(request): Json<ValidateAddressRequest>,
) -> Json<ValidateAddressResponse> {
    let valid = state.dispatcher.is_valid_address(&request.address);

    Json(ValidateAddressResponse {
        address: request.address,
        valid,
    })
}
