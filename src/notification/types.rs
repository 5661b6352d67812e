use serde::Serialize;
use thiserror::Error;

use crate::template::TemplateData;
use crate::transport::{Attachment, TransportError};

/// One caller's intent to deliver one message to one recipient.
///
/// When `template` is set and registered, the rendered subject, html and
/// text replace whatever the caller supplied. When it is set but not
/// registered, the raw fields are sent as given.
#[derive(Debug, Clone, Default)]
pub struct NotificationRequest {
    pub to: String,
    pub subject: Option<String>,
    pub html: Option<String>,
    pub text: Option<String>,
    pub template: Option<TemplateData>,
    pub attachments: Vec<Attachment>,
}

impl NotificationRequest {
    pub fn new(to: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            ..Default::default()
        }
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn template(mut self, data: TemplateData) -> Self {
        self.template = Some(data);
        self
    }

    pub fn attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn template_name(&self) -> Option<&str> {
        self.template.as_ref().map(TemplateData::name)
    }
}

/// Why a send was not attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No transport is configured, or the configured one is down
    TransportUnavailable,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::TransportUnavailable => "transport_unavailable",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an attempted send failed
#[derive(Debug, Clone, Error)]
pub enum DeliveryFailure {
    #[error("Invalid recipient address: {0}")]
    InvalidRecipient(String),

    #[error("Message has no subject")]
    MissingSubject,

    #[error("Message has neither an html nor a text body")]
    EmptyBody,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl DeliveryFailure {
    /// Short label used for the failure metric
    pub fn reason(&self) -> &'static str {
        match self {
            DeliveryFailure::InvalidRecipient(_) => "invalid_recipient",
            DeliveryFailure::MissingSubject => "missing_subject",
            DeliveryFailure::EmptyBody => "empty_body",
            DeliveryFailure::Transport(e) => e.kind(),
        }
    }

    /// Whether another attempt could succeed. Malformed messages never will.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DeliveryFailure::Transport(
                TransportError::Connection(_) | TransportError::Rejected(_)
            )
        )
    }
}

/// Result of a synchronous send. Never an error value: transport problems
/// end up in `Failed`.
#[derive(Debug, Clone)]
pub enum DeliveryOutcome {
    Sent { message_id: String },
    Skipped(SkipReason),
    Failed(DeliveryFailure),
}

impl DeliveryOutcome {
    /// The boolean contract: true only when the transport accepted the message
    pub fn is_sent(&self) -> bool {
        matches!(self, DeliveryOutcome::Sent { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, DeliveryOutcome::Skipped(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryOutcome::Sent { .. } => "sent",
            DeliveryOutcome::Skipped(_) => "skipped",
            DeliveryOutcome::Failed(_) => "failed",
        }
    }
}

/// Admission tally of a bulk send
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BulkResult {
    pub success_count: usize,
    pub failed_count: usize,
}

impl BulkResult {
    pub fn total(&self) -> usize {
        self.success_count + self.failed_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::PasswordReset;

    #[test]
    fn test_request_builder() {
        let request = NotificationRequest::new("alice@example.com")
            .subject("Hello")
            .text("Hi")
            .template(TemplateData::PasswordReset(PasswordReset::default()))
            .attachment(Attachment::from_content("a.txt", "a"));

        assert_eq!(request.to, "alice@example.com");
        assert_eq!(request.subject.as_deref(), Some("Hello"));
        assert!(request.html.is_none());
        assert_eq!(request.template_name(), Some("password-reset"));
        assert_eq!(request.attachments.len(), 1);
    }

    #[test]
    fn test_outcome_flags() {
        let sent = DeliveryOutcome::Sent {
            message_id: "<1@example.com>".to_string(),
        };
        assert!(sent.is_sent());
        assert_eq!(sent.as_str(), "sent");

        let skipped = DeliveryOutcome::Skipped(SkipReason::TransportUnavailable);
        assert!(!skipped.is_sent());
        assert!(skipped.is_skipped());

        let failed = DeliveryOutcome::Failed(DeliveryFailure::MissingSubject);
        assert!(!failed.is_sent());
        assert_eq!(failed.as_str(), "failed");
    }

    #[test]
    fn test_failure_reasons() {
        assert_eq!(
            DeliveryFailure::InvalidRecipient("x".into()).reason(),
            "invalid_recipient"
        );
        assert_eq!(
            DeliveryFailure::Transport(TransportError::Connection("down".into())).reason(),
            "connection"
        );
    }

    #[test]
    fn test_only_transport_failures_retry() {
        assert!(DeliveryFailure::Transport(TransportError::Connection("x".into())).is_retryable());
        assert!(!DeliveryFailure::Transport(TransportError::InvalidAddress("x".into())).is_retryable());
        assert!(!DeliveryFailure::EmptyBody.is_retryable());
    }

    #[test]
    fn test_bulk_result_total() {
        let result = BulkResult {
            success_count: 2,
            failed_count: 1,
        };
        assert_eq!(result.total(), 3);
    }
}
