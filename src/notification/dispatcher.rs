use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use uuid::Uuid;

use crate::metrics::{DeliveryMetrics, QueueMetrics};
use crate::queue::{JobQueue, NotificationJob, QueueError};
use crate::template::{TemplateError, TemplateRegistry};
use crate::transport::{OutboundEmail, Sender, TransportManager, TransportStatus};

use super::address;
use super::types::{BulkResult, DeliveryFailure, DeliveryOutcome, NotificationRequest, SkipReason};

/// Statistics for the notification dispatcher
#[derive(Debug, Default)]
pub struct DispatcherStats {
    /// Messages accepted by the transport
    pub sent: AtomicU64,
    /// Sends skipped for lack of a transport
    pub skipped: AtomicU64,
    /// Sends that failed validation or delivery
    pub failed: AtomicU64,
    /// Jobs admitted to the queue
    pub queued: AtomicU64,
    /// Jobs the queue refused
    pub queue_failures: AtomicU64,
}

impl DispatcherStats {
    pub fn snapshot(&self) -> DispatcherStatsSnapshot {
        DispatcherStatsSnapshot {
            sent: self.sent.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            queued: self.queued.load(Ordering::Relaxed),
            queue_failures: self.queue_failures.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of dispatcher statistics
#[derive(Debug, Clone, Serialize)]
pub struct DispatcherStatsSnapshot {
    pub sent: u64,
    pub skipped: u64,
    pub failed: u64,
    pub queued: u64,
    pub queue_failures: u64,
}

/// Subject and bodies after template resolution
struct ResolvedContent {
    subject: Option<String>,
    html: Option<String>,
    text: Option<String>,
}

/// Turns notification requests into delivered or queued messages
pub struct NotificationDispatcher {
    registry: Arc<TemplateRegistry>,
    transport: Arc<TransportManager>,
    queue: Arc<dyn JobQueue>,
    sender: Sender,
    stats: DispatcherStats,
}

impl NotificationDispatcher {
    pub fn new(
        registry: Arc<TemplateRegistry>,
        transport: Arc<TransportManager>,
        queue: Arc<dyn JobQueue>,
        sender: Sender,
    ) -> Self {
        Self {
            registry,
            transport,
            queue,
            sender,
            stats: DispatcherStats::default(),
        }
    }

    /// Get dispatcher statistics
    pub fn stats(&self) -> DispatcherStatsSnapshot {
        self.stats.snapshot()
    }

    /// Transport status, as reported by the transport manager
    pub fn status(&self) -> TransportStatus {
        self.transport.status()
    }

    pub fn is_valid_address(&self, address: &str) -> bool {
        address::is_valid_address(address)
    }

    pub fn queue_backend(&self) -> &'static str {
        self.queue.backend_type()
    }

    /// Deliver one notification now.
    ///
    /// Never returns an error: a missing transport yields `Skipped`, anything
    /// else that goes wrong yields `Failed`.
    #[tracing::instrument(
        name = "dispatcher.send",
        skip(self, request),
        fields(
            recipient = %request.to,
            template = request.template_name().unwrap_or("-")
        )
    )]
    pub async fn send(&self, request: NotificationRequest) -> DeliveryOutcome {
        let content = self.resolve(&request);

        let Some(transport) = self.transport.handle().await else {
            self.stats.skipped.fetch_add(1, Ordering::Relaxed);
            DeliveryMetrics::record_skipped();
            tracing::info!(
                recipient = %request.to,
                "No mail transport available, notification skipped"
            );
            return DeliveryOutcome::Skipped(SkipReason::TransportUnavailable);
        };

        if !address::is_valid_address(&request.to) {
            return self.fail(&request.to, DeliveryFailure::InvalidRecipient(request.to.clone()));
        }

        let Some(subject) = content.subject else {
            return self.fail(&request.to, DeliveryFailure::MissingSubject);
        };

        if content.html.is_none() && content.text.is_none() {
            return self.fail(&request.to, DeliveryFailure::EmptyBody);
        }

        let email = OutboundEmail {
            from: self.sender.clone(),
            to: request.to,
            subject,
            html: content.html,
            text: content.text,
            attachments: request.attachments,
        };

        let started = Instant::now();
        match transport.deliver(&email).await {
            Ok(message_id) => {
                self.stats.sent.fetch_add(1, Ordering::Relaxed);
                DeliveryMetrics::record_sent(started.elapsed());

                tracing::info!(
                    recipient = %email.to,
                    message_id = %message_id,
                    "Notification sent"
                );
                DeliveryOutcome::Sent { message_id }
            }
            Err(e) => self.fail(&email.to, DeliveryFailure::Transport(e)),
        }
    }

    /// Admit a notification to the queue. Returns the job id.
    ///
    /// Unlike `send`, admission errors are returned to the caller.
    #[tracing::instrument(
        name = "dispatcher.send_async",
        skip(self, request),
        fields(recipient = %request.to)
    )]
    pub async fn send_async(&self, request: NotificationRequest) -> Result<Uuid, QueueError> {
        let job = NotificationJob::from_request(&request);
        let job_id = job.id;

        match self.queue.enqueue(job).await {
            Ok(()) => {
                self.stats.queued.fetch_add(1, Ordering::Relaxed);
                QueueMetrics::record_enqueued();
                tracing::debug!(job_id = %job_id, "Notification queued");
                Ok(job_id)
            }
            Err(e) => {
                self.stats.queue_failures.fetch_add(1, Ordering::Relaxed);
                QueueMetrics::record_rejected();
                tracing::warn!(
                    recipient = %request.to,
                    error = %e,
                    "Failed to queue notification"
                );
                Err(e)
            }
        }
    }

    /// Queue every request in order. A rejected request is counted and the
    /// batch continues.
    #[tracing::instrument(
        name = "dispatcher.send_bulk",
        skip(self, requests),
        fields(request_count = requests.len())
    )]
    pub async fn send_bulk(&self, requests: Vec<NotificationRequest>) -> BulkResult {
        let mut result = BulkResult::default();

        for request in requests {
            match self.send_async(request).await {
                Ok(_) => result.success_count += 1,
                Err(_) => result.failed_count += 1,
            }
        }

        tracing::info!(
            success = result.success_count,
            failed = result.failed_count,
            "Bulk notifications queued"
        );

        result
    }

    /// Deliver a job taken from the queue, re-rendering its template.
    pub async fn deliver_job(&self, job: &NotificationJob) -> DeliveryOutcome {
        self.send(job.to_request()).await
    }

    /// Apply the template, if one is named and registered. A miss keeps the
    /// caller's raw content.
    fn resolve(&self, request: &NotificationRequest) -> ResolvedContent {
        let raw = || ResolvedContent {
            subject: non_blank(request.subject.clone()),
            html: non_blank(request.html.clone()),
            text: non_blank(request.text.clone()),
        };

        let Some(data) = &request.template else {
            return raw();
        };

        match self.registry.resolve(data.name(), data) {
            Ok(rendered) => ResolvedContent {
                subject: non_blank(Some(rendered.subject)),
                html: non_blank(Some(rendered.html)),
                text: non_blank(rendered.text),
            },
            Err(TemplateError::NotFound(name)) => {
                tracing::debug!(template = %name, "Template not registered, using raw content");
                raw()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Template resolution failed, using raw content");
                raw()
            }
        }
    }

    fn fail(&self, recipient: &str, failure: DeliveryFailure) -> DeliveryOutcome {
        self.stats.failed.fetch_add(1, Ordering::Relaxed);
        DeliveryMetrics::record_failed(failure.reason());

        tracing::warn!(
            recipient = %recipient,
            error = %failure,
            "Notification delivery failed"
        );

        DeliveryOutcome::Failed(failure)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
