//! Dispatch integration tests
//!
//! These tests wire the registry, transport manager, queue, dispatcher and
//! worker together against an in-process mail transport. No SMTP server or
//! Redis is required.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use ara_mail_dispatch::config::{SmtpConfig, WorkerConfig};
use ara_mail_dispatch::notification::{
    DeliveryFailure, DeliveryOutcome, NotificationDispatcher, NotificationRequest, SkipReason,
};
use ara_mail_dispatch::queue::{
    JobDisposition, JobQueue, MemoryJobQueue, NotificationJob, NotificationWorker, QueueError,
};
use ara_mail_dispatch::template::{PasswordReset, PlaceholderTemplate, TemplateData, TemplateRegistry};
use ara_mail_dispatch::transport::{
    Attachment, MailTransport, OutboundEmail, Sender, TransportConnector, TransportError,
    TransportManager, TransportState,
};

// ============================================================================
// Test doubles
// ============================================================================

/// Records every delivered message; fails with a connection error when
/// marked unhealthy.
#[derive(Default)]
struct RecordingMailbox {
    delivered: Mutex<Vec<OutboundEmail>>,
    unhealthy: AtomicBool,
}

impl RecordingMailbox {
    fn delivered(&self) -> Vec<OutboundEmail> {
        self.delivered.lock().unwrap().clone()
    }

    fn set_healthy(&self, healthy: bool) {
        self.unhealthy.store(!healthy, Ordering::SeqCst);
    }
}

struct RecordingTransport {
    mailbox: Arc<RecordingMailbox>,
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn deliver(&self, email: &OutboundEmail) -> Result<String, TransportError> {
        if self.mailbox.unhealthy.load(Ordering::SeqCst) {
            return Err(TransportError::Connection("connection reset".to_string()));
        }

        let mut delivered = self.mailbox.delivered.lock().unwrap();
        delivered.push(email.clone());
        Ok(format!("<{}@test.local>", delivered.len()))
    }

    async fn verify(&self) -> Result<(), TransportError> {
        if self.mailbox.unhealthy.load(Ordering::SeqCst) {
            Err(TransportError::Connection("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

struct RecordingConnector {
    mailbox: Arc<RecordingMailbox>,
}

impl TransportConnector for RecordingConnector {
    fn connect(&self, _config: &SmtpConfig) -> Result<Arc<dyn MailTransport>, TransportError> {
        Ok(Arc::new(RecordingTransport {
            mailbox: Arc::clone(&self.mailbox),
        }))
    }
}

/// Rejects the second job it is offered and admits the rest
struct RejectSecondQueue {
    offered: AtomicUsize,
    inner: MemoryJobQueue,
}

impl RejectSecondQueue {
    fn new() -> Self {
        Self {
            offered: AtomicUsize::new(0),
            inner: MemoryJobQueue::with_capacity(100),
        }
    }
}

#[async_trait]
impl JobQueue for RejectSecondQueue {
    fn backend_type(&self) -> &'static str {
        "reject-second"
    }

    async fn enqueue(&self, job: NotificationJob) -> Result<(), QueueError> {
        if self.offered.fetch_add(1, Ordering::SeqCst) == 1 {
            return Err(QueueError::Unavailable("queue offline".to_string()));
        }
        self.inner.enqueue(job).await
    }

    async fn dequeue(&self) -> Result<Option<NotificationJob>, QueueError> {
        self.inner.dequeue().await
    }

    async fn len(&self) -> Result<usize, QueueError> {
        self.inner.len().await
    }
}

// ============================================================================
// Environment
// ============================================================================

struct TestEnvironment {
    mailbox: Arc<RecordingMailbox>,
    transport: Arc<TransportManager>,
    queue: Arc<dyn JobQueue>,
    dispatcher: Arc<NotificationDispatcher>,
}

fn configured_smtp() -> SmtpConfig {
    SmtpConfig {
        host: Some("smtp.test.local".to_string()),
        user: Some("mailer".to_string()),
        password: Some("secret".to_string()),
        from_name: "Ara".to_string(),
        from_address: "no-reply@test.local".to_string(),
        ..Default::default()
    }
}

fn environment_with_queue(queue: Arc<dyn JobQueue>) -> TestEnvironment {
    let mailbox = Arc::new(RecordingMailbox::default());
    let transport = Arc::new(TransportManager::new(Arc::new(RecordingConnector {
        mailbox: Arc::clone(&mailbox),
    })));

    let dispatcher = Arc::new(NotificationDispatcher::new(
        Arc::new(TemplateRegistry::with_builtin("Ara")),
        transport.clone(),
        queue.clone(),
        Sender::from_config(&configured_smtp()),
    ));

    TestEnvironment {
        mailbox,
        transport,
        queue,
        dispatcher,
    }
}

fn environment() -> TestEnvironment {
    environment_with_queue(Arc::new(MemoryJobQueue::with_capacity(100)))
}

fn worker_for(env: &TestEnvironment, max_attempts: u32) -> NotificationWorker {
    let (_tx, rx) = tokio::sync::broadcast::channel(1);
    NotificationWorker::new(
        env.queue.clone(),
        env.dispatcher.clone(),
        WorkerConfig {
            enabled: true,
            poll_interval_ms: 10,
            max_attempts,
        },
        rx,
    )
}

// ============================================================================
// Transport status
// ============================================================================

#[tokio::test]
async fn test_status_without_settings() {
    let env = environment();
    env.transport.initialize(&SmtpConfig::default()).await;

    let status = env.dispatcher.status();
    assert!(!status.available);
    assert!(!status.configured);
}

#[tokio::test]
async fn test_status_configured_but_unreachable() {
    let env = environment();
    env.mailbox.set_healthy(false);

    assert_eq!(
        env.transport.initialize(&configured_smtp()).await,
        TransportState::Available
    );
    assert!(env.transport.verify().await.is_err());

    let status = env.dispatcher.status();
    assert!(!status.available);
    assert!(status.configured);
}

#[tokio::test]
async fn test_transport_recovers_after_reverification() {
    let env = environment();
    env.mailbox.set_healthy(false);
    env.transport.initialize(&configured_smtp()).await;
    assert!(env.transport.verify().await.is_err());

    env.mailbox.set_healthy(true);
    env.transport.verify().await.unwrap();

    assert!(env.dispatcher.status().available);
    let outcome = env
        .dispatcher
        .send(NotificationRequest::new("alice@example.com").subject("Hi").text("Hello"))
        .await;
    assert!(outcome.is_sent());
}

// ============================================================================
// Synchronous send
// ============================================================================

#[tokio::test]
async fn test_send_skipped_without_transport() {
    let env = environment();
    env.transport.initialize(&SmtpConfig::default()).await;

    let outcome = env
        .dispatcher
        .send(NotificationRequest::new("alice@example.com").subject("Hi").text("Hello"))
        .await;

    assert!(matches!(
        outcome,
        DeliveryOutcome::Skipped(SkipReason::TransportUnavailable)
    ));
    assert!(env.mailbox.delivered().is_empty());
    assert_eq!(env.dispatcher.stats().skipped, 1);
}

#[tokio::test]
async fn test_send_raw_content() {
    let env = environment();
    env.transport.initialize(&configured_smtp()).await;

    let outcome = env
        .dispatcher
        .send(
            NotificationRequest::new("alice@example.com")
                .subject("Quarterly report")
                .html("<p>See attached</p>")
                .attachment(Attachment::from_content("report.csv", "a,b\n1,2\n")),
        )
        .await;

    assert!(matches!(outcome, DeliveryOutcome::Sent { ref message_id } if message_id == "<1@test.local>"));

    let delivered = env.mailbox.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].from.address, "no-reply@test.local");
    assert_eq!(delivered[0].subject, "Quarterly report");
    assert_eq!(delivered[0].text, None);
    assert_eq!(delivered[0].attachments.len(), 1);
}

#[tokio::test]
async fn test_template_overrides_raw_content() {
    let env = environment();
    env.transport.initialize(&configured_smtp()).await;

    let request = NotificationRequest::new("alice@example.com")
        .subject("ignored subject")
        .html("<p>ignored</p>")
        .text("ignored")
        .template(TemplateData::PasswordReset(PasswordReset {
            username: "alice".to_string(),
            reset_url: "https://app.example.com/reset?token=abc".to_string(),
        }));

    assert!(env.dispatcher.send(request).await.is_sent());

    let delivered = env.mailbox.delivered();
    let email = &delivered[0];
    assert_eq!(email.subject, "Reset your Ara password");
    assert!(email.html.as_deref().unwrap().contains("https://app.example.com/reset?token=abc"));
    assert!(!email.html.as_deref().unwrap().contains("ignored"));

    let text = email.text.as_deref().unwrap();
    assert!(text.contains("https://app.example.com/reset?token=abc"));
    assert!(text.contains("1 hour"));
}

#[tokio::test]
async fn test_unknown_template_falls_back_to_raw_content() {
    let env = environment();
    env.transport.initialize(&configured_smtp()).await;

    let request = NotificationRequest::new("alice@example.com")
        .subject("Fallback")
        .text("Plain body")
        .template(TemplateData::custom("not-registered", serde_json::json!({"a": 1})));

    assert!(env.dispatcher.send(request).await.is_sent());
    assert_eq!(env.mailbox.delivered()[0].subject, "Fallback");
}

#[tokio::test]
async fn test_send_failures() {
    let env = environment();
    env.transport.initialize(&configured_smtp()).await;

    let invalid = env
        .dispatcher
        .send(NotificationRequest::new("not-an-address").subject("Hi").text("Hello"))
        .await;
    assert!(matches!(
        invalid,
        DeliveryOutcome::Failed(DeliveryFailure::InvalidRecipient(_))
    ));

    let no_subject = env
        .dispatcher
        .send(NotificationRequest::new("alice@example.com").text("Hello"))
        .await;
    assert!(matches!(
        no_subject,
        DeliveryOutcome::Failed(DeliveryFailure::MissingSubject)
    ));

    let no_body = env
        .dispatcher
        .send(NotificationRequest::new("alice@example.com").subject("Hi"))
        .await;
    assert!(matches!(no_body, DeliveryOutcome::Failed(DeliveryFailure::EmptyBody)));

    env.mailbox.set_healthy(false);
    let refused = env
        .dispatcher
        .send(NotificationRequest::new("alice@example.com").subject("Hi").text("Hello"))
        .await;
    assert!(matches!(
        refused,
        DeliveryOutcome::Failed(DeliveryFailure::Transport(TransportError::Connection(_)))
    ));

    assert_eq!(env.dispatcher.stats().failed, 4);
    assert!(env.mailbox.delivered().is_empty());
}

#[test]
fn test_custom_placeholder_template_is_escaped() {
    let registry = TemplateRegistry::with_builtin("Ara");
    registry
        .register_placeholder(PlaceholderTemplate {
            name: "invoice-ready".to_string(),
            subject: "Invoice {{number}} is ready".to_string(),
            html: "<p>Hello {{name}}</p>".to_string(),
            text: "Hello {{name}}".to_string(),
        })
        .unwrap();

    let data = TemplateData::custom(
        "invoice-ready",
        serde_json::json!({"number": "INV-7", "name": "<b>Bob</b>"}),
    );
    let rendered = registry.resolve("invoice-ready", &data).unwrap();

    assert_eq!(rendered.subject, "Invoice INV-7 is ready");
    assert_eq!(rendered.html, "<p>Hello &lt;b&gt;Bob&lt;/b&gt;</p>");
    assert_eq!(rendered.text.as_deref(), Some("Hello <b>Bob</b>"));
}

#[test]
fn test_blocking_send_without_transport() {
    let env = environment();

    let outcome = tokio_test::block_on(async {
        env.transport.initialize(&SmtpConfig::default()).await;
        env.dispatcher
            .send(NotificationRequest::new("alice@example.com").subject("Hi").text("Hello"))
            .await
    });

    assert!(outcome.is_skipped());
    assert_eq!(env.dispatcher.stats().skipped, 1);
}

// ============================================================================
// Queued delivery
// ============================================================================

#[tokio::test]
async fn test_bulk_counts_rejections() {
    let env = environment_with_queue(Arc::new(RejectSecondQueue::new()));

    let result = env
        .dispatcher
        .send_bulk(vec![
            NotificationRequest::new("a@example.com").subject("1").text("1"),
            NotificationRequest::new("b@example.com").subject("2").text("2"),
            NotificationRequest::new("c@example.com").subject("3").text("3"),
        ])
        .await;

    assert_eq!(result.success_count, 2);
    assert_eq!(result.failed_count, 1);
    assert_eq!(result.total(), 3);
    assert_eq!(env.queue.len().await.unwrap(), 2);

    let stats = env.dispatcher.stats();
    assert_eq!(stats.queued, 2);
    assert_eq!(stats.queue_failures, 1);
}

#[tokio::test]
async fn test_send_async_on_full_queue() {
    let env = environment_with_queue(Arc::new(MemoryJobQueue::with_capacity(1)));

    env.dispatcher
        .send_async(NotificationRequest::new("a@example.com").subject("1").text("1"))
        .await
        .unwrap();

    let err = env
        .dispatcher
        .send_async(NotificationRequest::new("b@example.com").subject("2").text("2"))
        .await
        .unwrap_err();

    assert!(matches!(err, QueueError::Full { size: 1 }));
    assert_eq!(env.queue.len().await.unwrap(), 1);
}

#[tokio::test]
async fn test_worker_delivers_queued_template() {
    let env = environment();
    env.transport.initialize(&configured_smtp()).await;

    let job_id = env
        .dispatcher
        .send_async(NotificationRequest::new("alice@example.com").template(
            TemplateData::PasswordReset(PasswordReset {
                username: "alice".to_string(),
                reset_url: "https://app.example.com/reset".to_string(),
            }),
        ))
        .await
        .unwrap();
    assert!(!job_id.is_nil());

    let worker = worker_for(&env, 3);
    assert_eq!(
        worker.process_next().await.unwrap(),
        Some(JobDisposition::Sent)
    );
    assert_eq!(worker.process_next().await.unwrap(), None);

    let delivered = env.mailbox.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].subject, "Reset your Ara password");
}

#[tokio::test]
async fn test_worker_retries_connection_failures() {
    let env = environment();
    env.transport.initialize(&configured_smtp()).await;
    env.mailbox.set_healthy(false);

    env.dispatcher
        .send_async(NotificationRequest::new("alice@example.com").subject("Hi").text("Hello"))
        .await
        .unwrap();

    let worker = worker_for(&env, 3);
    assert_eq!(
        worker.process_next().await.unwrap(),
        Some(JobDisposition::Retried)
    );
    assert_eq!(env.queue.len().await.unwrap(), 1);

    env.mailbox.set_healthy(true);
    assert_eq!(
        worker.process_next().await.unwrap(),
        Some(JobDisposition::Sent)
    );
    assert_eq!(env.mailbox.delivered().len(), 1);
}

#[tokio::test]
async fn test_worker_gives_up_after_max_attempts() {
    let env = environment();
    env.transport.initialize(&configured_smtp()).await;
    env.mailbox.set_healthy(false);

    env.dispatcher
        .send_async(NotificationRequest::new("alice@example.com").subject("Hi").text("Hello"))
        .await
        .unwrap();

    let worker = worker_for(&env, 2);
    assert_eq!(
        worker.process_next().await.unwrap(),
        Some(JobDisposition::Retried)
    );
    assert_eq!(
        worker.process_next().await.unwrap(),
        Some(JobDisposition::Dropped)
    );
    assert_eq!(env.queue.len().await.unwrap(), 0);
}

#[tokio::test]
async fn test_worker_drops_invalid_jobs_without_retry() {
    let env = environment();
    env.transport.initialize(&configured_smtp()).await;

    env.dispatcher
        .send_async(NotificationRequest::new("nobody").subject("Hi").text("Hello"))
        .await
        .unwrap();

    let worker = worker_for(&env, 5);
    assert_eq!(
        worker.process_next().await.unwrap(),
        Some(JobDisposition::Dropped)
    );
    assert_eq!(env.queue.len().await.unwrap(), 0);
}

#[tokio::test]
async fn test_worker_skips_without_transport() {
    let env = environment();
    env.transport.initialize(&SmtpConfig::default()).await;

    env.dispatcher
        .send_async(NotificationRequest::new("alice@example.com").subject("Hi").text("Hello"))
        .await
        .unwrap();

    let worker = worker_for(&env, 3);
    assert_eq!(
        worker.process_next().await.unwrap(),
        Some(JobDisposition::Skipped)
    );
    assert_eq!(env.queue.len().await.unwrap(), 0);
}

#[tokio::test]
async fn test_worker_defers_while_configured_transport_is_down() {
    let env = environment();
    env.mailbox.set_healthy(false);
    env.transport.initialize(&configured_smtp()).await;
    assert!(env.transport.verify().await.is_err());

    env.dispatcher
        .send_async(NotificationRequest::new("alice@example.com").subject("Hi").text("Hello"))
        .await
        .unwrap();

    // Max attempts of 1: deferral must not count as an attempt
    let worker = worker_for(&env, 1);
    for _ in 0..3 {
        assert_eq!(
            worker.process_next().await.unwrap(),
            Some(JobDisposition::Deferred)
        );
        assert_eq!(env.queue.len().await.unwrap(), 1);
    }

    let job = env.queue.dequeue().await.unwrap().unwrap();
    assert_eq!(job.attempts, 0);
    env.queue.enqueue(job).await.unwrap();

    env.mailbox.set_healthy(true);
    env.transport.verify().await.unwrap();

    assert_eq!(
        worker.process_next().await.unwrap(),
        Some(JobDisposition::Sent)
    );
    assert_eq!(env.queue.len().await.unwrap(), 0);
    assert_eq!(env.mailbox.delivered().len(), 1);
}
