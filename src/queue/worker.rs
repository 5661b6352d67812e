use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use crate::config::WorkerConfig;
use crate::metrics::QueueMetrics;
use crate::notification::{DeliveryOutcome, NotificationDispatcher};

use super::backend::{JobQueue, QueueError};

/// What the worker did with a job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobDisposition {
    Sent,
    /// Transport configured but down; the job went back on the queue
    /// without counting an attempt
    Deferred,
    /// No transport configured; the job is dropped
    Skipped,
    /// Delivery failed and the job went back on the queue
    Retried,
    /// Delivery failed for good
    Dropped,
}

impl JobDisposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobDisposition::Sent => "sent",
            JobDisposition::Deferred => "deferred",
            JobDisposition::Skipped => "skipped",
            JobDisposition::Retried => "retried",
            JobDisposition::Dropped => "dropped",
        }
    }
}

/// Background task delivering queued notification jobs
pub struct NotificationWorker {
    queue: Arc<dyn JobQueue>,
    dispatcher: Arc<NotificationDispatcher>,
    config: WorkerConfig,
    shutdown: broadcast::Receiver<()>,
}

impl NotificationWorker {
    pub fn new(
        queue: Arc<dyn JobQueue>,
        dispatcher: Arc<NotificationDispatcher>,
        config: WorkerConfig,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            queue,
            dispatcher,
            config,
            shutdown,
        }
    }

    /// Poll the queue until shutdown
    pub async fn run(mut self) {
        let poll_interval = Duration::from_millis(self.config.poll_interval_ms.max(1));
        let mut poll_timer = tokio::time::interval(poll_interval);

        tracing::info!(
            backend = self.queue.backend_type(),
            poll_interval_ms = self.config.poll_interval_ms,
            max_attempts = self.config.max_attempts,
            "Notification worker started"
        );

        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    tracing::info!("Notification worker received shutdown signal");
                    break;
                }
                _ = poll_timer.tick() => {
                    self.drain().await;
                }
            }
        }

        tracing::info!("Notification worker stopped");
    }

    /// Process the jobs waiting at the start of this pass. Jobs re-queued
    /// during the pass wait for the next one.
    async fn drain(&self) {
        let pending = match self.queue.len().await {
            Ok(0) => return,
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read queue length");
                return;
            }
        };

        for _ in 0..pending {
            match self.process_next().await {
                Ok(Some(_)) => {}
                Ok(None) => break,
                Err(QueueError::Serialization(_)) => continue,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to take job from queue");
                    break;
                }
            }
        }
    }

    /// Take one job and deliver it. `Ok(None)` when the queue is empty.
    pub async fn process_next(&self) -> Result<Option<JobDisposition>, QueueError> {
        let Some(mut job) = self.queue.dequeue().await? else {
            return Ok(None);
        };

        let disposition = match self.dispatcher.deliver_job(&job).await {
            DeliveryOutcome::Sent { .. } => JobDisposition::Sent,
            DeliveryOutcome::Skipped(reason) if self.dispatcher.status().configured => {
                let job_id = job.id;
                match self.queue.enqueue(job).await {
                    Ok(()) => {
                        tracing::debug!(
                            job_id = %job_id,
                            reason = %reason,
                            "Transport down, queued notification deferred"
                        );
                        JobDisposition::Deferred
                    }
                    Err(e) => {
                        tracing::error!(
                            job_id = %job_id,
                            error = %e,
                            "Failed to re-queue deferred notification, dropping it"
                        );
                        JobDisposition::Dropped
                    }
                }
            }
            DeliveryOutcome::Skipped(reason) => {
                tracing::warn!(
                    job_id = %job.id,
                    recipient = %job.to,
                    reason = %reason,
                    "Queued notification dropped, no transport configured"
                );
                JobDisposition::Skipped
            }
            DeliveryOutcome::Failed(failure) => {
                job.attempts += 1;

                if !failure.is_retryable() || job.attempts >= self.config.max_attempts {
                    tracing::error!(
                        job_id = %job.id,
                        recipient = %job.to,
                        attempts = job.attempts,
                        error = %failure,
                        "Queued notification dropped after failed delivery"
                    );
                    JobDisposition::Dropped
                } else {
                    let job_id = job.id;
                    let attempts = job.attempts;
                    match self.queue.enqueue(job).await {
                        Ok(()) => {
                            tracing::debug!(job_id = %job_id, attempts, "Queued notification will be retried");
                            JobDisposition::Retried
                        }
                        Err(e) => {
                            tracing::error!(
                                job_id = %job_id,
                                error = %e,
                                "Failed to re-queue notification, dropping it"
                            );
                            JobDisposition::Dropped
                        }
                    }
                }
            }
        };

        QueueMetrics::record_processed(disposition.as_str());
        Ok(Some(disposition))
    }
}
