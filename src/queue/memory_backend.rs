//! In-memory job queue.
//!
//! Bounded FIFO for development and tests. Jobs are lost on restart.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::config::QueueConfig;
use crate::metrics::QueueMetrics;

use super::backend::{JobQueue, NotificationJob, QueueError};

pub struct MemoryJobQueue {
    jobs: Mutex<VecDeque<NotificationJob>>,
    enabled: bool,
    max_size: usize,
}

impl MemoryJobQueue {
    pub fn new(config: &QueueConfig) -> Self {
        Self {
            jobs: Mutex::new(VecDeque::new()),
            enabled: config.enabled,
            max_size: config.max_size,
        }
    }

    /// Enabled queue with the given capacity
    pub fn with_capacity(max_size: usize) -> Self {
        Self {
            jobs: Mutex::new(VecDeque::new()),
            enabled: true,
            max_size,
        }
    }
}

#[async_trait]
impl JobQueue for MemoryJobQueue {
    fn backend_type(&self) -> &'static str {
        "memory"
    }

    async fn enqueue(&self, job: NotificationJob) -> Result<(), QueueError> {
        if !self.enabled {
            return Err(QueueError::Disabled);
        }

        let mut jobs = self.jobs.lock().await;

        // Refuse rather than drop: the caller is told the job was not admitted
        if jobs.len() >= self.max_size {
            return Err(QueueError::Full { size: jobs.len() });
        }

        tracing::debug!(job_id = %job.id, queue_size = jobs.len() + 1, "Job enqueued");
        jobs.push_back(job);
        QueueMetrics::set_pending(jobs.len());

        Ok(())
    }

    async fn dequeue(&self) -> Result<Option<NotificationJob>, QueueError> {
        let mut jobs = self.jobs.lock().await;
        let job = jobs.pop_front();
        QueueMetrics::set_pending(jobs.len());
        Ok(job)
    }

    async fn len(&self) -> Result<usize, QueueError> {
        Ok(self.jobs.lock().await.len())
    }
}
