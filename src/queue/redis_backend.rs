//! Redis-backed job queue.
//!
//! Jobs are stored as JSON in a single Redis list: `RPUSH` to admit,
//! `LPOP` to take the oldest. Survives service restarts.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::QueueConfig;
use crate::infrastructure::redis::{PoolError, RedisPool};
use crate::metrics::QueueMetrics;

use super::backend::{JobQueue, NotificationJob, QueueError};

pub struct RedisJobQueue {
    pool: Arc<RedisPool>,
    key: String,
    enabled: bool,
}

impl RedisJobQueue {
    pub fn new(config: &QueueConfig, pool: Arc<RedisPool>) -> Self {
        Self {
            pool,
            key: config.redis_key.clone(),
            enabled: config.enabled,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Convert pool error to queue error.
    fn map_error(err: PoolError) -> QueueError {
        match err {
            PoolError::Redis(e) => QueueError::Redis(e),
            PoolError::ConnectionUnavailable(msg) => QueueError::Unavailable(msg),
        }
    }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    fn backend_type(&self) -> &'static str {
        "redis"
    }

    async fn enqueue(&self, job: NotificationJob) -> Result<(), QueueError> {
        if !self.enabled {
            return Err(QueueError::Disabled);
        }

        let json = serde_json::to_string(&job)?;
        let pending = self
            .pool
            .rpush(&self.key, &json)
            .await
            .map_err(Self::map_error)?;

        QueueMetrics::set_pending(pending);
        tracing::debug!(job_id = %job.id, key = %self.key, pending, "Job pushed to Redis");

        Ok(())
    }

    async fn dequeue(&self) -> Result<Option<NotificationJob>, QueueError> {
        let Some(json) = self.pool.lpop(&self.key).await.map_err(Self::map_error)? else {
            return Ok(None);
        };

        match serde_json::from_str::<NotificationJob>(&json) {
            Ok(job) => Ok(Some(job)),
            Err(e) => {
                // The entry is already popped; keeping it would block the queue
                tracing::error!(
                    key = %self.key,
                    error = %e,
                    "Discarding unreadable job from Redis"
                );
                Err(QueueError::Serialization(e))
            }
        }
    }

    async fn len(&self) -> Result<usize, QueueError> {
        self.pool.llen(&self.key).await.map_err(Self::map_error)
    }
}
