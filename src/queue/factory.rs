//! Job queue factory

use std::sync::Arc;

use crate::config::QueueConfig;
use crate::infrastructure::redis::RedisPool;

use super::backend::JobQueue;
use super::memory_backend::MemoryJobQueue;
use super::redis_backend::RedisJobQueue;

/// Create a job queue based on configuration.
///
/// - `"redis"`: a `RedisJobQueue` if a Redis pool is provided
/// - `"memory"` (default): a `MemoryJobQueue`
///
/// A Redis backend requested without a pool falls back to memory.
///
/// # Example
///
/// ```rust,ignore
/// let queue = create_job_queue(&settings.queue, Some(redis_pool.clone()));
/// ```
pub fn create_job_queue(
    settings: &QueueConfig,
    redis_pool: Option<Arc<RedisPool>>,
) -> Arc<dyn JobQueue> {
    match settings.backend.as_str() {
        "redis" => {
            if let Some(pool) = redis_pool {
                tracing::info!(
                    backend = "redis",
                    key = %settings.redis_key,
                    url = %pool.url(),
                    "Creating Redis job queue"
                );
                Arc::new(RedisJobQueue::new(settings, pool))
            } else {
                tracing::warn!("Redis queue requested but no pool provided, falling back to memory");
                Arc::new(MemoryJobQueue::new(settings))
            }
        }
        "memory" => {
            tracing::info!(backend = "memory", max_size = settings.max_size, "Creating memory job queue");
            Arc::new(MemoryJobQueue::new(settings))
        }
        other => {
            tracing::warn!(backend = %other, "Unknown queue backend, using memory");
            Arc::new(MemoryJobQueue::new(settings))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RedisConfig;

    #[test]
    fn test_memory_by_default() {
        let queue = create_job_queue(&QueueConfig::default(), None);
        assert_eq!(queue.backend_type(), "memory");
    }

    #[test]
    fn test_redis_without_pool_falls_back() {
        let config = QueueConfig {
            backend: "redis".to_string(),
            ..Default::default()
        };
        assert_eq!(create_job_queue(&config, None).backend_type(), "memory");
    }

    #[test]
    fn test_redis_with_pool() {
        let config = QueueConfig {
            backend: "redis".to_string(),
            ..Default::default()
        };
        let pool = Arc::new(RedisPool::new(RedisConfig::default()).unwrap());
        assert_eq!(create_job_queue(&config, Some(pool)).backend_type(), "redis");
    }
}
