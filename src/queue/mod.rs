//! Notification job queue.
//!
//! # Backend Architecture
//!
//! - `MemoryJobQueue`: bounded in-process FIFO (default)
//! - `RedisJobQueue`: JSON jobs in a Redis list
//!
//! Use `create_job_queue()` to pick the backend from configuration.
//! `NotificationWorker` drains the queue through the dispatcher.

pub mod backend;
pub mod factory;
pub mod memory_backend;
pub mod redis_backend;
pub mod worker;

pub use backend::{JobPayload, JobQueue, NotificationJob, QueueError};
pub use factory::create_job_queue;
pub use memory_backend::MemoryJobQueue;
pub use redis_backend::RedisJobQueue;
pub use worker::{JobDisposition, NotificationWorker};
