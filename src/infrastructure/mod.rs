//! Infrastructure layer modules
//!
//! This module contains shared infrastructure components:
//! - `backoff`: Exponential backoff with jitter
//! - `config`: Application configuration and settings
//! - `error`: Unified error types
//! - `metrics`: Prometheus metrics helpers
//! - `redis`: Redis connection pool for the Redis job queue

pub mod backoff;
pub mod config;
pub mod error;
pub mod metrics;
pub mod redis;
