//! Redis connectivity for the Redis-backed job queue.

pub mod pool;

pub use pool::{PoolError, RedisPool};
