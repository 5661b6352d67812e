//! Notification requests and dispatching.
//!
//! The dispatcher has two delivery paths:
//!
//! - `send`: render and deliver now through the transport manager's handle.
//!   Problems are absorbed into a `DeliveryOutcome`.
//! - `send_async` / `send_bulk`: admit raw content to the job queue. Admission
//!   errors are returned to the caller.

pub mod address;
mod dispatcher;
mod types;

pub use address::is_valid_address;
pub use dispatcher::{DispatcherStats, DispatcherStatsSnapshot, NotificationDispatcher};
pub use types::{BulkResult, DeliveryFailure, DeliveryOutcome, NotificationRequest, SkipReason};
