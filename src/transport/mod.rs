//! Outbound mail transport.
//!
//! - `MailTransport` / `TransportConnector`: the delivery seam
//! - `SmtpTransport`: lettre-based SMTP implementation
//! - `TransportManager`: owns the single transport handle and its lifecycle
//! - `TransportHealth`: atomic state and verification counters

pub mod health;
pub mod manager;
pub mod smtp;
pub mod types;

pub use health::{TransportHealth, TransportHealthStats, TransportState};
pub use manager::{TransportManager, TransportStatus};
pub use smtp::{SmtpConnector, SmtpTransport};
pub use types::{
    Attachment, AttachmentSource, MailTransport, OutboundEmail, Sender, TransportConnector,
    TransportError, DEFAULT_CONTENT_TYPE,
};
