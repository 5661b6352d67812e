//! API layer - HTTP endpoint handlers organized by domain.

mod health;
mod metrics;
mod notifications;
mod routes;
mod templates;

// Re-export all handlers for use in server/app.rs
pub use health::{health, stats};
pub use metrics::prometheus_metrics;
pub use notifications::{
    bulk_notifications, queue_notification, send_notification, validate_address,
    AttachmentPayload, BulkNotificationRequest, NotificationPayload, QueueNotificationResponse,
    SendNotificationResponse, ValidateAddressRequest, ValidateAddressResponse,
};
pub use routes::api_routes;
pub use templates::{list_templates, TemplateListResponse};
