//! Prometheus metrics for the mail dispatch service.
//!
//! - Delivery metrics (sent, skipped, failed by reason, latency)
//! - Queue metrics (admitted, rejected, worker outcomes)
//! - Transport metrics (availability, verification results)

mod helpers;

pub use helpers::{encode_metrics, DeliveryMetrics, QueueMetrics, TransportMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "ara_mail";

lazy_static! {
    // ============================================================================
    // Delivery Metrics
    // ============================================================================

    /// Messages accepted by the transport
    pub static ref MESSAGES_SENT_TOTAL: IntCounter = register_int_counter!(
        format!("{}_messages_sent_total", METRIC_PREFIX),
        "Total messages accepted by the transport"
    ).unwrap();

    /// Sends skipped because no transport is available
    pub static ref MESSAGES_SKIPPED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_messages_skipped_total", METRIC_PREFIX),
        "Total sends skipped because no transport was available"
    ).unwrap();

    /// Failed sends by reason
    pub static ref MESSAGES_FAILED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_messages_failed_total", METRIC_PREFIX),
        "Total failed sends",
        &["reason"]
    ).unwrap();

    /// Time spent in the transport for a single delivery
    pub static ref DELIVERY_LATENCY: Histogram = register_histogram!(
        format!("{}_delivery_latency_seconds", METRIC_PREFIX),
        "Transport delivery latency in seconds",
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    ).unwrap();

    // ============================================================================
    // Queue Metrics
    // ============================================================================

    /// Jobs admitted to the queue
    pub static ref QUEUE_ENQUEUED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_queue_enqueued_total", METRIC_PREFIX),
        "Total notification jobs admitted to the queue"
    ).unwrap();

    /// Jobs rejected by the queue
    pub static ref QUEUE_REJECTED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_queue_rejected_total", METRIC_PREFIX),
        "Total notification jobs the queue refused to admit"
    ).unwrap();

    /// Jobs processed by the worker, by outcome
    pub static ref QUEUE_JOBS_PROCESSED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_queue_jobs_processed_total", METRIC_PREFIX),
        "Total notification jobs processed by the worker",
        &["outcome"]
    ).unwrap();

    /// Jobs currently waiting in the queue
    pub static ref QUEUE_PENDING: IntGauge = register_int_gauge!(
        format!("{}_queue_pending", METRIC_PREFIX),
        "Notification jobs waiting in the queue"
    ).unwrap();

    // ============================================================================
    // Transport Metrics
    // ============================================================================

    /// Transport availability (1 = available, 0 = unavailable)
    pub static ref TRANSPORT_AVAILABLE: IntGauge = register_int_gauge!(
        format!("{}_transport_available", METRIC_PREFIX),
        "Transport availability (1=available, 0=unavailable)"
    ).unwrap();

    /// Transport verification attempts by result
    pub static ref TRANSPORT_VERIFICATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_transport_verifications_total", METRIC_PREFIX),
        "Transport verification attempts",
        &["result"]
    ).unwrap();
}
