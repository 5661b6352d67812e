//! Metrics helper structs for convenient metric recording

use std::time::Duration;

use prometheus::{Encoder, TextEncoder};

use super::{
    DELIVERY_LATENCY, MESSAGES_FAILED_TOTAL, MESSAGES_SENT_TOTAL, MESSAGES_SKIPPED_TOTAL,
    QUEUE_ENQUEUED_TOTAL, QUEUE_JOBS_PROCESSED_TOTAL, QUEUE_PENDING, QUEUE_REJECTED_TOTAL,
    TRANSPORT_AVAILABLE, TRANSPORT_VERIFICATIONS_TOTAL,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording synchronous delivery metrics
pub struct DeliveryMetrics;

impl DeliveryMetrics {
    /// Record a message accepted by the transport
    pub fn record_sent(latency: Duration) {
        MESSAGES_SENT_TOTAL.inc();
        DELIVERY_LATENCY.observe(latency.as_secs_f64());
    }

    /// Record a send skipped for lack of transport
    pub fn record_skipped() {
        MESSAGES_SKIPPED_TOTAL.inc();
    }

    /// Record a failed send
    pub fn record_failed(reason: &str) {
        MESSAGES_FAILED_TOTAL.with_label_values(&[reason]).inc();
    }
}

/// Helper struct for recording queue metrics
pub struct QueueMetrics;

impl QueueMetrics {
    pub fn record_enqueued() {
        QUEUE_ENQUEUED_TOTAL.inc();
    }

    pub fn record_rejected() {
        QUEUE_REJECTED_TOTAL.inc();
    }

    /// Record a job handled by the worker ("sent", "skipped", "retried", "dropped")
    pub fn record_processed(outcome: &str) {
        QUEUE_JOBS_PROCESSED_TOTAL.with_label_values(&[outcome]).inc();
    }

    pub fn set_pending(count: usize) {
        QUEUE_PENDING.set(count as i64);
    }
}

/// Helper struct for recording transport metrics
pub struct TransportMetrics;

impl TransportMetrics {
    pub fn set_available(available: bool) {
        TRANSPORT_AVAILABLE.set(if available { 1 } else { 0 });
    }

    pub fn record_verification(success: bool) {
        let result = if success { "success" } else { "failure" };
        TRANSPORT_VERIFICATIONS_TOTAL.with_label_values(&[result]).inc();
    }
}
