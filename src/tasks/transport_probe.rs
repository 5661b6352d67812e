use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use crate::backoff::{BackoffConfig, ExponentialBackoff};
use crate::transport::TransportManager;

/// Periodically re-verifies the mail transport.
///
/// While the transport is down, checks are retried with exponential backoff
/// capped at the configured interval. A healthy transport is checked once
/// per interval.
pub struct TransportProbeTask {
    transport: Arc<TransportManager>,
    interval: Duration,
    shutdown: broadcast::Receiver<()>,
}

impl TransportProbeTask {
    pub fn new(
        transport: Arc<TransportManager>,
        interval: Duration,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            transport,
            interval,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        let mut backoff = ExponentialBackoff::new(BackoffConfig::capped_at(self.interval));
        let mut delay = self.interval;

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Transport probe task started"
        );

        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    tracing::info!("Transport probe task received shutdown signal");
                    break;
                }
                _ = tokio::time::sleep(delay) => {
                    delay = self.probe(&mut backoff).await;
                }
            }
        }

        tracing::info!("Transport probe task stopped");
    }

    /// Run one check and return the wait before the next
    async fn probe(&self, backoff: &mut ExponentialBackoff) -> Duration {
        if !self.transport.is_configured() {
            return self.interval;
        }

        match self.transport.verify().await {
            Ok(()) => {
                backoff.reset();
                self.interval
            }
            Err(e) => {
                let delay = backoff.next_delay();
                tracing::debug!(
                    error = %e,
                    attempt = backoff.attempt(),
                    retry_in_ms = delay.as_millis() as u64,
                    "Transport still unavailable"
                );
                delay
            }
        }
    }
}
