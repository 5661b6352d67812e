//! Ownership of the process-wide transport handle.
//!
//! The manager is the only writer of the handle. Dispatch code reads it via
//! `handle()` and never constructs or mutates it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use super::health::{TransportHealth, TransportHealthStats, TransportState};
use super::smtp::SmtpConnector;
use super::types::{MailTransport, TransportConnector, TransportError};
use crate::config::SmtpConfig;
use crate::metrics::TransportMetrics;

/// Observable transport status.
///
/// `configured` reflects the settings alone; `available` reflects the live
/// handle. Configured but unavailable means the endpoint is down or rejected
/// the verification probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransportStatus {
    pub available: bool,
    pub configured: bool,
}

pub struct TransportManager {
    connector: Arc<dyn TransportConnector>,
    health: TransportHealth,
    configured: AtomicBool,
    /// Settings retained for reconstructing a discarded handle
    settings: RwLock<Option<SmtpConfig>>,
    handle: RwLock<Option<Arc<dyn MailTransport>>>,
}

impl TransportManager {
    pub fn new(connector: Arc<dyn TransportConnector>) -> Self {
        Self {
            connector,
            health: TransportHealth::new(),
            configured: AtomicBool::new(false),
            settings: RwLock::new(None),
            handle: RwLock::new(None),
        }
    }

    /// Manager backed by the lettre SMTP connector
    pub fn smtp() -> Self {
        Self::new(Arc::new(SmtpConnector))
    }

    /// Construct the handle from settings.
    ///
    /// Missing host or credentials is not an error: the manager stays
    /// `Unavailable` and the service runs without delivery.
    pub async fn initialize(&self, config: &SmtpConfig) -> TransportState {
        if !config.is_configured() {
            self.configured.store(false, Ordering::Release);
            *self.settings.write().await = None;
            self.discard("not configured").await;

            tracing::warn!("SMTP host or credentials not set, notifications will be skipped");
            return TransportState::Unavailable;
        }

        self.configured.store(true, Ordering::Release);
        *self.settings.write().await = Some(config.clone());

        match self.connector.connect(config) {
            Ok(handle) => {
                *self.handle.write().await = Some(handle);
                self.health.set_state(TransportState::Available);
                TransportMetrics::set_available(true);

                tracing::info!(
                    host = config.host.as_deref().unwrap_or_default(),
                    port = config.port,
                    secure = config.secure,
                    "SMTP transport constructed"
                );
                TransportState::Available
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to construct SMTP transport");
                self.discard("construction failed").await;
                TransportState::Unavailable
            }
        }
    }

    /// `initialize`, then verify connectivity in the background
    pub async fn start(self: &Arc<Self>, config: &SmtpConfig) -> TransportState {
        let state = self.initialize(config).await;

        if state == TransportState::Available {
            let manager = Arc::clone(self);
            tokio::spawn(async move {
                // Failure is logged and reflected in the state
                let _ = manager.verify().await;
            });
        }

        state
    }

    /// Check connectivity against the configured endpoint.
    ///
    /// A failed check discards the handle. If the handle was discarded
    /// earlier and settings are present, it is rebuilt before checking.
    pub async fn verify(&self) -> Result<(), TransportError> {
        let handle = match self.handle().await {
            Some(handle) => handle,
            None => {
                let settings = self.settings.read().await.clone();
                let Some(settings) = settings else {
                    let e = TransportError::Build("SMTP transport is not configured".to_string());
                    self.record_failed_verification(&e).await;
                    return Err(e);
                };

                match self.connector.connect(&settings) {
                    Ok(handle) => handle,
                    Err(e) => {
                        self.record_failed_verification(&e).await;
                        return Err(e);
                    }
                }
            }
        };

        match handle.verify().await {
            Ok(()) => {
                *self.handle.write().await = Some(handle);
                self.health.record_verified();
                TransportMetrics::record_verification(true);
                TransportMetrics::set_available(true);

                tracing::info!("SMTP transport verified");
                Ok(())
            }
            Err(e) => {
                self.record_failed_verification(&e).await;
                Err(e)
            }
        }
    }

    /// Current handle, if any. Never performs I/O.
    pub async fn handle(&self) -> Option<Arc<dyn MailTransport>> {
        self.handle.read().await.clone()
    }

    pub fn status(&self) -> TransportStatus {
        TransportStatus {
            available: self.health.is_available(),
            configured: self.configured.load(Ordering::Acquire),
        }
    }

    pub fn state(&self) -> TransportState {
        self.health.state()
    }

    pub fn is_configured(&self) -> bool {
        self.configured.load(Ordering::Acquire)
    }

    pub fn health_stats(&self) -> TransportHealthStats {
        self.health.stats()
    }

    /// Release the handle. Sends after this are skipped.
    pub async fn shutdown(&self) {
        self.discard("shutdown").await;
        tracing::info!("SMTP transport shut down");
    }

    async fn record_failed_verification(&self, error: &TransportError) {
        *self.handle.write().await = None;
        self.health.record_verification_failed();
        TransportMetrics::record_verification(false);
        TransportMetrics::set_available(false);

        tracing::warn!(error = %error, "SMTP verification failed, transport disabled");
    }

    async fn discard(&self, reason: &str) {
        *self.handle.write().await = None;
        self.health.set_state(TransportState::Unavailable);
        TransportMetrics::set_available(false);

        tracing::debug!(reason = reason, "SMTP transport handle discarded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::types::OutboundEmail;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    struct StubTransport {
        healthy: Arc<AtomicBool>,
    }

    #[async_trait]
    impl MailTransport for StubTransport {
        async fn deliver(&self, _email: &OutboundEmail) -> Result<String, TransportError> {
            Ok("<stub@example.com>".to_string())
        }

        async fn verify(&self) -> Result<(), TransportError> {
            if self.healthy.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(TransportError::Connection("connection refused".to_string()))
            }
        }
    }

    struct StubConnector {
        healthy: Arc<AtomicBool>,
        fail_construction: bool,
        connects: AtomicUsize,
    }

    impl StubConnector {
        fn new(healthy: bool) -> Self {
            Self {
                healthy: Arc::new(AtomicBool::new(healthy)),
                fail_construction: false,
                connects: AtomicUsize::new(0),
            }
        }
    }

    impl TransportConnector for StubConnector {
        fn connect(&self, _config: &SmtpConfig) -> Result<Arc<dyn MailTransport>, TransportError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            if self.fail_construction {
                return Err(TransportError::Build("bad relay".to_string()));
            }
            Ok(Arc::new(StubTransport {
                healthy: Arc::clone(&self.healthy),
            }))
        }
    }

    fn configured() -> SmtpConfig {
        SmtpConfig {
            host: Some("smtp.example.com".to_string()),
            user: Some("mailer".to_string()),
            password: Some("secret".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_unconfigured_is_unavailable() {
        let manager = TransportManager::new(Arc::new(StubConnector::new(true)));
        assert_eq!(manager.state(), TransportState::Uninitialized);

        let state = manager.initialize(&SmtpConfig::default()).await;

        assert_eq!(state, TransportState::Unavailable);
        assert_eq!(
            manager.status(),
            TransportStatus {
                available: false,
                configured: false
            }
        );
        assert!(manager.handle().await.is_none());
        assert!(manager.verify().await.is_err());
    }

    #[tokio::test]
    async fn test_verify_before_initialize_is_recorded() {
        let connector = Arc::new(StubConnector::new(true));
        let manager = TransportManager::new(connector.clone());

        assert!(matches!(manager.verify().await, Err(TransportError::Build(_))));

        let stats = manager.health_stats();
        assert_eq!(stats.state, TransportState::Unavailable);
        assert_eq!(stats.verifications_failed, 1);
        assert_eq!(connector.connects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_verify_after_unconfigured_initialize_is_recorded() {
        let manager = TransportManager::new(Arc::new(StubConnector::new(true)));
        manager.initialize(&SmtpConfig::default()).await;

        assert!(manager.verify().await.is_err());
        assert!(manager.verify().await.is_err());

        let stats = manager.health_stats();
        assert_eq!(stats.state, TransportState::Unavailable);
        assert_eq!(stats.verifications_failed, 2);
        assert_eq!(stats.verifications_succeeded, 0);
    }

    #[tokio::test]
    async fn test_initialize_publishes_handle() {
        let manager = TransportManager::new(Arc::new(StubConnector::new(true)));

        let state = manager.initialize(&configured()).await;

        assert_eq!(state, TransportState::Available);
        assert!(manager.handle().await.is_some());
        assert!(manager.status().available);
        assert!(manager.status().configured);
    }

    #[tokio::test]
    async fn test_construction_failure() {
        let connector = StubConnector {
            fail_construction: true,
            ..StubConnector::new(true)
        };
        let manager = TransportManager::new(Arc::new(connector));

        let state = manager.initialize(&configured()).await;

        assert_eq!(state, TransportState::Unavailable);
        assert_eq!(
            manager.status(),
            TransportStatus {
                available: false,
                configured: true
            }
        );
    }

    #[tokio::test]
    async fn test_failed_verification_discards_handle() {
        let manager = TransportManager::new(Arc::new(StubConnector::new(false)));
        manager.initialize(&configured()).await;

        assert!(manager.verify().await.is_err());

        assert!(manager.handle().await.is_none());
        assert_eq!(
            manager.status(),
            TransportStatus {
                available: false,
                configured: true
            }
        );
        assert_eq!(manager.health_stats().verifications_failed, 1);
    }

    #[tokio::test]
    async fn test_reverify_rebuilds_discarded_handle() {
        let connector = Arc::new(StubConnector::new(false));
        let manager = TransportManager::new(connector.clone());
        manager.initialize(&configured()).await;
        assert!(manager.verify().await.is_err());

        connector.healthy.store(true, Ordering::SeqCst);
        assert!(manager.verify().await.is_ok());

        assert!(manager.handle().await.is_some());
        assert!(manager.status().available);
        assert_eq!(connector.connects.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_start_runs_background_verification() {
        let manager = Arc::new(TransportManager::new(Arc::new(StubConnector::new(false))));

        let state = manager.start(&configured()).await;
        assert_eq!(state, TransportState::Available);

        for _ in 0..50 {
            if !manager.status().available {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(!manager.status().available);
    }

    #[tokio::test]
    async fn test_shutdown_releases_handle() {
        let manager = TransportManager::new(Arc::new(StubConnector::new(true)));
        manager.initialize(&configured()).await;

        manager.shutdown().await;

        assert!(manager.handle().await.is_none());
        assert_eq!(manager.state(), TransportState::Unavailable);
        assert!(manager.is_configured());
    }
}
