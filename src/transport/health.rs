//! Transport handle state tracking

use std::sync::atomic::{AtomicI64, AtomicU32, AtomicU8, Ordering};

/// Lifecycle state of the transport handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// `initialize` has not run yet
    Uninitialized,
    /// Handle constructed and ready to send
    Available,
    /// No configuration, construction failed, or verification failed
    Unavailable,
}

impl TransportState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportState::Uninitialized => "uninitialized",
            TransportState::Available => "available",
            TransportState::Unavailable => "unavailable",
        }
    }
}

/// Transport health tracker
pub struct TransportHealth {
    state: AtomicU8,
    last_verified: AtomicI64,
    verifications_succeeded: AtomicU32,
    verifications_failed: AtomicU32,
}

impl TransportHealth {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(TransportState::Uninitialized as u8),
            last_verified: AtomicI64::new(0),
            verifications_succeeded: AtomicU32::new(0),
            verifications_failed: AtomicU32::new(0),
        }
    }

    pub fn set_state(&self, state: TransportState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Record a successful connectivity check
    pub fn record_verified(&self) {
        self.set_state(TransportState::Available);
        self.last_verified
            .store(chrono::Utc::now().timestamp_millis(), Ordering::Release);
        self.verifications_succeeded.fetch_add(1, Ordering::AcqRel);
    }

    /// Record a failed connectivity check
    pub fn record_verification_failed(&self) {
        self.set_state(TransportState::Unavailable);
        self.verifications_failed.fetch_add(1, Ordering::AcqRel);
    }

    pub fn state(&self) -> TransportState {
        match self.state.load(Ordering::Acquire) {
            0 => TransportState::Uninitialized,
            1 => TransportState::Available,
            _ => TransportState::Unavailable,
        }
    }

    pub fn is_available(&self) -> bool {
        self.state() == TransportState::Available
    }

    /// Get statistics snapshot
    pub fn stats(&self) -> TransportHealthStats {
        TransportHealthStats {
            state: self.state(),
            last_verified_ms: self.last_verified.load(Ordering::Acquire),
            verifications_succeeded: self.verifications_succeeded.load(Ordering::Acquire),
            verifications_failed: self.verifications_failed.load(Ordering::Acquire),
        }
    }
}

impl Default for TransportHealth {
    fn default() -> Self {
        Self::new()
    }
}

/// Transport health statistics
#[derive(Debug, Clone)]
pub struct TransportHealthStats {
    pub state: TransportState,
    /// Unix millis of the last successful verification, 0 if never
    pub last_verified_ms: i64,
    pub verifications_succeeded: u32,
    pub verifications_failed: u32,
}
