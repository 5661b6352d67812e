//! Exponential backoff with jitter, used when re-verifying a failed transport.

use std::time::Duration;

use rand::Rng;

#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Delay before the first retry, in milliseconds
    pub initial_delay_ms: u64,
    /// Upper bound for any single delay, in milliseconds
    pub max_delay_ms: u64,
    pub multiplier: f64,
    /// Fraction of the delay randomly added or removed (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1_000,
            max_delay_ms: 300_000, // 5 minutes
            multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

impl BackoffConfig {
    /// Default growth, capped at the given ceiling.
    pub fn capped_at(max_delay: Duration) -> Self {
        let max_delay_ms = (max_delay.as_millis() as u64).max(1);
        let defaults = Self::default();
        Self {
            initial_delay_ms: defaults.initial_delay_ms.min(max_delay_ms),
            max_delay_ms,
            ..defaults
        }
    }
}

pub struct ExponentialBackoff {
    config: BackoffConfig,
    attempt: u32,
}

impl ExponentialBackoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self { config, attempt: 0 }
    }

    /// Delay for the next attempt: `initial * multiplier^attempt`, capped, then jittered.
    pub fn next_delay(&mut self) -> Duration {
        let exponent = self.attempt.min(32) as i32;
        self.attempt = self.attempt.saturating_add(1);

        let base = self.config.initial_delay_ms as f64 * self.config.multiplier.powi(exponent);
        let capped = base.min(self.config.max_delay_ms as f64);

        let delay = if self.config.jitter_factor > 0.0 {
            let spread = capped * self.config.jitter_factor;
            let jitter = rand::rng().random_range(-spread..=spread);
            (capped + jitter).clamp(1.0, self.config.max_delay_ms as f64)
        } else {
            capped.max(1.0)
        };

        Duration::from_millis(delay as u64)
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(BackoffConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn without_jitter(initial_delay_ms: u64, max_delay_ms: u64) -> BackoffConfig {
        BackoffConfig {
            initial_delay_ms,
            max_delay_ms,
            multiplier: 2.0,
            jitter_factor: 0.0,
        }
    }

    #[test]
    fn test_first_delay_is_initial() {
        let mut backoff = ExponentialBackoff::new(without_jitter(250, 10_000));
        assert_eq!(backoff.next_delay(), Duration::from_millis(250));
        assert_eq!(backoff.next_delay(), Duration::from_millis(500));
        assert_eq!(backoff.next_delay(), Duration::from_millis(1_000));
    }

    #[test]
    fn test_delay_never_exceeds_cap() {
        let mut backoff = ExponentialBackoff::new(BackoffConfig {
            jitter_factor: 0.5,
            ..without_jitter(1_000, 3_000)
        });

        for _ in 0..20 {
            assert!(backoff.next_delay() <= Duration::from_millis(3_000));
        }
    }

    #[test]
    fn test_reset_restarts_growth() {
        let mut backoff = ExponentialBackoff::new(without_jitter(100, 10_000));
        backoff.next_delay();
        backoff.next_delay();
        assert_eq!(backoff.attempt(), 2);

        backoff.reset();
        assert_eq!(backoff.attempt(), 0);
        assert_eq!(backoff.next_delay(), Duration::from_millis(100));
    }

    #[test]
    fn test_capped_at_small_interval() {
        let config = BackoffConfig::capped_at(Duration::from_millis(200));
        assert_eq!(config.initial_delay_ms, 200);
        assert_eq!(config.max_delay_ms, 200);
    }
}
