// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retry policy and body format, resolved once from `[delivery]`.

use std::time::Duration;

use zapbridge_config::WebhookFormat;
use zapbridge_config::model::DeliveryConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryPolicy {
    pub retry_enabled: bool,
    pub retry_count: u32,
    pub base_delay: Duration,
    pub format: WebhookFormat,
    pub timeout: Duration,
}

impl DeliveryPolicy {
    pub fn from_config(config: &DeliveryConfig) -> Self {
        Self {
            retry_enabled: config.retry_enabled,
            retry_count: config.retry_count,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            format: config.format,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Total attempts per delivery: 1 unless retries are enabled.
    pub fn attempts(&self) -> u32 {
        if self.retry_enabled {
            self.retry_count.max(1)
        } else {
            1
        }
    }

    /// Delay after failed attempt `n` (1-based): `base × 2^(n-1)`.
    pub fn backoff(&self, failed_attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(failed_attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self::from_config(&DeliveryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_retries_mean_one_attempt() {
        let policy = DeliveryPolicy {
            retry_count: 5,
            ..DeliveryPolicy::default()
        };
        assert!(!policy.retry_enabled);
        assert_eq!(policy.attempts(), 1);
    }

    #[test]
    fn backoff_doubles() {
        let policy = DeliveryPolicy {
            base_delay: Duration::from_millis(500),
            ..DeliveryPolicy::default()
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(500));
        assert_eq!(policy.backoff(2), Duration::from_millis(1000));
        assert_eq!(policy.backoff(3), Duration::from_millis(2000));
    }

    #[test]
    fn backoff_saturates() {
        let policy = DeliveryPolicy {
            base_delay: Duration::from_secs(1),
            ..DeliveryPolicy::default()
        };
        assert!(policy.backoff(200) >= Duration::from_secs(1 << 30));
    }
}
