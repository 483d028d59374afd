//! Runtime configuration.
//!
//! Defaults come from [`crate::constants`]. Every field is optional when
//! deserializing, so a config file only needs the values it overrides.

use crate::constants::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Pre-read delay that grows with the attempt index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backoff {
    pub base_ms: u64,
    pub step_ms: u64,
}

impl Backoff {
    /// Delay before reading on attempt `attempt` (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(
            self.base_ms
                .saturating_add(self.step_ms.saturating_mul(attempt as u64)),
        )
    }
}

/// Every wait the engines perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    pub energy_pre_read: Backoff,
    pub p_value_pre_read: Backoff,
    pub query_retry_ms: u64,
    pub write_settle_ms: u64,
    pub write_retry_ms: u64,
    pub verify_delay_ms: u64,
    pub inter_probe_ms: u64,
    pub read_timeout_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            energy_pre_read: Backoff {
                base_ms: ENERGY_PRE_READ_BASE_MS,
                step_ms: ENERGY_PRE_READ_STEP_MS,
            },
            p_value_pre_read: Backoff {
                base_ms: P_VALUE_PRE_READ_BASE_MS,
                step_ms: P_VALUE_PRE_READ_STEP_MS,
            },
            query_retry_ms: QUERY_RETRY_DELAY_MS,
            write_settle_ms: WRITE_SETTLE_MS,
            write_retry_ms: WRITE_RETRY_DELAY_MS,
            verify_delay_ms: VERIFY_DELAY_MS,
            inter_probe_ms: INTER_PROBE_DELAY_MS,
            read_timeout_ms: TIMEOUT_MS,
        }
    }
}

impl Timing {
    pub fn query_retry(&self) -> Duration {
        Duration::from_millis(self.query_retry_ms)
    }

    pub fn write_settle(&self) -> Duration {
        Duration::from_millis(self.write_settle_ms)
    }

    pub fn write_retry(&self) -> Duration {
        Duration::from_millis(self.write_retry_ms)
    }

    pub fn verify_delay(&self) -> Duration {
        Duration::from_millis(self.verify_delay_ms)
    }

    pub fn inter_probe(&self) -> Duration {
        Duration::from_millis(self.inter_probe_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// Serial link and retry settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub baud_rate: u32,
    /// Attempts per exchange, including the first
    pub retries: u32,
    pub timing: Timing,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            baud_rate: BAUD_RATE,
            retries: MAX_RETRIES,
            timing: Timing::default(),
        }
    }
}
