//! Configuration for a gateway instance.
//!
//! The waiting period is intentionally absent: it is the compile-time
//! constant [`constants::FIXED_DELAY_BLOCKS`].

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Principal, Result, TimelockError, constants};

/// Startup configuration for a gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Initial owner (cold storage key).
    pub owner: Principal,
    /// Initial admin (hot key).
    pub admin: Principal,
    /// Wall-clock height derivation. `None` when the host feeds heights.
    #[serde(default)]
    pub clock: Option<ClockConfig>,
}

/// Parameters for deriving block heights from wall-clock time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Timestamp of height 0.
    pub genesis: DateTime<Utc>,
    /// Seconds per block.
    #[serde(default = "default_block_time_secs")]
    pub block_time_secs: u64,
}

fn default_block_time_secs() -> u64 {
    constants::EXPECTED_BLOCK_TIME_SECS
}

impl GatewayConfig {
    /// Config with the given principals and host-fed heights.
    #[must_use]
    pub fn new(owner: Principal, admin: Principal) -> Self {
        Self {
            owner,
            admin,
            clock: None,
        }
    }

    /// Parse and validate a JSON config.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(raw)
            .map_err(|e| TimelockError::Configuration(format!("invalid gateway config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Reject configs that could never run safely.
    pub fn validate(&self) -> Result<()> {
        if self.owner.is_zero() {
            return Err(TimelockError::Configuration(
                "owner must not be the zero principal".into(),
            ));
        }
        if self.admin.is_zero() {
            return Err(TimelockError::Configuration(
                "admin must not be the zero principal".into(),
            ));
        }
        if let Some(clock) = &self.clock {
            if clock.block_time_secs == 0 {
                return Err(TimelockError::Configuration(
                    "block_time_secs must be > 0".into(),
                ));
            }
        }
        Ok(())
    }
}
