//! Height sources for measuring the waiting period.
//!
//! The controller never reads time directly. Hosts that follow a chain feed
//! block heights into a [`ManualClock`]; standalone deployments derive a
//! height from wall-clock time with a [`WallClock`].

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use chrono::{DateTime, Utc};
use timelock_types::{ClockConfig, Height, Result, TimelockError};

/// A monotonically non-decreasing block height.
pub trait HeightSource {
    fn current_height(&self) -> Height;
}

/// Host-fed height counter.
///
/// Clones share the same counter, so the host keeps one handle and the
/// controller owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    height: Arc<AtomicU64>,
}

impl ManualClock {
    #[must_use]
    pub fn new(start: Height) -> Self {
        Self {
            height: Arc::new(AtomicU64::new(start.0)),
        }
    }

    /// Move to `height`. Ignored if it would go backwards.
    pub fn set(&self, height: Height) {
        self.height.fetch_max(height.0, Ordering::SeqCst);
    }

    /// Advance by `blocks` and return the new height.
    pub fn advance(&self, blocks: u64) -> Height {
        let previous = self
            .height
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |h| {
                Some(h.saturating_add(blocks))
            })
            .unwrap_or_else(|h| h);
        Height(previous.saturating_add(blocks))
    }
}

impl HeightSource for ManualClock {
    fn current_height(&self) -> Height {
        Height(self.height.load(Ordering::SeqCst))
    }
}

/// Height derived from elapsed wall-clock time since genesis.
#[derive(Debug, Clone)]
pub struct WallClock {
    genesis: DateTime<Utc>,
    block_time_secs: u64,
}

impl WallClock {
    /// Fails with a configuration error if `block_time_secs` is zero.
    pub fn new(genesis: DateTime<Utc>, block_time_secs: u64) -> Result<Self> {
        if block_time_secs == 0 {
            return Err(TimelockError::Configuration(
                "block_time_secs must be > 0".into(),
            ));
        }
        Ok(Self {
            genesis,
            block_time_secs,
        })
    }

    pub fn from_config(cfg: &ClockConfig) -> Result<Self> {
        Self::new(cfg.genesis, cfg.block_time_secs)
    }

    /// Height at an arbitrary instant. Instants before genesis map to 0.
    #[must_use]
    pub fn height_at(&self, at: DateTime<Utc>) -> Height {
        let elapsed = (at - self.genesis).num_seconds();
        let elapsed = u64::try_from(elapsed).unwrap_or(0);
        Height(elapsed / self.block_time_secs)
    }
}

impl HeightSource for WallClock {
    fn current_height(&self) -> Height {
        self.height_at(Utc::now())
    }
}
