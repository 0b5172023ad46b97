//! Supply conservation invariant checker.
//!
//! Invariant checked after every balance mutation:
//! ```text
//! Σ(balances) == Σ(minted) - Σ(burned)
//! ```
//!
//! Fees only move tokens between holders, so they never show up here.

use rust_decimal::Decimal;
use timelock_types::{Result, TimelockError};

/// Running issuance totals since genesis.
#[derive(Debug, Clone, Default)]
pub struct SupplyTracker {
    minted: Decimal,
    burned: Decimal,
}

impl SupplyTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add to the minted total. Leaves the tracker unchanged on overflow.
    pub fn record_mint(&mut self, amount: Decimal) -> Result<()> {
        self.minted = self
            .minted
            .checked_add(amount)
            .ok_or_else(|| overflow("minted", self.minted, amount))?;
        Ok(())
    }

    pub fn record_burn(&mut self, amount: Decimal) -> Result<()> {
        self.burned = self
            .burned
            .checked_add(amount)
            .ok_or_else(|| overflow("burned", self.burned, amount))?;
        Ok(())
    }

    /// Expected circulating supply: minted - burned.
    #[must_use]
    pub fn expected_supply(&self) -> Decimal {
        self.minted - self.burned
    }

    #[must_use]
    pub fn total_minted(&self) -> Decimal {
        self.minted
    }

    #[must_use]
    pub fn total_burned(&self) -> Decimal {
        self.burned
    }

    /// Compare `actual_supply` (sum of all balances) against the totals.
    pub fn verify(&self, actual_supply: Decimal) -> Result<()> {
        let expected = self.expected_supply();
        if actual_supply != expected {
            return Err(TimelockError::Internal(format!(
                "supply invariant violated: actual {actual_supply} != expected {expected} \
                 (minted={}, burned={})",
                self.minted, self.burned
            )));
        }
        Ok(())
    }
}

fn overflow(total: &str, current: Decimal, amount: Decimal) -> TimelockError {
    TimelockError::EffectRejected {
        reason: format!("{total} total {current} + {amount} would overflow"),
    }
}
