//! Timelocked operation kinds and their payloads.
//!
//! Every privileged operation goes through request → wait → finalize. The
//! payload is captured at request time and handed unchanged to the
//! downstream adapter at finalize time.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Principal;

/// The six timelocked operation kinds.
///
/// `Mint` is an append-only indexed log; every other kind occupies a single
/// slot where the latest request wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Mint,
    TransferChildrenOwnership,
    ChangeBurnBounds,
    ChangeStakingFees,
    ChangeStaker,
    Delegation,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mint => write!(f, "MINT"),
            Self::TransferChildrenOwnership => write!(f, "TRANSFER_CHILDREN_OWNERSHIP"),
            Self::ChangeBurnBounds => write!(f, "CHANGE_BURN_BOUNDS"),
            Self::ChangeStakingFees => write!(f, "CHANGE_STAKING_FEES"),
            Self::ChangeStaker => write!(f, "CHANGE_STAKER"),
            Self::Delegation => write!(f, "DELEGATION"),
        }
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Credit `amount` of newly issued tokens to `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintRequest {
    pub to: Principal,
    pub amount: Decimal,
}

/// Hand ownership of the managed resource's child components to `new_owner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildOwnershipTransfer {
    pub new_owner: Principal,
}

/// Minimum and maximum amount accepted in a single burn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnBounds {
    pub min: Decimal,
    pub max: Decimal,
}

/// Fee schedule applied by the managed ledger.
///
/// Rates are `numerator / denominator`; flat fees are absolute amounts added
/// on top of the rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingFees {
    pub transfer_fee_numerator: u64,
    pub transfer_fee_denominator: u64,
    pub mint_fee_numerator: u64,
    pub mint_fee_denominator: u64,
    pub mint_fee_flat: Decimal,
    pub burn_fee_numerator: u64,
    pub burn_fee_denominator: u64,
    pub burn_fee_flat: Decimal,
}

impl StakingFees {
    /// All-zero rates with denominator 1, i.e. no fees.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            transfer_fee_numerator: 0,
            transfer_fee_denominator: 1,
            mint_fee_numerator: 0,
            mint_fee_denominator: 1,
            mint_fee_flat: Decimal::ZERO,
            burn_fee_numerator: 0,
            burn_fee_denominator: 1,
            burn_fee_flat: Decimal::ZERO,
        }
    }

    /// Fee owed on a mint of `amount`: `amount * num / den + flat`.
    ///
    /// Returns `None` when the denominator is zero.
    #[must_use]
    pub fn mint_fee(&self, amount: Decimal) -> Option<Decimal> {
        rate_fee(
            amount,
            self.mint_fee_numerator,
            self.mint_fee_denominator,
            self.mint_fee_flat,
        )
    }

    /// Fee owed on a burn of `amount`.
    #[must_use]
    pub fn burn_fee(&self, amount: Decimal) -> Option<Decimal> {
        rate_fee(
            amount,
            self.burn_fee_numerator,
            self.burn_fee_denominator,
            self.burn_fee_flat,
        )
    }

    /// Whether every denominator is non-zero.
    #[must_use]
    pub fn denominators_valid(&self) -> bool {
        self.transfer_fee_denominator != 0
            && self.mint_fee_denominator != 0
            && self.burn_fee_denominator != 0
    }
}

fn rate_fee(amount: Decimal, numerator: u64, denominator: u64, flat: Decimal) -> Option<Decimal> {
    if denominator == 0 {
        return None;
    }
    let rate = amount.checked_mul(Decimal::from(numerator))? / Decimal::from(denominator);
    rate.checked_add(flat)
}

/// Replace the staker that collects fees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakerChange {
    pub new_staker: Principal,
}

/// Point the managed resource at a new delegate target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationChange {
    pub new_delegate: Principal,
}

/// A payload of any kind, as carried by audit events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload")]
pub enum OperationPayload {
    Mint(MintRequest),
    TransferChildrenOwnership(ChildOwnershipTransfer),
    ChangeBurnBounds(BurnBounds),
    ChangeStakingFees(StakingFees),
    ChangeStaker(StakerChange),
    Delegation(DelegationChange),
}

impl OperationPayload {
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Mint(_) => OperationKind::Mint,
            Self::TransferChildrenOwnership(_) => OperationKind::TransferChildrenOwnership,
            Self::ChangeBurnBounds(_) => OperationKind::ChangeBurnBounds,
            Self::ChangeStakingFees(_) => OperationKind::ChangeStakingFees,
            Self::ChangeStaker(_) => OperationKind::ChangeStaker,
            Self::Delegation(_) => OperationKind::Delegation,
        }
    }
}

impl From<MintRequest> for OperationPayload {
    fn from(p: MintRequest) -> Self {
        Self::Mint(p)
    }
}

impl From<ChildOwnershipTransfer> for OperationPayload {
    fn from(p: ChildOwnershipTransfer) -> Self {
        Self::TransferChildrenOwnership(p)
    }
}

impl From<BurnBounds> for OperationPayload {
    fn from(p: BurnBounds) -> Self {
        Self::ChangeBurnBounds(p)
    }
}

impl From<StakingFees> for OperationPayload {
    fn from(p: StakingFees) -> Self {
        Self::ChangeStakingFees(p)
    }
}

impl From<StakerChange> for OperationPayload {
    fn from(p: StakerChange) -> Self {
        Self::ChangeStaker(p)
    }
}

impl From<DelegationChange> for OperationPayload {
    fn from(p: DelegationChange) -> Self {
        Self::Delegation(p)
    }
}

// ---------------------------------------------------------------------------
// Lists
// ---------------------------------------------------------------------------

/// Allow/deny lists kept by the managed resource. Updated immediately, with
/// no timelock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum ListKind {
    /// Addresses allowed to receive mints.
    MintAllow,
    /// Addresses allowed to burn.
    BurnAllow,
    /// Addresses barred from holding or receiving tokens.
    Deny,
    /// Addresses exempt from fees.
    FeeExempt,
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MintAllow => write!(f, "MINT_ALLOW"),
            Self::BurnAllow => write!(f, "BURN_ALLOW"),
            Self::Deny => write!(f, "DENY"),
            Self::FeeExempt => write!(f, "FEE_EXEMPT"),
        }
    }
}
