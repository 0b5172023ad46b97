//! Downstream effect adapter interface.
//!
//! The controller decides *whether* an operation may take effect; the
//! adapter decides *how*. Every method is fallible and is called at most
//! once per matured request, after the pending slot has already been
//! cleared. The controller never retries.
//!
//! The current delegate, the lists and the ledger balances all live behind
//! this trait. The controller keeps no copy of them.

use rust_decimal::Decimal;
use timelock_types::{BurnBounds, ListKind, Principal, Result, StakingFees};

/// Capabilities the managed resource exposes to the gateway.
pub trait DownstreamEffects {
    /// Credit newly issued tokens.
    fn mint(&mut self, to: Principal, amount: Decimal) -> Result<()>;

    /// Start handing the resource's child components to `new_owner`.
    fn transfer_children_ownership(&mut self, new_owner: Principal) -> Result<()>;

    fn change_burn_bounds(&mut self, bounds: &BurnBounds) -> Result<()>;

    fn change_staking_fees(&mut self, fees: &StakingFees) -> Result<()>;

    fn change_staker(&mut self, new_staker: Principal) -> Result<()>;

    /// Point the resource at a new delegate target.
    fn delegate(&mut self, new_delegate: Principal) -> Result<()>;

    /// Set (`flag = true`) or clear an allow/deny list entry. Not timelocked.
    fn update_list(&mut self, list: ListKind, entry: Principal, flag: bool) -> Result<()>;

    /// Accept ownership of `target` on behalf of the gateway. Not timelocked.
    fn claim_ownership(&mut self, target: Principal) -> Result<()>;
}
