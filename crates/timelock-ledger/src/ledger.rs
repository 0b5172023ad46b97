//! In-memory token ledger driven by the timelock controller.
//!
//! The ledger is the managed resource: it owns balances, the fee schedule,
//! the burn bounds, the staker and delegate, the allow/deny lists and a set
//! of child components. The gateway reaches it only through
//! [`DownstreamEffects`]; holders reach it through [`TokenLedger::transfer`]
//! and [`TokenLedger::burn`].
//!
//! Every mutation is atomic: it either completes or leaves the ledger
//! unchanged, and the supply invariant is re-checked afterwards. New
//! balances and totals are computed with checked arithmetic before anything
//! is written, so an overflow rejects the effect instead of panicking.
//!
//! Mints are allow-list gated: a recipient must be on
//! [`ListKind::MintAllow`] and off [`ListKind::Deny`].

use std::collections::{BTreeMap, HashMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use timelock_controller::DownstreamEffects;
use timelock_types::{BurnBounds, ListKind, Principal, Result, StakingFees, TimelockError};

use crate::supply::SupplyTracker;

/// Ownership record of a component the ledger delegates storage to.
///
/// Ownership moves in two steps: the current owner nominates, the nominee
/// claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildComponent {
    pub owner: Principal,
    pub pending_owner: Option<Principal>,
}

/// Point-in-time view of the ledger, for hosts and audit tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Non-zero balances, ordered by holder.
    pub balances: Vec<(Principal, Decimal)>,
    pub total_supply: Decimal,
    pub burn_bounds: BurnBounds,
    pub fees: StakingFees,
    pub staker: Option<Principal>,
    pub delegate: Option<Principal>,
}

/// Reference implementation of the managed token.
pub struct TokenLedger {
    /// Principal the gateway acts as when it claims components.
    gateway: Principal,
    balances: HashMap<Principal, Decimal>,
    supply: SupplyTracker,
    burn_bounds: BurnBounds,
    fees: StakingFees,
    /// Collects every fee. With no staker set, no fee is charged.
    staker: Option<Principal>,
    delegate: Option<Principal>,
    lists: HashMap<ListKind, HashSet<Principal>>,
    children: BTreeMap<Principal, ChildComponent>,
}

impl TokenLedger {
    /// Empty ledger administered by `gateway`: no fees, unbounded burns.
    #[must_use]
    pub fn new(gateway: Principal) -> Self {
        Self {
            gateway,
            balances: HashMap::new(),
            supply: SupplyTracker::new(),
            burn_bounds: BurnBounds {
                min: Decimal::ZERO,
                max: Decimal::MAX,
            },
            fees: StakingFees::zero(),
            staker: None,
            delegate: None,
            lists: HashMap::new(),
            children: BTreeMap::new(),
        }
    }

    /// Attach a child component, initially owned by `owner`.
    pub fn register_child(&mut self, child: Principal, owner: Principal) {
        self.children.insert(
            child,
            ChildComponent {
                owner,
                pending_owner: None,
            },
        );
    }

    // =================================================================
    // Holder operations
    // =================================================================

    /// Move `amount` from `from` to `to`. The transfer fee is taken from the
    /// amount received.
    pub fn transfer(&mut self, from: Principal, to: Principal, amount: Decimal) -> Result<()> {
        Self::require_positive(amount)?;
        self.require_not_denied(from)?;
        self.require_not_denied(to)?;
        let available = self.balance(from);
        if available < amount {
            return Err(reject(format!(
                "insufficient balance: {from} holds {available}, needs {amount}"
            )));
        }

        let fee = if self.fee_applies(from) {
            rate(
                amount,
                self.fees.transfer_fee_numerator,
                self.fees.transfer_fee_denominator,
            )?
        } else {
            Decimal::ZERO
        };
        if fee > amount {
            return Err(reject(format!(
                "transfer fee {fee} exceeds amount {amount}"
            )));
        }

        let staged = self.stage_credits(&[
            (Some(from), -amount),
            (Some(to), amount - fee),
            (self.staker, fee),
        ])?;
        self.apply_credits(staged);

        tracing::debug!(
            from = %from.short(),
            to = %to.short(),
            %amount,
            %fee,
            "Transfer applied"
        );
        self.verify_supply()
    }

    /// Destroy `amount` held by `from`. The burn fee goes to the staker and
    /// stays in circulation. Returns the amount actually destroyed.
    pub fn burn(&mut self, from: Principal, amount: Decimal) -> Result<Decimal> {
        if !self.is_listed(ListKind::BurnAllow, from) {
            return Err(reject(format!("{from} is not on the burn allow list")));
        }
        self.require_not_denied(from)?;
        if amount < self.burn_bounds.min || amount > self.burn_bounds.max {
            return Err(reject(format!(
                "burn of {amount} outside bounds [{}, {}]",
                self.burn_bounds.min, self.burn_bounds.max
            )));
        }
        let available = self.balance(from);
        if available < amount {
            return Err(reject(format!(
                "insufficient balance: {from} holds {available}, needs {amount}"
            )));
        }

        let fee = if self.fee_applies(from) {
            self.fees
                .burn_fee(amount)
                .ok_or_else(|| reject("burn fee overflow".to_string()))?
        } else {
            Decimal::ZERO
        };
        if fee > amount {
            return Err(reject(format!("burn fee {fee} exceeds amount {amount}")));
        }
        let destroyed = amount - fee;

        let staged = self.stage_credits(&[(Some(from), -amount), (self.staker, fee)])?;
        self.supply.record_burn(destroyed)?;
        self.apply_credits(staged);

        tracing::info!(from = %from.short(), %amount, %fee, %destroyed, "Burn applied");
        self.verify_supply()?;
        Ok(destroyed)
    }

    // =================================================================
    // Views
    // =================================================================

    #[must_use]
    pub fn gateway(&self) -> Principal {
        self.gateway
    }

    #[must_use]
    pub fn balance(&self, who: Principal) -> Decimal {
        self.balances.get(&who).copied().unwrap_or(Decimal::ZERO)
    }

    /// Sum of all balances. Saturates at `Decimal::MAX`, which the supply
    /// invariant rules out.
    #[must_use]
    pub fn total_supply(&self) -> Decimal {
        self.balances
            .values()
            .fold(Decimal::ZERO, |acc, b| acc.saturating_add(*b))
    }

    #[must_use]
    pub fn supply(&self) -> &SupplyTracker {
        &self.supply
    }

    #[must_use]
    pub fn burn_bounds(&self) -> BurnBounds {
        self.burn_bounds
    }

    #[must_use]
    pub fn fees(&self) -> StakingFees {
        self.fees
    }

    #[must_use]
    pub fn staker(&self) -> Option<Principal> {
        self.staker
    }

    #[must_use]
    pub fn delegate(&self) -> Option<Principal> {
        self.delegate
    }

    #[must_use]
    pub fn is_listed(&self, list: ListKind, who: Principal) -> bool {
        self.lists.get(&list).is_some_and(|set| set.contains(&who))
    }

    #[must_use]
    pub fn child(&self, child: Principal) -> Option<&ChildComponent> {
        self.children.get(&child)
    }

    #[must_use]
    pub fn snapshot(&self) -> LedgerSnapshot {
        let mut balances: Vec<(Principal, Decimal)> = self
            .balances
            .iter()
            .filter(|(_, amount)| !amount.is_zero())
            .map(|(who, amount)| (*who, *amount))
            .collect();
        balances.sort_by_key(|(who, _)| *who);

        LedgerSnapshot {
            balances,
            total_supply: self.total_supply(),
            burn_bounds: self.burn_bounds,
            fees: self.fees,
            staker: self.staker,
            delegate: self.delegate,
        }
    }

    /// Check the conservation invariant against the current balances.
    pub fn verify_supply(&self) -> Result<()> {
        let actual = self
            .balances
            .values()
            .try_fold(Decimal::ZERO, |acc, b| acc.checked_add(*b))
            .ok_or_else(|| {
                TimelockError::Internal("supply invariant violated: balances overflow".into())
            })?;
        self.supply.verify(actual)
    }

    // =================================================================
    // Internals
    // =================================================================

    /// Resulting balances after the given signed credits, or an error if
    /// any would overflow. Nothing is written. A `None` recipient (no
    /// staker) is skipped.
    fn stage_credits(
        &self,
        credits: &[(Option<Principal>, Decimal)],
    ) -> Result<Vec<(Principal, Decimal)>> {
        let mut staged: Vec<(Principal, Decimal)> = Vec::with_capacity(credits.len());
        for (who, amount) in credits {
            let Some(who) = *who else { continue };
            if amount.is_zero() {
                continue;
            }
            let current = staged
                .iter()
                .rev()
                .find(|(p, _)| *p == who)
                .map_or_else(|| self.balance(who), |(_, b)| *b);
            let next = current
                .checked_add(*amount)
                .ok_or_else(|| reject(format!("balance of {who} would overflow")))?;
            staged.push((who, next));
        }
        Ok(staged)
    }

    fn apply_credits(&mut self, staged: Vec<(Principal, Decimal)>) {
        for (who, balance) in staged {
            if balance.is_zero() {
                self.balances.remove(&who);
            } else {
                self.balances.insert(who, balance);
            }
        }
    }

    fn fee_applies(&self, payer: Principal) -> bool {
        self.staker.is_some() && !self.is_listed(ListKind::FeeExempt, payer)
    }

    fn require_not_denied(&self, who: Principal) -> Result<()> {
        if self.is_listed(ListKind::Deny, who) {
            return Err(reject(format!("{who} is on the deny list")));
        }
        Ok(())
    }

    fn require_positive(amount: Decimal) -> Result<()> {
        if amount <= Decimal::ZERO {
            return Err(reject(format!("amount must be positive, got {amount}")));
        }
        Ok(())
    }
}

impl DownstreamEffects for TokenLedger {
    fn mint(&mut self, to: Principal, amount: Decimal) -> Result<()> {
        Self::require_positive(amount)?;
        self.require_not_denied(to)?;
        if !self.is_listed(ListKind::MintAllow, to) {
            return Err(reject(format!("{to} is not on the mint allow list")));
        }

        let fee = if self.fee_applies(to) {
            self.fees
                .mint_fee(amount)
                .ok_or_else(|| reject("mint fee overflow".to_string()))?
        } else {
            Decimal::ZERO
        };
        if fee > amount {
            return Err(reject(format!("mint fee {fee} exceeds amount {amount}")));
        }

        let staged = self.stage_credits(&[(Some(to), amount - fee), (self.staker, fee)])?;
        self.supply.record_mint(amount)?;
        self.apply_credits(staged);

        tracing::info!(to = %to.short(), %amount, %fee, "Mint applied");
        self.verify_supply()
    }

    fn transfer_children_ownership(&mut self, new_owner: Principal) -> Result<()> {
        if new_owner.is_zero() {
            return Err(reject("new owner must not be the zero principal".to_string()));
        }
        for component in self.children.values_mut() {
            component.pending_owner = Some(new_owner);
        }
        tracing::info!(
            new_owner = %new_owner.short(),
            children = self.children.len(),
            "Child ownership transfer started"
        );
        Ok(())
    }

    fn change_burn_bounds(&mut self, bounds: &BurnBounds) -> Result<()> {
        if bounds.min < Decimal::ZERO || bounds.min > bounds.max {
            return Err(reject(format!(
                "invalid burn bounds [{}, {}]",
                bounds.min, bounds.max
            )));
        }
        self.burn_bounds = *bounds;
        tracing::info!(min = %bounds.min, max = %bounds.max, "Burn bounds changed");
        Ok(())
    }

    fn change_staking_fees(&mut self, fees: &StakingFees) -> Result<()> {
        if !fees.denominators_valid() {
            return Err(reject("fee denominators must be non-zero".to_string()));
        }
        if fees.mint_fee_flat < Decimal::ZERO || fees.burn_fee_flat < Decimal::ZERO {
            return Err(reject("flat fees must not be negative".to_string()));
        }
        self.fees = *fees;
        tracing::info!(
            transfer_num = fees.transfer_fee_numerator,
            transfer_den = fees.transfer_fee_denominator,
            mint_num = fees.mint_fee_numerator,
            mint_den = fees.mint_fee_denominator,
            mint_flat = %fees.mint_fee_flat,
            burn_num = fees.burn_fee_numerator,
            burn_den = fees.burn_fee_denominator,
            burn_flat = %fees.burn_fee_flat,
            "Staking fees changed"
        );
        Ok(())
    }

    fn change_staker(&mut self, new_staker: Principal) -> Result<()> {
        if new_staker.is_zero() {
            return Err(reject("staker must not be the zero principal".to_string()));
        }
        self.staker = Some(new_staker);
        tracing::info!(staker = %new_staker.short(), "Staker changed");
        Ok(())
    }

    fn delegate(&mut self, new_delegate: Principal) -> Result<()> {
        self.delegate = Some(new_delegate);
        tracing::info!(delegate = %new_delegate.short(), "Delegate changed");
        Ok(())
    }

    fn update_list(&mut self, list: ListKind, entry: Principal, flag: bool) -> Result<()> {
        let set = self.lists.entry(list).or_default();
        let changed = if flag {
            set.insert(entry)
        } else {
            set.remove(&entry)
        };
        tracing::debug!(%list, entry = %entry.short(), flag, changed, "List entry written");
        Ok(())
    }

    fn claim_ownership(&mut self, target: Principal) -> Result<()> {
        let gateway = self.gateway;
        let component = self
            .children
            .get_mut(&target)
            .ok_or_else(|| reject(format!("unknown component {target}")))?;
        if component.pending_owner != Some(gateway) {
            return Err(reject(format!(
                "gateway {gateway} is not the pending owner of {target}"
            )));
        }
        component.owner = gateway;
        component.pending_owner = None;
        tracing::info!(target = %target.short(), "Component ownership claimed");
        Ok(())
    }
}

fn reject(reason: String) -> TimelockError {
    TimelockError::EffectRejected { reason }
}

fn rate(amount: Decimal, numerator: u64, denominator: u64) -> Result<Decimal> {
    if denominator == 0 {
        return Err(reject("fee denominator is zero".to_string()));
    }
    amount
        .checked_mul(Decimal::from(numerator))
        .map(|scaled| scaled / Decimal::from(denominator))
        .ok_or_else(|| reject("transfer fee overflow".to_string()))
}
