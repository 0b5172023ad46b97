//! Request/finalize engine: the single entry point for privileged operations.
//!
//! ## Flow
//!
//! ```text
//! request_*  → authority gate → PendingStore (write) → OperationRequested
//!                 ... FIXED_DELAY blocks (zero if the owner asked) ...
//! finalize_* → authority gate → presence → continuity → maturity
//!            → PendingStore (clear) → DownstreamEffects (apply)
//!            → OperationFinalized | OperationDiscarded + DownstreamFailure
//! ```
//!
//! The slot is cleared **before** the effect runs. If the effect fails the
//! request is lost and must be issued again; it can never be applied twice.
//!
//! Continuity: a pending operation records the admin installed at request
//! time. Once the owner replaces that admin the operation can no longer be
//! finalized by anyone, even after it matures. It stays in its slot until
//! a new request overwrites it.

use rust_decimal::Decimal;
use timelock_types::{
    BurnBounds, ChildOwnershipTransfer, DelegationChange, EventRecord, GatewayConfig,
    GatewayEvent, Height, ListKind, MintIndex, MintRequest, OperationKind, OperationPayload,
    PendingOperation, Principal, Result, StakerChange, StakingFees, TimelockError, constants,
};

use crate::{
    authority::AuthorityManager,
    clock::HeightSource,
    effects::DownstreamEffects,
    journal::EventJournal,
    store::{PendingStore, Slot},
};

/// Dual-authority timelock gateway in front of a managed resource `E`,
/// measuring delays with height source `C`.
///
/// Every mutating call takes `&mut self`, so calls are strictly serialized:
/// a state transition always runs to completion before the next begins.
pub struct TimelockController<E, C> {
    authority: AuthorityManager,
    store: PendingStore,
    effects: E,
    clock: C,
    journal: EventJournal,
}

impl<E: DownstreamEffects, C: HeightSource> TimelockController<E, C> {
    #[must_use]
    pub fn new(owner: Principal, admin: Principal, effects: E, clock: C) -> Self {
        Self {
            authority: AuthorityManager::new(owner, admin),
            store: PendingStore::new(),
            effects,
            clock,
            journal: EventJournal::new(),
        }
    }

    /// Build from a validated config.
    pub fn from_config(cfg: &GatewayConfig, effects: E, clock: C) -> Result<Self> {
        cfg.validate()?;
        tracing::info!(
            gateway = constants::GATEWAY_NAME,
            version = constants::VERSION,
            owner = %cfg.owner.short(),
            admin = %cfg.admin.short(),
            delay_blocks = constants::FIXED_DELAY_BLOCKS,
            "Timelock controller initialized"
        );
        Ok(Self::new(cfg.owner, cfg.admin, effects, clock))
    }

    /// `now` for the owner, `now + FIXED_DELAY_BLOCKS` for anyone else.
    #[must_use]
    pub fn compute_release_height(&self, caller: Principal, now: Height) -> Height {
        if self.authority.is_owner(caller) {
            now
        } else {
            now.after(constants::FIXED_DELAY_BLOCKS)
        }
    }

    // =================================================================
    // Requests
    // =================================================================

    /// Queue a mint. Returns the index needed to finalize it; the same index
    /// is carried by the `OperationRequested` event.
    pub fn request_mint(
        &mut self,
        caller: Principal,
        to: Principal,
        amount: Decimal,
    ) -> Result<MintIndex> {
        let (requested_by, release_height) = self.stage(caller)?;
        let payload = MintRequest { to, amount };
        let index = self.store.mints.append(PendingOperation::new(
            payload.clone(),
            requested_by,
            release_height,
        ));

        tracing::info!(
            kind = %OperationKind::Mint,
            %index,
            to = %to.short(),
            %amount,
            release_height = release_height.0,
            requested_by = %requested_by.short(),
            "Request recorded"
        );
        self.record(GatewayEvent::OperationRequested {
            payload: payload.into(),
            index: Some(index),
            release_height,
            requested_by,
            caller,
        });
        Ok(index)
    }

    pub fn request_transfer_children_ownership(
        &mut self,
        caller: Principal,
        new_owner: Principal,
    ) -> Result<()> {
        self.request_single(
            caller,
            ChildOwnershipTransfer { new_owner },
            |s| &mut s.transfer_children_ownership,
        )
    }

    pub fn request_change_burn_bounds(
        &mut self,
        caller: Principal,
        min: Decimal,
        max: Decimal,
    ) -> Result<()> {
        self.request_single(caller, BurnBounds { min, max }, |s| &mut s.burn_bounds)
    }

    pub fn request_change_staking_fees(&mut self, caller: Principal, fees: StakingFees) -> Result<()> {
        self.request_single(caller, fees, |s| &mut s.staking_fees)
    }

    pub fn request_change_staker(&mut self, caller: Principal, new_staker: Principal) -> Result<()> {
        self.request_single(caller, StakerChange { new_staker }, |s| &mut s.staker)
    }

    pub fn request_delegation(&mut self, caller: Principal, new_delegate: Principal) -> Result<()> {
        self.request_single(caller, DelegationChange { new_delegate }, |s| {
            &mut s.delegation
        })
    }

    // =================================================================
    // Finalization
    // =================================================================

    /// Apply the mint at `index`. Other indices are unaffected.
    pub fn finalize_mint(&mut self, caller: Principal, index: MintIndex) -> Result<()> {
        self.authority.require_owner_or_admin(caller)?;
        let now = self.clock.current_height();
        let op = self
            .store
            .mints
            .get(index)
            .ok_or(TimelockError::MintNotPending(index))?;
        Self::check_finalizable(&self.authority, OperationKind::Mint, op, now)?;

        let op = self
            .store
            .mints
            .take(index)
            .ok_or(TimelockError::MintNotPending(index))?;
        let outcome = self.effects.mint(op.payload.to, op.payload.amount);
        self.settle(caller, op.payload.into(), Some(index), outcome)
    }

    pub fn finalize_transfer_children_ownership(&mut self, caller: Principal) -> Result<()> {
        let op = self.take_finalizable(caller, OperationKind::TransferChildrenOwnership, |s| {
            &mut s.transfer_children_ownership
        })?;
        let outcome = self.effects.transfer_children_ownership(op.payload.new_owner);
        self.settle(caller, op.payload.into(), None, outcome)
    }

    pub fn finalize_change_burn_bounds(&mut self, caller: Principal) -> Result<()> {
        let op = self.take_finalizable(caller, OperationKind::ChangeBurnBounds, |s| {
            &mut s.burn_bounds
        })?;
        let outcome = self.effects.change_burn_bounds(&op.payload);
        self.settle(caller, op.payload.into(), None, outcome)
    }

    pub fn finalize_change_staking_fees(&mut self, caller: Principal) -> Result<()> {
        let op = self.take_finalizable(caller, OperationKind::ChangeStakingFees, |s| {
            &mut s.staking_fees
        })?;
        let outcome = self.effects.change_staking_fees(&op.payload);
        self.settle(caller, op.payload.into(), None, outcome)
    }

    pub fn finalize_change_staker(&mut self, caller: Principal) -> Result<()> {
        let op =
            self.take_finalizable(caller, OperationKind::ChangeStaker, |s| &mut s.staker)?;
        let outcome = self.effects.change_staker(op.payload.new_staker);
        self.settle(caller, op.payload.into(), None, outcome)
    }

    pub fn finalize_delegation(&mut self, caller: Principal) -> Result<()> {
        let op =
            self.take_finalizable(caller, OperationKind::Delegation, |s| &mut s.delegation)?;
        let outcome = self.effects.delegate(op.payload.new_delegate);
        self.settle(caller, op.payload.into(), None, outcome)
    }

    // =================================================================
    // Authority
    // =================================================================

    /// Install a new admin. Owner only, immediate. Every operation requested
    /// under the previous admin becomes unfinalizable.
    pub fn transfer_adminship(&mut self, caller: Principal, new_admin: Principal) -> Result<()> {
        let event = self.authority.replace_admin(caller, new_admin)?;
        self.record(event);
        Ok(())
    }

    /// Nominate a successor owner. Owner only.
    pub fn propose_owner(&mut self, caller: Principal, candidate: Principal) -> Result<()> {
        let event = self.authority.propose_new_owner(caller, candidate)?;
        self.record(event);
        Ok(())
    }

    /// Complete a nomination. Only the nominated candidate may call.
    pub fn accept_ownership(&mut self, caller: Principal) -> Result<()> {
        let event = self.authority.accept_ownership(caller)?;
        self.record(event);
        Ok(())
    }

    // =================================================================
    // Immediate passthroughs
    // =================================================================

    /// Set or clear a list entry. Owner or admin, no delay, no pending state.
    pub fn update_list(
        &mut self,
        caller: Principal,
        list: ListKind,
        entry: Principal,
        flag: bool,
    ) -> Result<()> {
        self.authority.require_owner_or_admin(caller)?;
        self.effects.update_list(list, entry, flag)?;
        tracing::info!(%list, entry = %entry.short(), flag, "List updated");
        self.record(GatewayEvent::ListUpdated {
            list,
            entry,
            flag,
            caller,
        });
        Ok(())
    }

    /// Claim ownership of a child component that was handed to the gateway.
    /// Owner or admin, no delay, no pending state.
    pub fn issue_claim_ownership(&mut self, caller: Principal, target: Principal) -> Result<()> {
        self.authority.require_owner_or_admin(caller)?;
        self.effects.claim_ownership(target)?;
        tracing::info!(target = %target.short(), "Ownership claim issued");
        self.record(GatewayEvent::ClaimOwnershipIssued { target, caller });
        Ok(())
    }

    // =================================================================
    // Views
    // =================================================================

    #[must_use]
    pub fn authority(&self) -> &AuthorityManager {
        &self.authority
    }

    #[must_use]
    pub fn effects(&self) -> &E {
        &self.effects
    }

    #[must_use]
    pub fn current_height(&self) -> Height {
        self.clock.current_height()
    }

    #[must_use]
    pub fn pending_mint(&self, index: MintIndex) -> Option<&PendingOperation<MintRequest>> {
        self.store.mints.get(index)
    }

    /// Every index ever assigned, cleared ones included.
    #[must_use]
    pub fn mint_count(&self) -> usize {
        self.store.mints.len()
    }

    /// Mints still pending, in index order.
    pub fn pending_mints(
        &self,
    ) -> impl Iterator<Item = (MintIndex, &PendingOperation<MintRequest>)> {
        self.store.mints.iter_pending()
    }

    #[must_use]
    pub fn pending_transfer_children_ownership(
        &self,
    ) -> Option<&PendingOperation<ChildOwnershipTransfer>> {
        self.store.transfer_children_ownership.peek()
    }

    #[must_use]
    pub fn pending_burn_bounds(&self) -> Option<&PendingOperation<BurnBounds>> {
        self.store.burn_bounds.peek()
    }

    #[must_use]
    pub fn pending_staking_fees(&self) -> Option<&PendingOperation<StakingFees>> {
        self.store.staking_fees.peek()
    }

    #[must_use]
    pub fn pending_staker(&self) -> Option<&PendingOperation<StakerChange>> {
        self.store.staker.peek()
    }

    #[must_use]
    pub fn pending_delegation(&self) -> Option<&PendingOperation<DelegationChange>> {
        self.store.delegation.peek()
    }

    #[must_use]
    pub fn journal(&self) -> &EventJournal {
        &self.journal
    }

    /// Hand every undrained audit record to the host.
    pub fn drain_events(&mut self) -> Vec<EventRecord> {
        self.journal.drain()
    }

    // =================================================================
    // Internals
    // =================================================================

    /// Authority gate plus the two values every request stores.
    fn stage(&self, caller: Principal) -> Result<(Principal, Height)> {
        self.authority.require_owner_or_admin(caller)?;
        let now = self.clock.current_height();
        Ok((
            self.authority.current_admin(),
            self.compute_release_height(caller, now),
        ))
    }

    /// Store a single-slot request, overwriting whatever was pending.
    fn request_single<T, F>(&mut self, caller: Principal, payload: T, slot_of: F) -> Result<()>
    where
        T: Clone + Into<OperationPayload>,
        F: FnOnce(&mut PendingStore) -> &mut Slot<T>,
    {
        let (requested_by, release_height) = self.stage(caller)?;
        let superseded = slot_of(&mut self.store).put(PendingOperation::new(
            payload.clone(),
            requested_by,
            release_height,
        ));
        let payload: OperationPayload = payload.into();
        if let Some(previous) = superseded {
            tracing::debug!(
                kind = %payload.kind(),
                previous_release = previous.release_height.0,
                "Unfinalized request superseded"
            );
        }

        tracing::info!(
            kind = %payload.kind(),
            release_height = release_height.0,
            requested_by = %requested_by.short(),
            caller = %caller.short(),
            "Request recorded"
        );
        self.record(GatewayEvent::OperationRequested {
            payload,
            index: None,
            release_height,
            requested_by,
            caller,
        });
        Ok(())
    }

    /// Run every finalize precondition on a single slot and, if they all
    /// hold, clear it and return what it held.
    fn take_finalizable<T, F>(
        &mut self,
        caller: Principal,
        kind: OperationKind,
        slot_of: F,
    ) -> Result<PendingOperation<T>>
    where
        F: FnOnce(&mut PendingStore) -> &mut Slot<T>,
    {
        self.authority.require_owner_or_admin(caller)?;
        let now = self.clock.current_height();
        let slot = slot_of(&mut self.store);
        let op = slot.peek().ok_or(TimelockError::NothingPending(kind))?;
        Self::check_finalizable(&self.authority, kind, op, now)?;
        slot.take().ok_or(TimelockError::NothingPending(kind))
    }

    /// Continuity, then maturity.
    fn check_finalizable<T>(
        authority: &AuthorityManager,
        kind: OperationKind,
        op: &PendingOperation<T>,
        now: Height,
    ) -> Result<()> {
        let current_admin = authority.current_admin();
        if !op.is_continuous_with(current_admin) {
            tracing::warn!(
                %kind,
                requested_by = %op.requested_by.short(),
                current_admin = %current_admin.short(),
                "Finalize rejected: requested under a replaced admin"
            );
            return Err(TimelockError::StaleRequest {
                kind,
                requested_by: op.requested_by,
                current_admin,
            });
        }
        if !op.is_matured(now) {
            tracing::warn!(
                %kind,
                release_height = op.release_height.0,
                now = now.0,
                blocks_left = now.blocks_until(op.release_height),
                "Finalize rejected: not yet matured"
            );
            return Err(TimelockError::NotYetMatured {
                kind,
                release_height: op.release_height,
                now,
            });
        }
        Ok(())
    }

    /// Journal the outcome of a downstream call made after the slot was
    /// cleared.
    fn settle(
        &mut self,
        caller: Principal,
        payload: OperationPayload,
        index: Option<MintIndex>,
        outcome: Result<()>,
    ) -> Result<()> {
        let kind = payload.kind();
        match outcome {
            Ok(()) => {
                tracing::info!(%kind, ?index, caller = %caller.short(), "Operation finalized");
                self.record(GatewayEvent::OperationFinalized {
                    payload,
                    index,
                    caller,
                });
                Ok(())
            }
            Err(err) => {
                let reason = err.to_string();
                tracing::warn!(
                    %kind,
                    ?index,
                    %reason,
                    "Downstream effect failed; request discarded"
                );
                self.record(GatewayEvent::OperationDiscarded {
                    payload,
                    index,
                    reason: reason.clone(),
                });
                Err(TimelockError::DownstreamFailure { kind, reason })
            }
        }
    }

    /// Append to the journal. Called only after the state change it
    /// describes has happened, so an append failure cannot undo anything and
    /// is not returned to the caller. Appending fails only if the event
    /// cannot be serialized for hashing; every `GatewayEvent` variant
    /// serializes (covered by the event tests).
    fn record(&mut self, event: GatewayEvent) {
        let height = self.clock.current_height();
        if let Err(err) = self.journal.append(height, event) {
            tracing::error!(error = %err, "Failed to journal gateway event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    /// Records every effect; fails all of them while `fail` is set.
    #[derive(Default)]
    struct Recorder {
        applied: Vec<OperationPayload>,
        lists: Vec<(ListKind, Principal, bool)>,
        claims: Vec<Principal>,
        fail: bool,
    }

    impl Recorder {
        fn apply(&mut self, payload: OperationPayload) -> Result<()> {
            if self.fail {
                return Err(TimelockError::EffectRejected {
                    reason: "resource paused".into(),
                });
            }
            self.applied.push(payload);
            Ok(())
        }
    }

    impl DownstreamEffects for Recorder {
        fn mint(&mut self, to: Principal, amount: Decimal) -> Result<()> {
            self.apply(MintRequest { to, amount }.into())
        }
        fn transfer_children_ownership(&mut self, new_owner: Principal) -> Result<()> {
            self.apply(ChildOwnershipTransfer { new_owner }.into())
        }
        fn change_burn_bounds(&mut self, bounds: &BurnBounds) -> Result<()> {
            self.apply((*bounds).into())
        }
        fn change_staking_fees(&mut self, fees: &StakingFees) -> Result<()> {
            self.apply((*fees).into())
        }
        fn change_staker(&mut self, new_staker: Principal) -> Result<()> {
            self.apply(StakerChange { new_staker }.into())
        }
        fn delegate(&mut self, new_delegate: Principal) -> Result<()> {
            self.apply(DelegationChange { new_delegate }.into())
        }
        fn update_list(&mut self, list: ListKind, entry: Principal, flag: bool) -> Result<()> {
            self.lists.push((list, entry, flag));
            Ok(())
        }
        fn claim_ownership(&mut self, target: Principal) -> Result<()> {
            self.claims.push(target);
            Ok(())
        }
    }

    struct Fixture {
        ctl: TimelockController<Recorder, ManualClock>,
        clock: ManualClock,
        owner: Principal,
        admin: Principal,
    }

    fn setup() -> Fixture {
        let owner = Principal::random();
        let admin = Principal::random();
        let clock = ManualClock::new(Height(1000));
        let ctl = TimelockController::new(owner, admin, Recorder::default(), clock.clone());
        Fixture {
            ctl,
            clock,
            owner,
            admin,
        }
    }

    #[test]
    fn release_height_depends_on_caller() {
        let f = setup();
        assert_eq!(f.ctl.compute_release_height(f.owner, Height(2000)), Height(2000));
        assert_eq!(
            f.ctl.compute_release_height(f.admin, Height(2000)),
            Height(2000 + constants::FIXED_DELAY_BLOCKS)
        );
    }

    #[test]
    fn owner_request_is_tagged_with_current_admin() {
        let mut f = setup();
        f.ctl.request_change_staker(f.owner, Principal::random()).unwrap();
        let pending = f.ctl.pending_staker().unwrap();
        assert_eq!(pending.requested_by, f.admin);
        assert_eq!(pending.release_height, Height(1000));
    }

    #[test]
    fn stranger_cannot_request_or_finalize() {
        let mut f = setup();
        let stranger = Principal::random();

        let err = f.ctl.request_delegation(stranger, stranger).unwrap_err();
        assert!(matches!(err, TimelockError::Unauthorized { .. }));
        assert!(f.ctl.pending_delegation().is_none());

        f.ctl.request_delegation(f.owner, stranger).unwrap();
        let err = f.ctl.finalize_delegation(stranger).unwrap_err();
        assert!(matches!(err, TimelockError::Unauthorized { .. }));
        assert!(f.ctl.pending_delegation().is_some());
    }

    #[test]
    fn finalize_empty_slot_reports_nothing_pending() {
        let mut f = setup();
        let err = f.ctl.finalize_change_staking_fees(f.admin).unwrap_err();
        assert!(matches!(
            err,
            TimelockError::NothingPending(OperationKind::ChangeStakingFees)
        ));
        let err = f.ctl.finalize_mint(f.admin, MintIndex(0)).unwrap_err();
        assert!(matches!(err, TimelockError::MintNotPending(MintIndex(0))));
    }

    #[test]
    fn downstream_failure_clears_slot_without_applying() {
        let mut f = setup();
        f.ctl
            .request_change_burn_bounds(f.owner, Decimal::ONE, Decimal::TEN)
            .unwrap();
        f.ctl.effects.fail = true;

        let err = f.ctl.finalize_change_burn_bounds(f.owner).unwrap_err();
        assert!(matches!(
            err,
            TimelockError::DownstreamFailure {
                kind: OperationKind::ChangeBurnBounds,
                ..
            }
        ));
        assert!(f.ctl.pending_burn_bounds().is_none(), "slot cleared before effect");
        assert!(f.ctl.effects().applied.is_empty());

        // Nothing left to retry.
        f.ctl.effects.fail = false;
        let err = f.ctl.finalize_change_burn_bounds(f.owner).unwrap_err();
        assert!(matches!(err, TimelockError::NothingPending(_)));
    }

    #[test]
    fn downstream_failure_on_mint_clears_only_that_index() {
        let mut f = setup();
        let to = Principal::random();
        let i0 = f.ctl.request_mint(f.owner, to, Decimal::ONE).unwrap();
        let i1 = f.ctl.request_mint(f.owner, to, Decimal::TWO).unwrap();

        f.ctl.effects.fail = true;
        assert!(f.ctl.finalize_mint(f.owner, i0).is_err());
        f.ctl.effects.fail = false;

        assert!(f.ctl.pending_mint(i0).is_none());
        f.ctl.finalize_mint(f.owner, i1).unwrap();
        assert_eq!(f.ctl.effects().applied.len(), 1);
    }

    #[test]
    fn passthroughs_apply_immediately() {
        let mut f = setup();
        let entry = Principal::random();
        f.ctl.update_list(f.admin, ListKind::Deny, entry, true).unwrap();
        f.ctl.issue_claim_ownership(f.owner, entry).unwrap();

        assert_eq!(f.ctl.effects().lists, vec![(ListKind::Deny, entry, true)]);
        assert_eq!(f.ctl.effects().claims, vec![entry]);
        assert_eq!(f.ctl.mint_count(), 0);
        assert!(f.ctl.pending_staker().is_none());
    }

    #[test]
    fn passthroughs_are_gated() {
        let mut f = setup();
        let stranger = Principal::random();
        assert!(f.ctl.update_list(stranger, ListKind::Deny, stranger, true).is_err());
        assert!(f.ctl.issue_claim_ownership(stranger, stranger).is_err());
        assert!(f.ctl.effects().lists.is_empty());
        assert!(f.ctl.effects().claims.is_empty());
    }

    #[test]
    fn every_call_is_journaled_in_order() {
        let mut f = setup();
        let to = Principal::random();
        let index = f.ctl.request_mint(f.owner, to, Decimal::ONE).unwrap();
        f.ctl.finalize_mint(f.admin, index).unwrap();
        f.ctl.transfer_adminship(f.owner, Principal::random()).unwrap();

        let records = f.ctl.drain_events();
        let names: Vec<&str> = records.iter().map(|r| r.event.name()).collect();
        assert_eq!(
            names,
            vec![
                "OPERATION_REQUESTED",
                "OPERATION_FINALIZED",
                "ADMINSHIP_TRANSFERRED"
            ]
        );
        assert!(matches!(
            records[0].event,
            GatewayEvent::OperationRequested {
                index: Some(MintIndex(0)),
                ..
            }
        ));
        EventJournal::verify_chain([0u8; 32], &records).unwrap();
    }

    #[test]
    fn rejected_calls_are_not_journaled() {
        let mut f = setup();
        f.ctl.request_change_staker(f.admin, Principal::random()).unwrap();
        assert!(f.ctl.finalize_change_staker(f.admin).is_err());
        assert_eq!(f.ctl.journal().total_appended(), 1);
    }

    #[test]
    fn journal_records_current_height() {
        let mut f = setup();
        f.clock.advance(42);
        f.ctl.request_change_staker(f.admin, Principal::random()).unwrap();
        assert_eq!(f.ctl.journal().records()[0].height, Height(1042));
    }

    #[test]
    fn from_config_rejects_zero_admin() {
        let cfg = GatewayConfig::new(Principal::random(), Principal::ZERO);
        let result = TimelockController::from_config(&cfg, Recorder::default(), ManualClock::default());
        assert!(matches!(result, Err(TimelockError::Configuration(_))));
    }
}
