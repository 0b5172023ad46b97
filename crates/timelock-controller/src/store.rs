//! Pending operation store.
//!
//! One [`Slot`] per single-operation kind and one append-only [`MintLog`].
//! "Nothing pending" is `None`, never a zeroed payload, so a slot that was
//! never written and a slot that was finalized read the same way and can't
//! be confused with a real request for a zero amount.
//!
//! The store is owned by the controller; nothing else reads or writes it.

use timelock_types::{
    BurnBounds, ChildOwnershipTransfer, DelegationChange, MintIndex, MintRequest,
    PendingOperation, StakerChange, StakingFees,
};

/// Holds at most one pending operation. A new request overwrites whatever
/// is there, matured or not.
#[derive(Debug, Clone)]
pub struct Slot<T> {
    pending: Option<PendingOperation<T>>,
}

impl<T> Slot<T> {
    #[must_use]
    pub fn new() -> Self {
        Self { pending: None }
    }

    /// Store `op`, returning the request it superseded, if any.
    pub fn put(&mut self, op: PendingOperation<T>) -> Option<PendingOperation<T>> {
        self.pending.replace(op)
    }

    #[must_use]
    pub fn peek(&self) -> Option<&PendingOperation<T>> {
        self.pending.as_ref()
    }

    /// Clear the slot and hand back its contents.
    pub fn take(&mut self) -> Option<PendingOperation<T>> {
        self.pending.take()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_none()
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Append-only log of mint requests.
///
/// Entries are cleared in place, never removed, so an index stays valid for
/// the lifetime of the gateway.
#[derive(Debug, Clone)]
pub struct MintLog {
    entries: Vec<Option<PendingOperation<MintRequest>>>,
}

impl MintLog {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a request and return its index.
    pub fn append(&mut self, op: PendingOperation<MintRequest>) -> MintIndex {
        let index = MintIndex(self.entries.len() as u64);
        self.entries.push(Some(op));
        index
    }

    #[must_use]
    pub fn get(&self, index: MintIndex) -> Option<&PendingOperation<MintRequest>> {
        let i = usize::try_from(index.0).ok()?;
        self.entries.get(i).and_then(Option::as_ref)
    }

    /// Clear one entry. Other indices are untouched.
    pub fn take(&mut self, index: MintIndex) -> Option<PendingOperation<MintRequest>> {
        let i = usize::try_from(index.0).ok()?;
        self.entries.get_mut(i).and_then(Option::take)
    }

    /// Number of indices ever assigned, cleared ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries still pending.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    /// Pending entries with their indices, in index order.
    pub fn iter_pending(&self) -> impl Iterator<Item = (MintIndex, &PendingOperation<MintRequest>)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|op| (MintIndex(i as u64), op)))
    }
}

impl Default for MintLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Every pending operation the gateway holds.
#[derive(Debug, Clone, Default)]
pub struct PendingStore {
    pub mints: MintLog,
    pub transfer_children_ownership: Slot<ChildOwnershipTransfer>,
    pub burn_bounds: Slot<BurnBounds>,
    pub staking_fees: Slot<StakingFees>,
    pub staker: Slot<StakerChange>,
    pub delegation: Slot<DelegationChange>,
}

impl PendingStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
