//! Notification events and hash-chained audit records.
//!
//! Every request, finalize, authority change and passthrough emits a
//! [`GatewayEvent`]. The controller wraps each one in an [`EventRecord`]
//! whose hash commits to the previous record, so the full history of
//! pending operations can be reconstructed and checked from the log alone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{
    EventId, Height, ListKind, MintIndex, OperationPayload, Principal, Result, constants,
};

/// Something observable happened at the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GatewayEvent {
    /// A timelocked operation was stored. For mints, `index` is the only way
    /// a caller learns which index to finalize later.
    OperationRequested {
        payload: OperationPayload,
        index: Option<MintIndex>,
        release_height: Height,
        requested_by: Principal,
        caller: Principal,
    },
    /// A matured operation was cleared and its effect applied.
    OperationFinalized {
        payload: OperationPayload,
        index: Option<MintIndex>,
        caller: Principal,
    },
    /// The slot was cleared but the downstream effect failed. The request is
    /// gone and must be issued again.
    OperationDiscarded {
        payload: OperationPayload,
        index: Option<MintIndex>,
        reason: String,
    },
    /// The owner installed a new admin.
    AdminshipTransferred { previous: Principal, new: Principal },
    /// The owner nominated a successor.
    OwnershipTransferProposed { owner: Principal, candidate: Principal },
    /// The nominated successor accepted.
    OwnershipTransferred { previous: Principal, new: Principal },
    /// An allow/deny list entry was set or cleared.
    ListUpdated {
        list: ListKind,
        entry: Principal,
        flag: bool,
        caller: Principal,
    },
    /// The gateway claimed ownership of a child component.
    ClaimOwnershipIssued { target: Principal, caller: Principal },
}

impl GatewayEvent {
    /// Stable upper-case name for log fields.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::OperationRequested { .. } => "OPERATION_REQUESTED",
            Self::OperationFinalized { .. } => "OPERATION_FINALIZED",
            Self::OperationDiscarded { .. } => "OPERATION_DISCARDED",
            Self::AdminshipTransferred { .. } => "ADMINSHIP_TRANSFERRED",
            Self::OwnershipTransferProposed { .. } => "OWNERSHIP_TRANSFER_PROPOSED",
            Self::OwnershipTransferred { .. } => "OWNERSHIP_TRANSFERRED",
            Self::ListUpdated { .. } => "LIST_UPDATED",
            Self::ClaimOwnershipIssued { .. } => "CLAIM_OWNERSHIP_ISSUED",
        }
    }
}

/// One entry of the append-only audit journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Time-ordered unique ID.
    pub id: EventId,
    /// Position in the journal, starting at 0.
    pub sequence: u64,
    /// Block height at which the event was emitted.
    pub height: Height,
    /// Wall-clock emission time. Informational, not hashed.
    pub emitted_at: DateTime<Utc>,
    pub event: GatewayEvent,
    /// Hash of the previous record, all zeros for the first one.
    pub prev_hash: [u8; 32],
    /// `SHA-256(domain || sequence || height || prev_hash || json(event))`.
    pub hash: [u8; 32],
}

impl EventRecord {
    /// Compute the chained hash for a record.
    ///
    /// Only deterministic fields are covered, so two gateways replaying the
    /// same calls produce the same chain.
    pub fn compute_hash(
        sequence: u64,
        height: Height,
        prev_hash: &[u8; 32],
        event: &GatewayEvent,
    ) -> Result<[u8; 32]> {
        let body = serde_json::to_vec(event)?;
        let mut hasher = Sha256::new();
        hasher.update(constants::EVENT_HASH_DOMAIN);
        hasher.update(sequence.to_le_bytes());
        hasher.update(height.0.to_le_bytes());
        hasher.update(prev_hash);
        hasher.update(&body);
        let result = hasher.finalize();
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&result);
        Ok(hash)
    }

    /// Recompute this record's hash and compare with the stored one.
    #[must_use]
    pub fn is_intact(&self) -> bool {
        Self::compute_hash(self.sequence, self.height, &self.prev_hash, &self.event)
            .is_ok_and(|h| h == self.hash)
    }
}
