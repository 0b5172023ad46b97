//! The pending operation shape shared by every timelocked kind.
//!
//! ## Lifecycle
//!
//! ```text
//!   ┌───────┐  request   ┌─────────┐  finalize (continuity + maturity)  ┌───────┐
//!   │ EMPTY ├───────────▶│ PENDING ├───────────────────────────────────▶│ EMPTY │
//!   └───────┘            └────┬────┘                                    └───────┘
//!                             │ request (overwrite, last one wins)
//!                             ▼
//!                        ┌─────────┐
//!                        │ PENDING │
//!                        └─────────┘
//! ```
//!
//! A stored operation is never mutated. It is cleared exactly once, by a
//! successful finalize.

use serde::{Deserialize, Serialize};

use crate::{Height, Principal};

/// A request waiting out its delay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOperation<T> {
    /// Kind-specific data handed to the downstream adapter on finalize.
    pub payload: T,
    /// The admin installed when the request was made. Not the caller: an
    /// owner-issued request is still tagged with the current admin.
    pub requested_by: Principal,
    /// First height at which finalize is permitted.
    pub release_height: Height,
}

impl<T> PendingOperation<T> {
    #[must_use]
    pub fn new(payload: T, requested_by: Principal, release_height: Height) -> Self {
        Self {
            payload,
            requested_by,
            release_height,
        }
    }

    /// Whether the waiting period has elapsed at `now`.
    #[must_use]
    pub fn is_matured(&self, now: Height) -> bool {
        self.release_height <= now
    }

    /// Whether the admin that requested this is still in office.
    #[must_use]
    pub fn is_continuous_with(&self, current_admin: Principal) -> bool {
        self.requested_by == current_admin
    }
}
