//! Authority roles.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The role a call requires.
///
/// There are exactly two principals: the owner and the admin. `OwnerOrAdmin`
/// names the gate shared by every request, finalize and passthrough call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Cold-storage principal. Zero-delay authority, replaces the admin.
    Owner,
    /// Either of the two.
    OwnerOrAdmin,
    /// The candidate stored by a pending ownership proposal.
    PendingOwner,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Owner => write!(f, "OWNER"),
            Self::OwnerOrAdmin => write!(f, "OWNER_OR_ADMIN"),
            Self::PendingOwner => write!(f, "PENDING_OWNER"),
        }
    }
}
