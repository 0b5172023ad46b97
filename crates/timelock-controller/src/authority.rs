//! Authority manager: tracks the owner and the admin.
//!
//! Exactly one owner and one admin exist at any time. The admin is replaced
//! by the owner, immediately and without delay; that replacement is what
//! invalidates every operation requested under the previous admin. The
//! owner role itself moves through a two-step propose/accept hand-over so a
//! typo in the candidate can never strand the gateway.

use timelock_types::{GatewayEvent, Principal, Result, Role, TimelockError};

/// Holder of the two authority roles.
#[derive(Debug, Clone)]
pub struct AuthorityManager {
    owner: Principal,
    admin: Principal,
    /// Candidate nominated by the owner, waiting to accept.
    pending_owner: Option<Principal>,
}

impl AuthorityManager {
    #[must_use]
    pub fn new(owner: Principal, admin: Principal) -> Self {
        Self {
            owner,
            admin,
            pending_owner: None,
        }
    }

    #[must_use]
    pub fn current_owner(&self) -> Principal {
        self.owner
    }

    #[must_use]
    pub fn current_admin(&self) -> Principal {
        self.admin
    }

    #[must_use]
    pub fn pending_owner(&self) -> Option<Principal> {
        self.pending_owner
    }

    #[must_use]
    pub fn is_owner(&self, caller: Principal) -> bool {
        caller == self.owner
    }

    #[must_use]
    pub fn is_owner_or_admin(&self, caller: Principal) -> bool {
        caller == self.owner || caller == self.admin
    }

    /// Fail with `Unauthorized` unless `caller` is the owner.
    pub fn require_owner(&self, caller: Principal) -> Result<()> {
        if self.is_owner(caller) {
            Ok(())
        } else {
            Err(TimelockError::Unauthorized {
                caller,
                required: Role::Owner,
            })
        }
    }

    /// Fail with `Unauthorized` unless `caller` is the owner or the admin.
    pub fn require_owner_or_admin(&self, caller: Principal) -> Result<()> {
        if self.is_owner_or_admin(caller) {
            Ok(())
        } else {
            Err(TimelockError::Unauthorized {
                caller,
                required: Role::OwnerOrAdmin,
            })
        }
    }

    /// Install a new admin. Owner only, takes effect immediately.
    pub fn replace_admin(&mut self, caller: Principal, new_admin: Principal) -> Result<GatewayEvent> {
        self.require_owner(caller)?;
        let previous = std::mem::replace(&mut self.admin, new_admin);
        tracing::info!(
            previous = %previous.short(),
            new = %new_admin.short(),
            "Admin replaced"
        );
        Ok(GatewayEvent::AdminshipTransferred {
            previous,
            new: new_admin,
        })
    }

    /// Nominate a successor owner. Owner only. A later nomination replaces
    /// an earlier one.
    pub fn propose_new_owner(
        &mut self,
        caller: Principal,
        candidate: Principal,
    ) -> Result<GatewayEvent> {
        self.require_owner(caller)?;
        self.pending_owner = Some(candidate);
        tracing::info!(
            owner = %caller.short(),
            candidate = %candidate.short(),
            "Ownership transfer proposed"
        );
        Ok(GatewayEvent::OwnershipTransferProposed {
            owner: caller,
            candidate,
        })
    }

    /// Accept a pending nomination. Only the nominated candidate may call.
    pub fn accept_ownership(&mut self, caller: Principal) -> Result<GatewayEvent> {
        if self.pending_owner != Some(caller) {
            return Err(TimelockError::Unauthorized {
                caller,
                required: Role::PendingOwner,
            });
        }
        self.pending_owner = None;
        let previous = std::mem::replace(&mut self.owner, caller);
        tracing::info!(
            previous = %previous.short(),
            new = %caller.short(),
            "Ownership transferred"
        );
        Ok(GatewayEvent::OwnershipTransferred {
            previous,
            new: caller,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (AuthorityManager, Principal, Principal) {
        let owner = Principal::random();
        let admin = Principal::random();
        (AuthorityManager::new(owner, admin), owner, admin)
    }

    #[test]
    fn owner_or_admin_gate() {
        let (auth, owner, admin) = setup();
        assert!(auth.is_owner_or_admin(owner));
        assert!(auth.is_owner_or_admin(admin));
        assert!(!auth.is_owner_or_admin(Principal::random()));
        assert!(auth.is_owner(owner));
        assert!(!auth.is_owner(admin));
    }

    #[test]
    fn owner_replaces_admin_immediately() {
        let (mut auth, owner, admin) = setup();
        let new_admin = Principal::random();

        let event = auth.replace_admin(owner, new_admin).unwrap();
        assert_eq!(auth.current_admin(), new_admin);
        assert_eq!(
            event,
            GatewayEvent::AdminshipTransferred {
                previous: admin,
                new: new_admin,
            }
        );
        assert!(!auth.is_owner_or_admin(admin));
    }

    #[test]
    fn admin_cannot_replace_admin() {
        let (mut auth, _owner, admin) = setup();
        let err = auth.replace_admin(admin, Principal::random()).unwrap_err();
        assert!(matches!(
            err,
            TimelockError::Unauthorized {
                required: Role::Owner,
                ..
            }
        ));
        assert_eq!(auth.current_admin(), admin);
    }

    #[test]
    fn two_step_ownership_transfer() {
        let (mut auth, owner, _admin) = setup();
        let successor = Principal::random();

        auth.propose_new_owner(owner, successor).unwrap();
        assert_eq!(auth.pending_owner(), Some(successor));
        // Proposal alone changes nothing.
        assert_eq!(auth.current_owner(), owner);

        auth.accept_ownership(successor).unwrap();
        assert_eq!(auth.current_owner(), successor);
        assert_eq!(auth.pending_owner(), None);
        assert!(!auth.is_owner(owner));
    }

    #[test]
    fn only_candidate_can_accept() {
        let (mut auth, owner, admin) = setup();
        let successor = Principal::random();
        auth.propose_new_owner(owner, successor).unwrap();

        for intruder in [owner, admin, Principal::random()] {
            let err = auth.accept_ownership(intruder).unwrap_err();
            assert!(matches!(
                err,
                TimelockError::Unauthorized {
                    required: Role::PendingOwner,
                    ..
                }
            ));
        }
        assert_eq!(auth.current_owner(), owner);
        assert_eq!(auth.pending_owner(), Some(successor));
    }

    #[test]
    fn accept_without_proposal_fails() {
        let (mut auth, owner, _admin) = setup();
        assert!(auth.accept_ownership(owner).is_err());
    }

    #[test]
    fn admin_cannot_propose_owner() {
        let (mut auth, _owner, admin) = setup();
        assert!(auth.propose_new_owner(admin, admin).is_err());
        assert_eq!(auth.pending_owner(), None);
    }
}
