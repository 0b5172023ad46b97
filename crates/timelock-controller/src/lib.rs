//! # timelock-controller
//!
//! **Request/finalize engine** for the dual-authority timelock gateway.
//!
//! ## Architecture
//!
//! The controller sits between authenticated callers and the managed
//! resource:
//! 1. **AuthorityManager**: tracks the owner and the admin
//! 2. **PendingStore**: one slot per operation kind, plus the mint log
//! 3. **TimelockController**: gates requests, computes release heights,
//!    runs continuity + maturity checks, clears slots and applies effects
//! 4. **DownstreamEffects**: the injected adapter that actually changes
//!    the resource
//! 5. **EventJournal**: hash-chained audit trail of everything emitted
//!
//! ## Call Flow
//!
//! ```text
//! admin  → request_mint()  → PendingStore  (release = now + FIXED_DELAY)
//! owner  → request_*()     → PendingStore  (release = now)
//! either → finalize_*()    → continuity → maturity → clear → effect
//! owner  → transfer_adminship() → every earlier request goes stale
//! ```

pub mod authority;
pub mod clock;
pub mod controller;
pub mod effects;
pub mod journal;
pub mod store;

pub use authority::AuthorityManager;
pub use clock::{HeightSource, ManualClock, WallClock};
pub use controller::TimelockController;
pub use effects::DownstreamEffects;
pub use journal::EventJournal;
pub use store::{MintLog, PendingStore, Slot};
