//! # timelock-ledger
//!
//! **Managed resource**: an in-memory token ledger that the timelock
//! controller drives through [`timelock_controller::DownstreamEffects`].
//!
//! ## Architecture
//!
//! 1. **TokenLedger**: balances, fee schedule, burn bounds, staker,
//!    delegate, allow/deny lists, child components
//! 2. **SupplyTracker**: checks `Σ(balances) == minted - burned` after
//!    every mutation
//!
//! Nothing here knows about delays or authorities. By the time a call
//! arrives the gateway has already decided it may take effect; the ledger
//! only decides whether the effect is valid for the token.

pub mod ledger;
pub mod supply;

pub use ledger::{ChildComponent, LedgerSnapshot, TokenLedger};
pub use supply::SupplyTracker;
