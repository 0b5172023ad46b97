//! # timelock-types
//!
//! Shared types, errors, and configuration for the dual-authority
//! **timelock gateway**.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Principal`], [`Height`], [`MintIndex`], [`EventId`]
//! - **Roles**: [`Role`]
//! - **Operations**: [`OperationKind`], [`OperationPayload`], [`MintRequest`],
//!   [`ChildOwnershipTransfer`], [`BurnBounds`], [`StakingFees`],
//!   [`StakerChange`], [`DelegationChange`], [`ListKind`]
//! - **Pending state**: [`PendingOperation`]
//! - **Audit trail**: [`GatewayEvent`], [`EventRecord`]
//! - **Configuration**: [`GatewayConfig`], [`ClockConfig`]
//! - **Errors**: [`TimelockError`] with `TL_ERR_` prefix codes
//! - **Constants**: the fixed delay and other system-wide values

pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod operation;
pub mod pending;
pub mod role;

pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use operation::*;
pub use pending::*;
pub use role::*;

// Constants are accessed via `timelock_types::constants::FOO`
// (not re-exported to avoid name collisions).
