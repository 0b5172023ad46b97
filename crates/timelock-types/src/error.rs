//! Error types for the timelock gateway.
//!
//! All errors use the `TL_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Authority errors
//! - 2xx: Timelock (request/finalize) errors
//! - 3xx: Downstream effect errors
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::{Height, MintIndex, OperationKind, Principal, Role};

/// Central error enum for all gateway operations.
#[derive(Debug, Error)]
pub enum TimelockError {
    // =================================================================
    // Authority Errors (1xx)
    // =================================================================
    /// The caller does not hold the role the operation requires.
    #[error("TL_ERR_100: Unauthorized: {caller} is not {required}")]
    Unauthorized { caller: Principal, required: Role },

    // =================================================================
    // Timelock Errors (2xx)
    // =================================================================
    /// The pending operation was requested under an admin that has since
    /// been replaced.
    #[error("TL_ERR_200: Stale {kind} request: requested under {requested_by}, current admin is {current_admin}")]
    StaleRequest {
        kind: OperationKind,
        requested_by: Principal,
        current_admin: Principal,
    },

    /// The waiting period has not elapsed yet.
    #[error("TL_ERR_201: {kind} not yet matured: releases at {release_height}, now {now}")]
    NotYetMatured {
        kind: OperationKind,
        release_height: Height,
        now: Height,
    },

    /// Finalize was called on an empty single-operation slot.
    #[error("TL_ERR_202: No pending {0} operation")]
    NothingPending(OperationKind),

    /// Finalize was called on a mint index that was never requested or has
    /// already been finalized.
    #[error("TL_ERR_203: No pending mint at {0}")]
    MintNotPending(MintIndex),

    // =================================================================
    // Downstream Errors (3xx)
    // =================================================================
    /// The downstream effect failed after the slot was cleared. The request
    /// is gone and must be issued again.
    #[error("TL_ERR_300: Downstream {kind} failed: {reason}")]
    DownstreamFailure { kind: OperationKind, reason: String },

    /// The managed resource refused the effect (raised by adapters).
    #[error("TL_ERR_301: Effect rejected: {reason}")]
    EffectRejected { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("TL_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("TL_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("TL_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error.
    #[error("TL_ERR_903: I/O error: {0}")]
    Io(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, TimelockError>;

impl From<std::io::Error> for TimelockError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for TimelockError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
