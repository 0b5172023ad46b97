//! System-wide constants for the timelock gateway.

/// Expected block cadence the delay is calibrated against, in seconds.
pub const EXPECTED_BLOCK_TIME_SECS: u64 = 15;

/// Mandatory waiting period for admin-initiated operations, in blocks.
///
/// 24 hours at [`EXPECTED_BLOCK_TIME_SECS`]. Fixed at compile time; there is
/// no runtime knob for it.
pub const FIXED_DELAY_BLOCKS: u64 = 24 * 60 * 60 / EXPECTED_BLOCK_TIME_SECS;

/// Domain separation tag for audit journal hashes.
pub const EVENT_HASH_DOMAIN: &[u8] = b"timelock:event:v1:";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Gateway name.
pub const GATEWAY_NAME: &str = "TimelockGateway";
