//! Identifiers used throughout the timelock gateway.
//!
//! Principals are raw ed25519 public keys. Heights and mint indices are
//! plain counters wrapped in newtypes so they can't be mixed up. Audit
//! event IDs use UUIDv7 for time-ordered sorting.

use std::{fmt, str::FromStr};

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::TimelockError;

// ---------------------------------------------------------------------------
// Principal
// ---------------------------------------------------------------------------

/// An authenticated identity: the raw ed25519 public key (32 bytes).
///
/// Serialized as a `0x`-prefixed lowercase hex string so configuration
/// files stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct Principal(pub [u8; 32]);

impl Principal {
    /// The reserved all-zero principal. Never a valid owner or admin.
    pub const ZERO: Self = Self([0u8; 32]);

    #[must_use]
    pub fn from_pubkey(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        Self(key.to_bytes())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// First 4 bytes as hex, for compact log fields.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Principal {
    type Err = TimelockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits)
            .map_err(|e| TimelockError::Serialization(format!("invalid principal hex: {e}")))?;
        let array: [u8; 32] = bytes.try_into().map_err(|raw: Vec<u8>| {
            TimelockError::Serialization(format!(
                "principal must be 32 bytes, got {}",
                raw.len()
            ))
        })?;
        Ok(Self(array))
    }
}

impl Serialize for Principal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Principal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Random principals for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Principal {
    #[must_use]
    pub fn random() -> Self {
        Self(rand::random::<[u8; 32]>())
    }
}

// ---------------------------------------------------------------------------
// Height
// ---------------------------------------------------------------------------

/// Monotonically increasing block height used to measure waiting periods.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
pub struct Height(pub u64);

impl Height {
    /// Height `blocks` after this one. Saturates at `u64::MAX`, which is a
    /// release point that is never reached.
    #[must_use]
    pub fn after(self, blocks: u64) -> Self {
        Self(self.0.saturating_add(blocks))
    }

    /// Blocks remaining until `target`, zero if already reached.
    #[must_use]
    pub fn blocks_until(self, target: Self) -> u64 {
        target.0.saturating_sub(self.0)
    }
}

impl fmt::Display for Height {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// MintIndex
// ---------------------------------------------------------------------------

/// Stable position of a request in the append-only mint log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct MintIndex(pub u64);

impl fmt::Display for MintIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mint:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// EventId
// ---------------------------------------------------------------------------

/// Unique identifier for an audit journal record. UUIDv7, time-ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct EventId(pub Uuid);

impl EventId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "evt:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use ed25519_dalek::SigningKey;

    use super::*;

    #[test]
    fn principal_display_is_prefixed_hex() {
        let p = Principal([0xab; 32]);
        let shown = p.to_string();
        assert!(shown.starts_with("0xabab"));
        assert_eq!(shown.len(), 2 + 64);
        assert_eq!(p.short(), "abababab");
    }

    #[test]
    fn principal_parses_with_and_without_prefix() {
        let p = Principal::random();
        let with: Principal = p.to_string().parse().unwrap();
        let without: Principal = hex::encode(p.0).parse().unwrap();
        assert_eq!(p, with);
        assert_eq!(p, without);
    }

    #[test]
    fn principal_rejects_wrong_length() {
        let err = "0xdeadbeef".parse::<Principal>().unwrap_err();
        assert!(matches!(err, TimelockError::Serialization(_)));
        let err = "0xzz".parse::<Principal>().unwrap_err();
        assert!(matches!(err, TimelockError::Serialization(_)));
    }

    #[test]
    fn principal_from_verifying_key() {
        let signing = SigningKey::from_bytes(&[7u8; 32]);
        let key = signing.verifying_key();
        let p = Principal::from_verifying_key(&key);
        assert_eq!(p.as_bytes(), key.as_bytes());
        assert!(!p.is_zero());
    }

    #[test]
    fn principal_serializes_as_string() {
        let p = Principal([1u8; 32]);
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, format!("\"{p}\""));
        let back: Principal = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }

    #[test]
    fn zero_principal() {
        assert!(Principal::ZERO.is_zero());
        assert!(!Principal::random().is_zero());
    }

    #[test]
    fn height_after_saturates() {
        assert_eq!(Height(10).after(5), Height(15));
        assert_eq!(Height(u64::MAX - 1).after(5), Height(u64::MAX));
    }

    #[test]
    fn height_blocks_until() {
        assert_eq!(Height(10).blocks_until(Height(15)), 5);
        assert_eq!(Height(20).blocks_until(Height(15)), 0);
    }

    #[test]
    fn event_id_ordering() {
        let a = EventId::new();
        let b = EventId::new();
        assert!(a < b);
    }
}
