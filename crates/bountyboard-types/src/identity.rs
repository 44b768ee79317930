//! Member identities
//!
//! A [`MemberId`] names a wallet-holding participant: a bounty creator, an
//! agent, or the marketplace authority. It is a strongly typed wrapper around
//! a UUID so different ID spaces cannot be mixed accidentally.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of a marketplace participant (creator, agent, or authority)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemberId(pub Uuid);

impl MemberId {
    /// Create a new random identity
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse from a string (with or without the `member_` prefix)
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        let s = s.strip_prefix("member_").unwrap_or(s);
        Ok(Self(Uuid::parse_str(s)?))
    }

    /// Raw bytes, used as a derivation seed
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// Get the inner UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MemberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "member_{}", self.0)
    }
}

impl From<Uuid> for MemberId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_id_display() {
        let id = MemberId::new();
        assert!(id.to_string().starts_with("member_"));
    }

    #[test]
    fn test_member_id_parse_round_trip() {
        let id = MemberId::new();
        let parsed = MemberId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_member_id_parse_without_prefix() {
        let uuid = Uuid::new_v4();
        let parsed = MemberId::parse(&uuid.to_string()).unwrap();
        assert_eq!(parsed, MemberId::from_uuid(uuid));
    }
}
