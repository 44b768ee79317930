//! Deterministic account addresses
//!
//! Every account the marketplace touches is located by an [`Address`]: a
//! SHA-256 digest over a fixed namespace seed plus the owning identity and,
//! where relevant, the bounty sequence id. Derivation is pure and stateless.
//! Consumers that receive an address from an untrusted caller must recompute
//! the expected address from the same seeds and compare, rather than trust
//! the supplied value.

use crate::identity::MemberId;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;

const MARKETPLACE_SEED: &[u8] = b"marketplace";
const BOUNTY_SEED: &[u8] = b"bounty";
const ESCROW_SEED: &[u8] = b"escrow";
const AGENT_SEED: &[u8] = b"agent";
const WALLET_SEED: &[u8] = b"wallet";

/// A derived account address (32-byte SHA-256 digest, displayed as hex)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 32]);

impl Address {
    /// Derive an address from ordered seeds
    fn derive(seeds: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();
        for seed in seeds {
            hasher.update(seed);
        }
        Self(hasher.finalize().into())
    }

    /// The marketplace registry singleton
    pub fn marketplace() -> Self {
        Self::derive(&[MARKETPLACE_SEED])
    }

    /// A bounty record, keyed by its creator and sequence id
    pub fn bounty(creator: &MemberId, id: u64) -> Self {
        Self::derive(&[BOUNTY_SEED, creator.as_bytes(), &id.to_le_bytes()])
    }

    /// The escrow funds cell bound to a bounty
    pub fn escrow(creator: &MemberId, id: u64) -> Self {
        Self::derive(&[ESCROW_SEED, creator.as_bytes(), &id.to_le_bytes()])
    }

    /// An agent's reputation profile
    pub fn agent_profile(agent: &MemberId) -> Self {
        Self::derive(&[AGENT_SEED, agent.as_bytes()])
    }

    /// A member's funds account
    pub fn wallet(member: &MemberId) -> Self {
        Self::derive(&[WALLET_SEED, member.as_bytes()])
    }

    /// Raw digest bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex encoding of the digest
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a 64-char hex string
    pub fn parse_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        let digest: [u8; 32] = bytes
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(Self(digest))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse_hex(&s).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_is_deterministic() {
        let creator = MemberId::new();
        assert_eq!(Address::bounty(&creator, 0), Address::bounty(&creator, 0));
        assert_eq!(Address::marketplace(), Address::marketplace());
    }

    #[test]
    fn test_namespaces_do_not_collide() {
        let creator = MemberId::new();
        let bounty = Address::bounty(&creator, 0);
        let escrow = Address::escrow(&creator, 0);
        let profile = Address::agent_profile(&creator);
        let wallet = Address::wallet(&creator);
        assert_ne!(bounty, escrow);
        assert_ne!(profile, wallet);
        assert_ne!(bounty, Address::marketplace());
    }

    #[test]
    fn test_sequence_id_changes_address() {
        let creator = MemberId::new();
        assert_ne!(Address::bounty(&creator, 0), Address::bounty(&creator, 1));
    }

    #[test]
    fn test_owner_changes_address() {
        let a = MemberId::new();
        let b = MemberId::new();
        assert_ne!(Address::bounty(&a, 0), Address::bounty(&b, 0));
    }

    #[test]
    fn test_hex_round_trip() {
        let addr = Address::marketplace();
        let parsed = Address::parse_hex(&addr.to_hex()).unwrap();
        assert_eq!(addr, parsed);
    }

    #[test]
    fn test_serde_as_hex_string() {
        let addr = Address::marketplace();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr.to_hex()));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(addr, back);
    }
}
