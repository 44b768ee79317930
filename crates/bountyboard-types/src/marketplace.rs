//! Marketplace registry and agent reputation records

use crate::{Address, Amount, MarketError, MemberId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reputation score granted on first profile creation
pub const INITIAL_REPUTATION_SCORE: u32 = 1000;
/// Reputation gained per approved completion
pub const REPUTATION_PER_COMPLETION: u32 = 50;
/// Platform fee retained from each payout, in percent
pub const PLATFORM_FEE_PERCENT: u8 = 5;

/// Split a reward into (agent payment, retained fee)
///
/// The payment is `reward * 95 / 100` with integer flooring; the fee is the
/// remainder, so the two always sum back to the reward.
pub fn split_reward(reward: Amount) -> (Amount, Amount) {
    let payment = reward.percentage(100 - PLATFORM_FEE_PERCENT);
    let fee = Amount::new(reward.0 - payment.0);
    (payment, fee)
}

/// The registry singleton
///
/// Created once by `initialize`, never destroyed, mutated only as a side
/// effect of bounty creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Marketplace {
    /// Derived singleton address
    pub address: Address,
    /// Identity that performed `initialize`
    pub authority: MemberId,
    /// Next bounty sequence id; strictly increasing by one per creation
    pub total_bounties: u64,
    /// Cumulative reward amount ever escrowed (fees are not subtracted)
    pub total_volume: Amount,
    pub initialized_at: DateTime<Utc>,
}

impl Marketplace {
    /// Create the singleton under the given authority
    pub fn new(authority: MemberId, now: DateTime<Utc>) -> Self {
        Self {
            address: Address::marketplace(),
            authority,
            total_bounties: 0,
            total_volume: Amount::zero(),
            initialized_at: now,
        }
    }

    /// Record a successful bounty creation
    pub fn record_created(&mut self, reward: Amount) -> Result<(), MarketError> {
        self.total_volume = self
            .total_volume
            .checked_add(reward)
            .ok_or(MarketError::AmountOverflow)?;
        self.total_bounties += 1;
        Ok(())
    }
}

/// Persistent reputation and earnings record for one agent
///
/// Lazily created on the agent's first claim; never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProfile {
    pub agent: MemberId,
    /// Derived profile address
    pub address: Address,
    pub reputation_score: u32,
    pub completed_bounties: u32,
    pub total_earned: Amount,
    pub joined_at: DateTime<Utc>,
}

impl AgentProfile {
    /// Create a fresh profile at the starting reputation
    pub fn new(agent: MemberId, now: DateTime<Utc>) -> Self {
        Self {
            agent,
            address: Address::agent_profile(&agent),
            reputation_score: INITIAL_REPUTATION_SCORE,
            completed_bounties: 0,
            total_earned: Amount::zero(),
            joined_at: now,
        }
    }

    /// Record an approved completion and the payment received
    pub fn record_completion(&mut self, payment: Amount) -> Result<(), MarketError> {
        self.total_earned = self
            .total_earned
            .checked_add(payment)
            .ok_or(MarketError::AmountOverflow)?;
        self.completed_bounties += 1;
        self.reputation_score = self
            .reputation_score
            .saturating_add(REPUTATION_PER_COMPLETION);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_reward_exact() {
        let (payment, fee) = split_reward(Amount::new(100_000_000_000));
        assert_eq!(payment, Amount::new(95_000_000_000));
        assert_eq!(fee, Amount::new(5_000_000_000));
    }

    #[test]
    fn test_split_reward_floors_payment() {
        // 99 * 95 / 100 = 94 (floor); the fee absorbs the rounding
        let (payment, fee) = split_reward(Amount::new(99));
        assert_eq!(payment, Amount::new(94));
        assert_eq!(fee, Amount::new(5));
        assert_eq!(payment.checked_add(fee), Some(Amount::new(99)));
    }

    #[test]
    fn test_registry_counters() {
        let mut marketplace = Marketplace::new(MemberId::new(), Utc::now());
        marketplace.record_created(Amount::tokens(100)).unwrap();
        marketplace.record_created(Amount::tokens(50)).unwrap();
        assert_eq!(marketplace.total_bounties, 2);
        assert_eq!(marketplace.total_volume, Amount::tokens(150));
    }

    #[test]
    fn test_registry_volume_overflow() {
        let mut marketplace = Marketplace::new(MemberId::new(), Utc::now());
        marketplace.record_created(Amount::new(u64::MAX)).unwrap();
        let err = marketplace.record_created(Amount::new(1)).unwrap_err();
        assert!(matches!(err, MarketError::AmountOverflow));
        // Failed creation left the counter untouched
        assert_eq!(marketplace.total_bounties, 1);
    }

    #[test]
    fn test_profile_completion() {
        let mut profile = AgentProfile::new(MemberId::new(), Utc::now());
        assert_eq!(profile.reputation_score, 1000);

        profile.record_completion(Amount::tokens(95)).unwrap();
        assert_eq!(profile.reputation_score, 1050);
        assert_eq!(profile.completed_bounties, 1);
        assert_eq!(profile.total_earned, Amount::tokens(95));
    }
}
