//! Escrow custody cells
//!
//! One cell per bounty, keyed by the derived escrow address. A cell accepts
//! exactly one deposit (the reward, at creation) and at most one settlement:
//! a payout to the agent on approval, or a refund to the creator on
//! cancellation. Rejection never touches the cell. After a payout the
//! retained fee remains in the cell; no entry point withdraws it.

use bountyboard_types::{Address, Amount, MarketError, MemberId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a cell was settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementKind {
    /// Paid out to the assigned agent on approval
    Payout,
    /// Returned to the creator on cancellation
    Refund,
}

/// The single outbound movement of a cell
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowSettlement {
    pub kind: SettlementKind,
    /// Funds account the amount moved to
    pub to: Address,
    pub amount: Amount,
    pub settled_at: DateTime<Utc>,
}

/// A funds-holding cell bound 1:1 to a bounty
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowCustody {
    /// Derived escrow address; the ledger account holding the funds
    pub address: Address,
    /// Derived address of the bounty this cell is bound to
    pub bounty: Address,
    pub creator: MemberId,
    /// The one inbound deposit, fixed for the life of the cell
    pub deposited: Amount,
    /// Current holdings; after a payout this is the retained fee
    pub balance: Amount,
    pub created_at: DateTime<Utc>,
    pub settlement: Option<EscrowSettlement>,
}

impl EscrowCustody {
    /// Open a cell holding the full reward for `(creator, bounty_id)`
    pub fn open(creator: MemberId, bounty_id: u64, reward: Amount, now: DateTime<Utc>) -> Self {
        Self {
            address: Address::escrow(&creator, bounty_id),
            bounty: Address::bounty(&creator, bounty_id),
            creator,
            deposited: reward,
            balance: reward,
            created_at: now,
            settlement: None,
        }
    }

    /// Whether the cell has already settled
    pub fn is_settled(&self) -> bool {
        self.settlement.is_some()
    }

    /// Amount still held (equals the retained fee after a payout)
    pub fn retained(&self) -> Amount {
        self.balance
    }

    /// Record the payout side of an approval
    pub(crate) fn record_payout(
        &mut self,
        to: Address,
        amount: Amount,
        now: DateTime<Utc>,
    ) -> Result<(), MarketError> {
        self.settle(SettlementKind::Payout, to, amount, now)
    }

    /// Record a full refund on cancellation, returning the amount moved
    pub(crate) fn record_refund(
        &mut self,
        to: Address,
        now: DateTime<Utc>,
    ) -> Result<Amount, MarketError> {
        let amount = self.balance;
        self.settle(SettlementKind::Refund, to, amount, now)?;
        Ok(amount)
    }

    fn settle(
        &mut self,
        kind: SettlementKind,
        to: Address,
        amount: Amount,
        now: DateTime<Utc>,
    ) -> Result<(), MarketError> {
        if self.is_settled() {
            return Err(MarketError::internal(format!(
                "escrow {} already settled",
                self.address
            )));
        }
        self.balance = self
            .balance
            .checked_sub(amount)
            .ok_or(MarketError::AmountOverflow)?;
        self.settlement = Some(EscrowSettlement {
            kind,
            to,
            amount,
            settled_at: now,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_holds_full_reward() {
        let creator = MemberId::new();
        let cell = EscrowCustody::open(creator, 0, Amount::tokens(100), Utc::now());
        assert_eq!(cell.deposited, Amount::tokens(100));
        assert_eq!(cell.balance, Amount::tokens(100));
        assert!(!cell.is_settled());
        assert_eq!(cell.address, Address::escrow(&creator, 0));
    }

    #[test]
    fn test_payout_retains_remainder() {
        let creator = MemberId::new();
        let agent_wallet = Address::wallet(&MemberId::new());
        let mut cell = EscrowCustody::open(creator, 0, Amount::new(100), Utc::now());

        cell.record_payout(agent_wallet, Amount::new(95), Utc::now())
            .unwrap();
        assert_eq!(cell.retained(), Amount::new(5));
        assert!(cell.is_settled());
    }

    #[test]
    fn test_second_settlement_rejected() {
        let creator = MemberId::new();
        let wallet = Address::wallet(&creator);
        let mut cell = EscrowCustody::open(creator, 0, Amount::new(100), Utc::now());

        cell.record_refund(wallet, Utc::now()).unwrap();
        assert_eq!(cell.balance, Amount::zero());

        let err = cell.record_refund(wallet, Utc::now()).unwrap_err();
        assert!(matches!(err, MarketError::Internal { .. }));
    }
}
