//! BountyBoard Ledger - the funds substrate under the marketplace
//!
//! The ledger is:
//! - Single-asset (the marketplace token, 9 decimals)
//! - Account-keyed by derived [`Address`]
//! - Append-only (entries are immutable history)
//! - Atomic (a transfer lands on both accounts or on neither)
//!
//! # Invariants
//!
//! 1. No negative balances
//! 2. No zero-amount entries
//! 3. Every entry carries a reason and a correlation id
//! 4. Balance arithmetic is overflow-checked

use std::collections::HashMap;
use std::sync::Arc;

use bountyboard_types::{Address, Amount, MarketError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Errors that can occur in ledger operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("account not found: {account}")]
    AccountNotFound { account: Address },

    #[error("insufficient balance: have {available}, need {required}")]
    InsufficientBalance {
        available: Amount,
        required: Amount,
    },

    #[error("invalid amount: {message}")]
    InvalidAmount { message: String },

    #[error("balance overflow on account {account}")]
    Overflow { account: Address },
}

impl From<LedgerError> for MarketError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientBalance {
                available,
                required,
            } => MarketError::InsufficientFunds {
                required,
                available,
            },
            LedgerError::Overflow { .. } => MarketError::AmountOverflow,
            other => MarketError::Internal {
                message: other.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Unique identifier for a ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(pub String);

impl EntryId {
    pub fn new() -> Self {
        Self(format!("entry_{}", Uuid::new_v4()))
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

/// Type of ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryType {
    /// Credit (increase) to an account
    Credit,
    /// Debit (decrease) from an account
    Debit,
}

/// Reason for a ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryReason {
    /// Funds issued into a wallet
    Mint { memo: String },
    /// Reward locked into a bounty's escrow cell
    EscrowDeposit { bounty: Address },
    /// Payment released from escrow to the assigned agent
    EscrowPayout { bounty: Address },
    /// Escrow returned to the creator on cancellation
    EscrowRefund { bounty: Address },
}

/// A single ledger entry (one side of a movement)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub entry_id: EntryId,
    pub account: Address,
    pub entry_type: EntryType,
    pub amount: Amount,
    pub balance_after: Amount,
    pub reason: EntryReason,
    pub correlation_id: String,
    pub created_at: DateTime<Utc>,
}

/// Account state in the ledger
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AccountState {
    pub balance: Amount,
    pub entry_count: u64,
}

/// The BountyBoard funds ledger
///
/// Thread-safe and designed for concurrent access; cloning shares the
/// underlying state.
#[derive(Clone)]
pub struct Ledger {
    accounts: Arc<RwLock<HashMap<Address, AccountState>>>,
    entries: Arc<RwLock<Vec<LedgerEntry>>>,
}

impl Ledger {
    /// Create a new in-memory ledger
    pub fn new() -> Self {
        Self {
            accounts: Arc::new(RwLock::new(HashMap::new())),
            entries: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Get the balance of an account
    pub async fn balance(&self, account: &Address) -> Amount {
        let accounts = self.accounts.read().await;
        accounts.get(account).map(|a| a.balance).unwrap_or_default()
    }

    /// Credit an account (increase balance)
    ///
    /// Creates the account on first use. Returns the new balance and the
    /// entry ID.
    pub async fn credit(
        &self,
        account: &Address,
        amount: Amount,
        reason: EntryReason,
        correlation_id: String,
    ) -> Result<(Amount, EntryId)> {
        check_nonzero(amount)?;

        let mut accounts = self.accounts.write().await;
        let mut entries = self.entries.write().await;
        let entry_id = apply_credit(&mut accounts, &mut entries, account, amount, reason, correlation_id)?;
        let balance = accounts
            .get(account)
            .map(|a| a.balance)
            .unwrap_or_default();
        Ok((balance, entry_id))
    }

    /// Debit an account (decrease balance)
    ///
    /// Fails if the account is unknown or the balance would go negative.
    pub async fn debit(
        &self,
        account: &Address,
        amount: Amount,
        reason: EntryReason,
        correlation_id: String,
    ) -> Result<(Amount, EntryId)> {
        check_nonzero(amount)?;

        let mut accounts = self.accounts.write().await;
        let mut entries = self.entries.write().await;
        let entry_id = apply_debit(&mut accounts, &mut entries, account, amount, reason, correlation_id)?;
        let balance = accounts
            .get(account)
            .map(|a| a.balance)
            .unwrap_or_default();
        Ok((balance, entry_id))
    }

    /// Move funds between two accounts
    ///
    /// Atomic: both sides are validated under one write guard before either
    /// entry is recorded, so a failure leaves both balances untouched.
    pub async fn transfer(
        &self,
        from: &Address,
        to: &Address,
        amount: Amount,
        reason: EntryReason,
        correlation_id: String,
    ) -> Result<(EntryId, EntryId)> {
        check_nonzero(amount)?;

        let mut accounts = self.accounts.write().await;
        let mut entries = self.entries.write().await;

        // Validate both sides before touching either
        let from_state = accounts
            .get(from)
            .copied()
            .ok_or(LedgerError::AccountNotFound { account: *from })?;
        from_state
            .balance
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                available: from_state.balance,
                required: amount,
            })?;
        let to_balance = accounts.get(to).map(|a| a.balance).unwrap_or_default();
        to_balance
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { account: *to })?;

        let debit_entry = apply_debit(
            &mut accounts,
            &mut entries,
            from,
            amount,
            reason.clone(),
            correlation_id.clone(),
        )?;
        let credit_entry =
            apply_credit(&mut accounts, &mut entries, to, amount, reason, correlation_id)?;

        Ok((debit_entry, credit_entry))
    }

    /// Issue funds into a wallet
    pub async fn mint(
        &self,
        to: &Address,
        amount: Amount,
        memo: impl Into<String>,
    ) -> Result<(Amount, EntryId)> {
        let memo = memo.into();
        let reason = EntryReason::Mint { memo: memo.clone() };
        self.credit(to, amount, reason, memo).await
    }

    /// Get all entries for an account
    pub async fn account_entries(&self, account: &Address) -> Vec<LedgerEntry> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|e| &e.account == account)
            .cloned()
            .collect()
    }

    /// Get entries sharing a correlation id (the two sides of a transfer)
    pub async fn correlated_entries(&self, correlation_id: &str) -> Vec<LedgerEntry> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|e| e.correlation_id == correlation_id)
            .cloned()
            .collect()
    }

    /// Get the total number of entries
    pub async fn entry_count(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Get recent entries (newest first)
    pub async fn recent_entries(&self, limit: usize) -> Vec<LedgerEntry> {
        let entries = self.entries.read().await;
        entries.iter().rev().take(limit).cloned().collect()
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

fn check_nonzero(amount: Amount) -> Result<()> {
    if amount.is_zero() {
        return Err(LedgerError::InvalidAmount {
            message: "amount must be greater than zero".to_string(),
        });
    }
    Ok(())
}

fn apply_credit(
    accounts: &mut HashMap<Address, AccountState>,
    entries: &mut Vec<LedgerEntry>,
    account: &Address,
    amount: Amount,
    reason: EntryReason,
    correlation_id: String,
) -> Result<EntryId> {
    let state = accounts.entry(*account).or_default();
    let new_balance = state
        .balance
        .checked_add(amount)
        .ok_or(LedgerError::Overflow { account: *account })?;

    let entry = LedgerEntry {
        entry_id: EntryId::new(),
        account: *account,
        entry_type: EntryType::Credit,
        amount,
        balance_after: new_balance,
        reason,
        correlation_id,
        created_at: Utc::now(),
    };

    state.balance = new_balance;
    state.entry_count += 1;

    let entry_id = entry.entry_id.clone();
    entries.push(entry);
    Ok(entry_id)
}

fn apply_debit(
    accounts: &mut HashMap<Address, AccountState>,
    entries: &mut Vec<LedgerEntry>,
    account: &Address,
    amount: Amount,
    reason: EntryReason,
    correlation_id: String,
) -> Result<EntryId> {
    let state = accounts
        .get_mut(account)
        .ok_or(LedgerError::AccountNotFound { account: *account })?;
    let new_balance =
        state
            .balance
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                available: state.balance,
                required: amount,
            })?;

    let entry = LedgerEntry {
        entry_id: EntryId::new(),
        account: *account,
        entry_type: EntryType::Debit,
        amount,
        balance_after: new_balance,
        reason,
        correlation_id,
        created_at: Utc::now(),
    };

    state.balance = new_balance;
    state.entry_count += 1;

    let entry_id = entry.entry_id.clone();
    entries.push(entry);
    Ok(entry_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bountyboard_types::MemberId;

    fn wallet() -> Address {
        Address::wallet(&MemberId::new())
    }

    #[tokio::test]
    async fn test_credit_and_balance() {
        let ledger = Ledger::new();
        let account = wallet();

        assert_eq!(ledger.balance(&account).await, Amount::zero());

        let (balance, _) = ledger
            .mint(&account, Amount::new(1000), "genesis")
            .await
            .unwrap();

        assert_eq!(balance, Amount::new(1000));
        assert_eq!(ledger.balance(&account).await, Amount::new(1000));
    }

    #[tokio::test]
    async fn test_debit() {
        let ledger = Ledger::new();
        let account = wallet();

        ledger
            .mint(&account, Amount::new(1000), "genesis")
            .await
            .unwrap();

        let (balance, _) = ledger
            .debit(
                &account,
                Amount::new(400),
                EntryReason::Mint {
                    memo: "reversal".to_string(),
                },
                "reversal".to_string(),
            )
            .await
            .unwrap();

        assert_eq!(balance, Amount::new(600));
    }

    #[tokio::test]
    async fn test_no_negative_balance() {
        let ledger = Ledger::new();
        let account = wallet();

        ledger
            .mint(&account, Amount::new(100), "genesis")
            .await
            .unwrap();

        let result = ledger
            .debit(
                &account,
                Amount::new(200),
                EntryReason::Mint {
                    memo: "overdraw".to_string(),
                },
                "overdraw".to_string(),
            )
            .await;

        assert!(matches!(
            result,
            Err(LedgerError::InsufficientBalance { .. })
        ));
        assert_eq!(ledger.balance(&account).await, Amount::new(100));
    }

    #[tokio::test]
    async fn test_zero_amount_rejected() {
        let ledger = Ledger::new();
        let account = wallet();

        let result = ledger.mint(&account, Amount::zero(), "nothing").await;
        assert!(matches!(result, Err(LedgerError::InvalidAmount { .. })));
    }

    #[tokio::test]
    async fn test_transfer() {
        let ledger = Ledger::new();
        let from = wallet();
        let to = wallet();

        ledger
            .mint(&from, Amount::new(1000), "genesis")
            .await
            .unwrap();

        let creator = MemberId::new();
        ledger
            .transfer(
                &from,
                &to,
                Amount::new(400),
                EntryReason::EscrowDeposit {
                    bounty: Address::bounty(&creator, 0),
                },
                "bounty_0".to_string(),
            )
            .await
            .unwrap();

        assert_eq!(ledger.balance(&from).await, Amount::new(600));
        assert_eq!(ledger.balance(&to).await, Amount::new(400));
    }

    #[tokio::test]
    async fn test_transfer_insufficient_leaves_both_sides_untouched() {
        let ledger = Ledger::new();
        let from = wallet();
        let to = wallet();

        ledger
            .mint(&from, Amount::new(100), "genesis")
            .await
            .unwrap();

        let creator = MemberId::new();
        let result = ledger
            .transfer(
                &from,
                &to,
                Amount::new(500),
                EntryReason::EscrowDeposit {
                    bounty: Address::bounty(&creator, 0),
                },
                "bounty_0".to_string(),
            )
            .await;

        assert!(matches!(
            result,
            Err(LedgerError::InsufficientBalance { .. })
        ));
        assert_eq!(ledger.balance(&from).await, Amount::new(100));
        assert_eq!(ledger.balance(&to).await, Amount::zero());
        // Only the mint entry exists
        assert_eq!(ledger.entry_count().await, 1);
    }

    #[tokio::test]
    async fn test_correlated_entries() {
        let ledger = Ledger::new();
        let from = wallet();
        let to = wallet();

        ledger
            .mint(&from, Amount::new(1000), "genesis")
            .await
            .unwrap();

        let creator = MemberId::new();
        ledger
            .transfer(
                &from,
                &to,
                Amount::new(400),
                EntryReason::EscrowDeposit {
                    bounty: Address::bounty(&creator, 7),
                },
                "bounty_7".to_string(),
            )
            .await
            .unwrap();

        let linked = ledger.correlated_entries("bounty_7").await;
        assert_eq!(linked.len(), 2); // debit + credit
        assert_eq!(ledger.account_entries(&from).await.len(), 2);
    }
}
