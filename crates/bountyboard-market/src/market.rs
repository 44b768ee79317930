//! The bounty lifecycle state machine
//!
//! [`BountyMarket`] owns all marketplace state: the registry singleton, the
//! bounty records, the escrow cells, and the agent profiles, layered over a
//! funds [`Ledger`]. Every mutating operation takes one write guard, validates
//! all preconditions, and only then mutates state and moves funds, so a
//! failure leaves everything untouched and operations on the same records are
//! total-ordered.
//!
//! Callers address bounties through [`BountyRef`]; the engine re-derives the
//! expected address from the reference's primary keys and rejects a mismatch
//! before any effect.

use std::collections::HashMap;
use std::sync::Arc;

use bountyboard_ledger::{EntryReason, Ledger};
use bountyboard_types::{
    split_reward, Address, AgentProfile, Amount, Bounty, BountyDraft, BountyRef, BountyStatus,
    MarketError, Marketplace, MemberId, Result, MAX_COMPLETION_DATA_LEN, MAX_REJECTION_REASON_LEN,
    MAX_SUBMISSION_URL_LEN,
};
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::escrow::EscrowCustody;

#[derive(Default)]
struct MarketState {
    marketplace: Option<Marketplace>,
    bounties: HashMap<Address, Bounty>,
    escrows: HashMap<Address, EscrowCustody>,
    profiles: HashMap<Address, AgentProfile>,
}

/// The marketplace engine
///
/// Cloning shares the underlying state.
#[derive(Clone)]
pub struct BountyMarket {
    state: Arc<RwLock<MarketState>>,
    ledger: Ledger,
}

impl BountyMarket {
    /// Create an engine over the given funds ledger
    pub fn new(ledger: Ledger) -> Self {
        Self {
            state: Arc::new(RwLock::new(MarketState::default())),
            ledger,
        }
    }

    /// The underlying funds ledger
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    // ========================================================================
    // Mutating operations
    // ========================================================================

    /// Create the registry singleton; the caller becomes its authority
    pub async fn initialize(&self, authority: MemberId) -> Result<()> {
        let mut state = self.state.write().await;
        if state.marketplace.is_some() {
            return Err(MarketError::AlreadyInitialized);
        }
        state.marketplace = Some(Marketplace::new(authority, Utc::now()));
        info!(%authority, "marketplace initialized");
        Ok(())
    }

    /// Post a new bounty, escrowing the full reward from the creator's wallet
    ///
    /// Returns a reference carrying the assigned sequence id and derived
    /// address.
    pub async fn create_bounty(&self, creator: MemberId, draft: BountyDraft) -> Result<BountyRef> {
        let now = Utc::now();
        draft.validate(now)?;

        let mut state = self.state.write().await;
        let id = match &state.marketplace {
            Some(marketplace) => {
                // Volume must be recordable before any funds move
                marketplace
                    .total_volume
                    .checked_add(draft.reward)
                    .ok_or(MarketError::AmountOverflow)?;
                marketplace.total_bounties
            }
            None => return Err(MarketError::NotInitialized),
        };

        let wallet = Address::wallet(&creator);
        let bounty_address = Address::bounty(&creator, id);
        let escrow_address = Address::escrow(&creator, id);

        let available = self.ledger.balance(&wallet).await;
        if available < draft.reward {
            return Err(MarketError::InsufficientFunds {
                required: draft.reward,
                available,
            });
        }

        let reward = draft.reward;
        self.ledger
            .transfer(
                &wallet,
                &escrow_address,
                reward,
                EntryReason::EscrowDeposit {
                    bounty: bounty_address,
                },
                bounty_address.to_hex(),
            )
            .await?;

        let bounty = Bounty::open(id, creator, draft, now);
        let bounty_ref = bounty.to_ref();
        state
            .escrows
            .insert(escrow_address, EscrowCustody::open(creator, id, reward, now));
        state.bounties.insert(bounty_address, bounty);
        if let Some(marketplace) = state.marketplace.as_mut() {
            marketplace.record_created(reward)?;
        }

        info!(bounty = %bounty_address, id, %reward, "bounty created, reward escrowed");
        Ok(bounty_ref)
    }

    /// Claim an open bounty; the first claim to transition wins
    ///
    /// Creates the agent's profile on first claim. Moves no funds.
    pub async fn claim_bounty(&self, agent: MemberId, bounty_ref: &BountyRef) -> Result<()> {
        let now = Utc::now();
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let bounty = resolve(&mut state.bounties, bounty_ref)?;
        if bounty.status != BountyStatus::Open {
            return Err(MarketError::BountyNotOpen {
                status: bounty.status,
            });
        }
        if bounty.is_expired(now) {
            return Err(MarketError::BountyExpired {
                deadline: bounty.deadline,
            });
        }

        bounty.status = BountyStatus::InProgress;
        bounty.assigned_agent = Some(agent);

        state
            .profiles
            .entry(Address::agent_profile(&agent))
            .or_insert_with(|| AgentProfile::new(agent, now));

        debug!(bounty = %bounty_ref.address, %agent, "bounty claimed");
        Ok(())
    }

    /// Submit completed work for review
    pub async fn submit_completion(
        &self,
        agent: MemberId,
        bounty_ref: &BountyRef,
        completion_data: String,
        submission_url: String,
    ) -> Result<()> {
        if completion_data.chars().count() > MAX_COMPLETION_DATA_LEN {
            return Err(MarketError::CompletionDataTooLong {
                len: completion_data.chars().count(),
            });
        }
        if submission_url.chars().count() > MAX_SUBMISSION_URL_LEN {
            return Err(MarketError::SubmissionUrlTooLong {
                len: submission_url.chars().count(),
            });
        }

        let now = Utc::now();
        let mut guard = self.state.write().await;
        let bounty = resolve(&mut guard.bounties, bounty_ref)?;

        if bounty.status != BountyStatus::InProgress {
            return Err(MarketError::BountyNotInProgress {
                status: bounty.status,
            });
        }
        if bounty.assigned_agent != Some(agent) {
            return Err(MarketError::NotAssignedAgent);
        }

        bounty.completion_data = Some(completion_data);
        bounty.submission_url = Some(submission_url);
        bounty.submitted_at = Some(now);
        bounty.status = BountyStatus::PendingReview;

        debug!(bounty = %bounty_ref.address, %agent, "completion submitted");
        Ok(())
    }

    /// Approve submitted work, releasing the payment from escrow
    ///
    /// The agent receives `reward * 95 / 100`; the retained fee stays in the
    /// escrow cell. Returns the payment.
    pub async fn approve_completion(
        &self,
        creator: MemberId,
        bounty_ref: &BountyRef,
    ) -> Result<Amount> {
        let now = Utc::now();
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let bounty = resolve(&mut state.bounties, bounty_ref)?;
        if bounty.status != BountyStatus::PendingReview {
            return Err(MarketError::BountyNotPendingReview {
                status: bounty.status,
            });
        }
        if bounty.creator != creator {
            return Err(MarketError::NotBountyCreator);
        }
        let agent = bounty
            .assigned_agent
            .ok_or_else(|| MarketError::internal("pending review without an assigned agent"))?;

        let escrow = state
            .escrows
            .get_mut(&bounty.escrow)
            .ok_or_else(|| MarketError::internal(format!("missing escrow cell {}", bounty.escrow)))?;

        let (payment, fee) = split_reward(bounty.reward);
        let agent_wallet = Address::wallet(&agent);
        if !payment.is_zero() {
            self.ledger
                .transfer(
                    &escrow.address,
                    &agent_wallet,
                    payment,
                    EntryReason::EscrowPayout {
                        bounty: bounty.address,
                    },
                    bounty.address.to_hex(),
                )
                .await?;
        }
        escrow.record_payout(agent_wallet, payment, now)?;

        bounty.status = BountyStatus::Completed;
        bounty.completed_at = Some(now);

        let profile = state
            .profiles
            .get_mut(&Address::agent_profile(&agent))
            .ok_or_else(|| MarketError::internal("assigned agent has no profile"))?;
        profile.record_completion(payment)?;

        info!(bounty = %bounty_ref.address, %agent, %payment, %fee, "completion approved, payment released");
        Ok(payment)
    }

    /// Reject submitted work, returning the bounty to the open pool
    ///
    /// Clears the assignment and submission fields; escrow and reputation are
    /// untouched. Any agent, including the rejected one, may reclaim.
    pub async fn reject_completion(
        &self,
        creator: MemberId,
        bounty_ref: &BountyRef,
        reason: String,
    ) -> Result<()> {
        if reason.chars().count() > MAX_REJECTION_REASON_LEN {
            return Err(MarketError::ReasonTooLong {
                len: reason.chars().count(),
            });
        }

        let mut guard = self.state.write().await;
        let bounty = resolve(&mut guard.bounties, bounty_ref)?;

        if bounty.status != BountyStatus::PendingReview {
            return Err(MarketError::BountyNotPendingReview {
                status: bounty.status,
            });
        }
        if bounty.creator != creator {
            return Err(MarketError::NotBountyCreator);
        }

        bounty.status = BountyStatus::Open;
        bounty.assigned_agent = None;
        bounty.completion_data = None;
        bounty.submission_url = None;
        bounty.submitted_at = None;
        bounty.rejection_reason = Some(reason);

        debug!(bounty = %bounty_ref.address, "completion rejected, bounty reopened");
        Ok(())
    }

    /// Cancel an open bounty, refunding the full escrow to the creator
    ///
    /// Only reachable while `Open`, so the refund always equals the reward.
    /// Returns the refunded amount. `total_volume` is not reduced.
    pub async fn cancel_bounty(&self, creator: MemberId, bounty_ref: &BountyRef) -> Result<Amount> {
        let now = Utc::now();
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let bounty = resolve(&mut state.bounties, bounty_ref)?;
        if bounty.status != BountyStatus::Open {
            return Err(MarketError::BountyNotOpen {
                status: bounty.status,
            });
        }
        if bounty.creator != creator {
            return Err(MarketError::NotBountyCreator);
        }

        let escrow = state
            .escrows
            .get_mut(&bounty.escrow)
            .ok_or_else(|| MarketError::internal(format!("missing escrow cell {}", bounty.escrow)))?;

        let creator_wallet = Address::wallet(&creator);
        let refund = escrow.balance;
        if !refund.is_zero() {
            self.ledger
                .transfer(
                    &escrow.address,
                    &creator_wallet,
                    refund,
                    EntryReason::EscrowRefund {
                        bounty: bounty.address,
                    },
                    bounty.address.to_hex(),
                )
                .await?;
        }
        escrow.record_refund(creator_wallet, now)?;

        bounty.status = BountyStatus::Cancelled;

        info!(bounty = %bounty_ref.address, %refund, "bounty cancelled, escrow refunded");
        Ok(refund)
    }

    // ========================================================================
    // Read access (never mutating)
    // ========================================================================

    /// The registry singleton, if initialized
    pub async fn marketplace(&self) -> Option<Marketplace> {
        self.state.read().await.marketplace.clone()
    }

    /// Look up a bounty through a verified reference
    pub async fn bounty(&self, bounty_ref: &BountyRef) -> Result<Bounty> {
        let address = bounty_ref.verify()?;
        let state = self.state.read().await;
        state
            .bounties
            .get(&address)
            .cloned()
            .ok_or(MarketError::BountyNotFound { address })
    }

    /// Look up a bounty's escrow cell through a verified reference
    pub async fn escrow(&self, bounty_ref: &BountyRef) -> Result<EscrowCustody> {
        let address = bounty_ref.verify()?;
        let state = self.state.read().await;
        state
            .escrows
            .get(&Address::escrow(&bounty_ref.creator, bounty_ref.id))
            .cloned()
            .ok_or(MarketError::BountyNotFound { address })
    }

    /// An agent's reputation profile, if it exists
    pub async fn agent_profile(&self, agent: &MemberId) -> Option<AgentProfile> {
        let state = self.state.read().await;
        state.profiles.get(&Address::agent_profile(agent)).cloned()
    }

    /// Snapshot of all bounty records, for external projections
    pub async fn bounties(&self) -> Vec<Bounty> {
        let state = self.state.read().await;
        state.bounties.values().cloned().collect()
    }
}

impl Default for BountyMarket {
    fn default() -> Self {
        Self::new(Ledger::new())
    }
}

fn resolve<'a>(
    bounties: &'a mut HashMap<Address, Bounty>,
    bounty_ref: &BountyRef,
) -> Result<&'a mut Bounty> {
    let address = bounty_ref.verify()?;
    bounties
        .get_mut(&address)
        .ok_or(MarketError::BountyNotFound { address })
}
