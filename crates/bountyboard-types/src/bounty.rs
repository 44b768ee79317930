//! Bounty records and lifecycle status
//!
//! A [`Bounty`] is one task posted by a creator. Its status walks the graph
//! `Open -> InProgress -> PendingReview -> Completed`, with `PendingReview ->
//! Open` on rejection and `Open -> Cancelled` on cancellation. `Expired` is
//! observational only: nothing assigns it, callers judge it from the
//! deadline.

use crate::{Address, Amount, MarketError, MemberId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum title length in characters
pub const MAX_TITLE_LEN: usize = 100;
/// Maximum description length in characters
pub const MAX_DESCRIPTION_LEN: usize = 500;
/// Maximum requirements length in characters
pub const MAX_REQUIREMENTS_LEN: usize = 200;
/// Maximum completion data length in characters
pub const MAX_COMPLETION_DATA_LEN: usize = 500;
/// Maximum submission URL length in characters
pub const MAX_SUBMISSION_URL_LEN: usize = 100;
/// Maximum rejection reason length in characters
pub const MAX_REJECTION_REASON_LEN: usize = 500;

/// Lifecycle status of a bounty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BountyStatus {
    /// Claimable by any agent
    Open,
    /// Claimed, work underway
    InProgress,
    /// Work submitted, awaiting the creator's verdict
    PendingReview,
    /// Approved and paid out
    Completed,
    /// Cancelled by the creator before any claim
    Cancelled,
    /// Deadline passed without completion (observed, never assigned)
    Expired,
}

impl BountyStatus {
    /// Terminal states accept no further operations
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Expired)
    }
}

impl fmt::Display for BountyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Open => "open",
            Self::InProgress => "in progress",
            Self::PendingReview => "pending review",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        };
        write!(f, "{s}")
    }
}

/// Creator-supplied inputs for a new bounty
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BountyDraft {
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub reward: Amount,
    pub deadline: DateTime<Utc>,
}

impl BountyDraft {
    /// Check all static limits against the given wall clock
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), MarketError> {
        if self.title.chars().count() > MAX_TITLE_LEN {
            return Err(MarketError::TitleTooLong {
                len: self.title.chars().count(),
            });
        }
        if self.description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(MarketError::DescriptionTooLong {
                len: self.description.chars().count(),
            });
        }
        if self.requirements.chars().count() > MAX_REQUIREMENTS_LEN {
            return Err(MarketError::RequirementsTooLong {
                len: self.requirements.chars().count(),
            });
        }
        if self.reward.is_zero() {
            return Err(MarketError::InvalidReward);
        }
        if self.deadline <= now {
            return Err(MarketError::InvalidDeadline {
                deadline: self.deadline,
            });
        }
        Ok(())
    }
}

/// A single task record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bounty {
    /// Sequence id assigned from the marketplace counter at creation
    pub id: u64,
    pub creator: MemberId,
    /// Derived address of this record
    pub address: Address,
    /// Derived address of the bound escrow cell
    pub escrow: Address,
    pub title: String,
    pub description: String,
    pub requirements: String,
    /// Fixed reward, equal to the amount escrowed at creation
    pub reward: Amount,
    pub deadline: DateTime<Utc>,
    pub status: BountyStatus,
    pub assigned_agent: Option<MemberId>,
    pub created_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completion_data: Option<String>,
    pub submission_url: Option<String>,
    pub rejection_reason: Option<String>,
}

impl Bounty {
    /// Build an open bounty from a validated draft
    pub fn open(id: u64, creator: MemberId, draft: BountyDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            creator,
            address: Address::bounty(&creator, id),
            escrow: Address::escrow(&creator, id),
            title: draft.title,
            description: draft.description,
            requirements: draft.requirements,
            reward: draft.reward,
            deadline: draft.deadline,
            status: BountyStatus::Open,
            assigned_agent: None,
            created_at: now,
            submitted_at: None,
            completed_at: None,
            completion_data: None,
            submission_url: None,
            rejection_reason: None,
        }
    }

    /// Whether the deadline has passed at the given wall clock
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.deadline <= now
    }

    /// A validated reference to this bounty
    pub fn to_ref(&self) -> BountyRef {
        BountyRef {
            creator: self.creator,
            id: self.id,
            address: self.address,
        }
    }
}

/// A caller-supplied reference to a bounty
///
/// Carries the primary keys plus the address the caller believes they name.
/// Operations recompute the address from `(creator, id)` and reject the
/// reference before any effect if the supplied address differs, so a caller
/// cannot route an operation at a record they did not name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BountyRef {
    pub creator: MemberId,
    pub id: u64,
    pub address: Address,
}

impl BountyRef {
    /// Build a reference with the honestly derived address
    pub fn new(creator: MemberId, id: u64) -> Self {
        Self {
            creator,
            id,
            address: Address::bounty(&creator, id),
        }
    }

    /// Build a reference with an externally supplied (untrusted) address
    pub fn with_address(creator: MemberId, id: u64, address: Address) -> Self {
        Self {
            creator,
            id,
            address,
        }
    }

    /// Recompute the expected address and compare against the supplied one
    pub fn verify(&self) -> Result<Address, MarketError> {
        let expected = Address::bounty(&self.creator, self.id);
        if self.address != expected {
            return Err(MarketError::AddressMismatch {
                expected,
                supplied: self.address,
            });
        }
        Ok(expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn draft() -> BountyDraft {
        BountyDraft {
            title: "Summarize weekly reports".to_string(),
            description: "Produce a digest of all weekly reports".to_string(),
            requirements: "Markdown output".to_string(),
            reward: Amount::tokens(10),
            deadline: Utc::now() + Duration::days(7),
        }
    }

    #[test]
    fn test_draft_validation_passes() {
        assert!(draft().validate(Utc::now()).is_ok());
    }

    #[test]
    fn test_draft_limits() {
        let now = Utc::now();

        let mut d = draft();
        d.title = "A".repeat(101);
        assert!(matches!(
            d.validate(now),
            Err(MarketError::TitleTooLong { len: 101 })
        ));

        let mut d = draft();
        d.description = "B".repeat(501);
        assert!(matches!(
            d.validate(now),
            Err(MarketError::DescriptionTooLong { .. })
        ));

        let mut d = draft();
        d.requirements = "C".repeat(201);
        assert!(matches!(
            d.validate(now),
            Err(MarketError::RequirementsTooLong { .. })
        ));

        let mut d = draft();
        d.reward = Amount::zero();
        assert!(matches!(d.validate(now), Err(MarketError::InvalidReward)));

        let mut d = draft();
        d.deadline = now - Duration::hours(1);
        assert!(matches!(
            d.validate(now),
            Err(MarketError::InvalidDeadline { .. })
        ));
    }

    #[test]
    fn test_bounty_open_state() {
        let creator = MemberId::new();
        let bounty = Bounty::open(3, creator, draft(), Utc::now());
        assert_eq!(bounty.status, BountyStatus::Open);
        assert_eq!(bounty.address, Address::bounty(&creator, 3));
        assert_eq!(bounty.escrow, Address::escrow(&creator, 3));
        assert!(bounty.assigned_agent.is_none());
        assert!(bounty.completion_data.is_none());
    }

    #[test]
    fn test_ref_verify_detects_spoof() {
        let creator = MemberId::new();
        let honest = BountyRef::new(creator, 0);
        assert!(honest.verify().is_ok());

        let spoofed = BountyRef::with_address(creator, 0, Address::marketplace());
        assert!(matches!(
            spoofed.verify(),
            Err(MarketError::AddressMismatch { .. })
        ));
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(BountyStatus::Completed.is_terminal());
        assert!(BountyStatus::Cancelled.is_terminal());
        assert!(BountyStatus::Expired.is_terminal());
        assert!(!BountyStatus::Open.is_terminal());
        assert!(!BountyStatus::PendingReview.is_terminal());
    }
}
