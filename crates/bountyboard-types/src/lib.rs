//! Canonical domain types for BountyBoard
//!
//! Zero dependencies on other bountyboard crates. Everything that crosses a
//! crate boundary lives here: member identities, derived account addresses,
//! token amounts, the bounty / marketplace / agent-profile records, and the
//! error taxonomy.

pub mod address;
pub mod amount;
pub mod bounty;
pub mod error;
pub mod identity;
pub mod marketplace;

pub use address::Address;
pub use amount::{Amount, TOKEN_DECIMALS};
pub use bounty::{
    Bounty, BountyDraft, BountyRef, BountyStatus, MAX_COMPLETION_DATA_LEN, MAX_DESCRIPTION_LEN,
    MAX_REJECTION_REASON_LEN, MAX_REQUIREMENTS_LEN, MAX_SUBMISSION_URL_LEN, MAX_TITLE_LEN,
};
pub use error::{ErrorKind, MarketError, Result};
pub use identity::MemberId;
pub use marketplace::{
    split_reward, AgentProfile, Marketplace, INITIAL_REPUTATION_SCORE, PLATFORM_FEE_PERCENT,
    REPUTATION_PER_COMPLETION,
};
