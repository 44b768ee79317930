//! Error taxonomy for marketplace operations
//!
//! Every operation validates all preconditions before any mutation; on
//! failure it aborts whole and surfaces one of these variants. Nothing is
//! retried or downgraded inside the core.

use crate::{Address, Amount, BountyStatus};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type for marketplace operations
pub type Result<T> = std::result::Result<T, MarketError>;

/// Broad classification of a [`MarketError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input failed a static limit or range check
    Validation,
    /// The bounty was not in the required lifecycle state
    State,
    /// The caller is not the party the operation requires
    Authorization,
    /// The caller lacks the funds the operation requires
    Resource,
    /// Account existence or address-derivation integrity was violated
    Integrity,
}

/// Marketplace error types
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MarketError {
    // ========================================================================
    // Validation
    // ========================================================================
    #[error("title too long: {len} chars (max 100)")]
    TitleTooLong { len: usize },

    #[error("description too long: {len} chars (max 500)")]
    DescriptionTooLong { len: usize },

    #[error("requirements too long: {len} chars (max 200)")]
    RequirementsTooLong { len: usize },

    #[error("reward must be greater than zero")]
    InvalidReward,

    #[error("deadline {deadline} is not in the future")]
    InvalidDeadline { deadline: DateTime<Utc> },

    #[error("completion data too long: {len} chars (max 500)")]
    CompletionDataTooLong { len: usize },

    #[error("submission url too long: {len} chars (max 100)")]
    SubmissionUrlTooLong { len: usize },

    #[error("rejection reason too long: {len} chars (max 500)")]
    ReasonTooLong { len: usize },

    // ========================================================================
    // State
    // ========================================================================
    #[error("bounty is not open (status: {status})")]
    BountyNotOpen { status: BountyStatus },

    #[error("bounty is not in progress (status: {status})")]
    BountyNotInProgress { status: BountyStatus },

    #[error("bounty is not pending review (status: {status})")]
    BountyNotPendingReview { status: BountyStatus },

    #[error("bounty deadline {deadline} has passed")]
    BountyExpired { deadline: DateTime<Utc> },

    // ========================================================================
    // Authorization
    // ========================================================================
    #[error("caller is not the assigned agent")]
    NotAssignedAgent,

    #[error("caller is not the bounty creator")]
    NotBountyCreator,

    // ========================================================================
    // Resource
    // ========================================================================
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: Amount,
        available: Amount,
    },

    // ========================================================================
    // Integrity
    // ========================================================================
    #[error("marketplace is already initialized")]
    AlreadyInitialized,

    #[error("marketplace is not initialized")]
    NotInitialized,

    #[error("address mismatch: expected {expected}, supplied {supplied}")]
    AddressMismatch { expected: Address, supplied: Address },

    #[error("no bounty at address {address}")]
    BountyNotFound { address: Address },

    #[error("amount overflow")]
    AmountOverflow,

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl MarketError {
    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TitleTooLong { .. }
            | Self::DescriptionTooLong { .. }
            | Self::RequirementsTooLong { .. }
            | Self::InvalidReward
            | Self::InvalidDeadline { .. }
            | Self::CompletionDataTooLong { .. }
            | Self::SubmissionUrlTooLong { .. }
            | Self::ReasonTooLong { .. } => ErrorKind::Validation,

            Self::BountyNotOpen { .. }
            | Self::BountyNotInProgress { .. }
            | Self::BountyNotPendingReview { .. }
            | Self::BountyExpired { .. } => ErrorKind::State,

            Self::NotAssignedAgent | Self::NotBountyCreator => ErrorKind::Authorization,

            Self::InsufficientFunds { .. } => ErrorKind::Resource,

            Self::AlreadyInitialized
            | Self::NotInitialized
            | Self::AddressMismatch { .. }
            | Self::BountyNotFound { .. }
            | Self::AmountOverflow
            | Self::Internal { .. } => ErrorKind::Integrity,
        }
    }

    /// Get a stable error code for external surfaces
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::TitleTooLong { .. } => "TITLE_TOO_LONG",
            Self::DescriptionTooLong { .. } => "DESCRIPTION_TOO_LONG",
            Self::RequirementsTooLong { .. } => "REQUIREMENTS_TOO_LONG",
            Self::InvalidReward => "INVALID_REWARD",
            Self::InvalidDeadline { .. } => "INVALID_DEADLINE",
            Self::CompletionDataTooLong { .. } => "COMPLETION_DATA_TOO_LONG",
            Self::SubmissionUrlTooLong { .. } => "SUBMISSION_URL_TOO_LONG",
            Self::ReasonTooLong { .. } => "REASON_TOO_LONG",
            Self::BountyNotOpen { .. } => "BOUNTY_NOT_OPEN",
            Self::BountyNotInProgress { .. } => "BOUNTY_NOT_IN_PROGRESS",
            Self::BountyNotPendingReview { .. } => "BOUNTY_NOT_PENDING_REVIEW",
            Self::BountyExpired { .. } => "BOUNTY_EXPIRED",
            Self::NotAssignedAgent => "NOT_ASSIGNED_AGENT",
            Self::NotBountyCreator => "NOT_BOUNTY_CREATOR",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AddressMismatch { .. } => "ADDRESS_MISMATCH",
            Self::BountyNotFound { .. } => "BOUNTY_NOT_FOUND",
            Self::AmountOverflow => "AMOUNT_OVERFLOW",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            MarketError::TitleTooLong { len: 101 }.kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            MarketError::BountyNotOpen {
                status: BountyStatus::Completed
            }
            .kind(),
            ErrorKind::State
        );
        assert_eq!(
            MarketError::NotBountyCreator.kind(),
            ErrorKind::Authorization
        );
        assert_eq!(
            MarketError::InsufficientFunds {
                required: Amount::new(10),
                available: Amount::new(5),
            }
            .kind(),
            ErrorKind::Resource
        );
        assert_eq!(MarketError::AlreadyInitialized.kind(), ErrorKind::Integrity);
    }

    #[test]
    fn test_error_codes() {
        let err = MarketError::AddressMismatch {
            expected: Address::marketplace(),
            supplied: Address::marketplace(),
        };
        assert_eq!(err.error_code(), "ADDRESS_MISMATCH");
        assert_eq!(MarketError::InvalidReward.error_code(), "INVALID_REWARD");
    }
}
