//! BountyBoard marketplace engine
//!
//! A trustless task marketplace core: a creator escrows a reward, an agent
//! claims and performs the task, and the creator approves (releasing payment
//! minus the platform fee) or rejects (reopening the bounty with escrow
//! untouched).
//!
//! The engine is the single writer over four account kinds — the registry
//! singleton, bounty records, escrow cells, and agent profiles — each located
//! by a deterministic derived address and backed by the funds ledger in
//! `bountyboard-ledger`.

pub mod escrow;
pub mod market;

pub use escrow::{EscrowCustody, EscrowSettlement, SettlementKind};
pub use market::BountyMarket;
