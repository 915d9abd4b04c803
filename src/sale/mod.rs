//! Crowdsale engine.
//!
//! Sells the token ledger at a time-tiered rate, tracks funds raised on-chain
//! and as an owner-reported fiat equivalent, keeps a bounded presale grant
//! registry, and finalizes exactly once: grantee mints, 10% team and 10%
//! advisor allocations, transfer unlock, ownership handback.

pub mod crowdsale;
pub mod grantees;
pub mod phase;
pub mod rate;

pub use crowdsale::{Crowdsale, SaleConfig};
pub use grantees::{GranteeRegistry, MAX_TOKEN_GRANTEES};
pub use phase::SalePhase;
pub use rate::{BASE_RATE, rate_at};

use primitive_types::{H160, U256};
use serde::{Deserialize, Serialize};

use crate::token::{TokenError, TokenEvent};
use crate::Timestamp;

/// Crowdsale error types
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SaleError {
    #[error("Caller is not authorized for this action")]
    Unauthorized,

    #[error("Invalid address: {address}")]
    InvalidAddress { address: H160 },

    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Sale window is invalid: start {start} must precede end {end}")]
    InvalidTimeRange { start: Timestamp, end: Timestamp },

    #[error("Sale is not active")]
    NotActive,

    #[error("Contribution value is zero")]
    ZeroContribution,

    #[error("Sale has not ended yet")]
    TooEarly,

    #[error("Sale has already ended")]
    AlreadyEnded,

    #[error("Sale is already finalized")]
    AlreadyFinalized,

    #[error("Grantee registry is full (max {max})")]
    RegistryFull { max: usize },

    #[error("Hard cap reached: raised {raised}, goal {goal}")]
    HardCapReached { raised: U256, goal: U256 },

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Token ledger error: {0}")]
    Token(#[from] TokenError),
}

/// Result type for crowdsale operations
pub type SaleResult<T> = Result<T, SaleError>;

/// Crowdsale event types for logging and subscriptions.
///
/// Each variant carries the addresses and amounts an external indexer needs
/// to reconstruct the sale state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaleEvent {
    /// Contribution recorded and tokens minted
    TokenPurchase {
        purchaser: H160,
        value: U256,
        tokens: U256,
    },

    /// New presale grantee registered
    GrantAdded { grantee: H160, amount: U256 },

    /// Existing presale grant overwritten
    GrantUpdated { grantee: H160, amount: U256 },

    /// Presale grant removed
    GrantDeleted { grantee: H160, amount: U256 },

    /// Owner-reported fiat-equivalent figure replaced
    FiatRaisedUpdated { previous: U256, amount: U256 },

    /// Sale finalized: grants minted, allocations made, transfers unlocked
    Finalized {
        team_allocation: U256,
        advisor_allocation: U256,
        total_supply: U256,
    },

    /// Token ledger event surfaced through the sale
    Token(TokenEvent),
}
