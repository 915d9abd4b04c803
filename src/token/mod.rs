//! Transfer-locked token ledger.
//!
//! An ERC-20 style ledger whose transfers start locked: until the owner
//! enables them, only the owner may move or burn tokens. Ownership moves via
//! a two-step propose/claim handover so authority is never dropped on the
//! floor.

pub mod ledger;

pub use ledger::TokenLedger;

use primitive_types::{H160, U256};
use serde::{Deserialize, Serialize};

/// Token ledger error types
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Caller is not authorized for this action")]
    Unauthorized,

    #[error("Invalid address: {address}")]
    InvalidAddress { address: H160 },

    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Transfers are disabled")]
    TransfersDisabled,

    #[error("Transfers are already enabled and cannot be locked again")]
    AlreadyUnlocked,

    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: U256, available: U256 },

    #[error("Insufficient allowance: required {required}, available {available}")]
    InsufficientAllowance { required: U256, available: U256 },

    #[error("Arithmetic overflow")]
    Overflow,
}

/// Result type for token ledger operations
pub type TokenResult<T> = Result<T, TokenError>;

/// Token ledger event types for logging and subscriptions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenEvent {
    /// Tokens minted to an account
    Issue { to: H160, amount: U256 },

    /// Tokens moved between accounts
    Transfer { from: H160, to: H160, amount: U256 },

    /// Spending allowance granted
    Approval {
        owner: H160,
        spender: H160,
        amount: U256,
    },

    /// Tokens burned from an account
    Destroy { from: H160, amount: U256 },

    /// Transfer lock status changed
    TransferLockChanged { enabled: bool },

    /// Ownership handover proposed
    OwnershipTransferStarted {
        owner: H160,
        pending_owner: H160,
    },

    /// Ownership handover claimed
    OwnershipTransferred {
        old_owner: H160,
        new_owner: H160,
    },
}
