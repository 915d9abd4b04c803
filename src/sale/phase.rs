//! Sale phase derivation.
//!
//! Phase is never stored; it is a pure function of the timestamp supplied to
//! the call and the sale's own counters, so transition logic lives in one
//! place.

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::Timestamp;

/// Lifecycle phase of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SalePhase {
    /// Sale window has not opened
    NotStarted,
    /// Open, under the hard cap, not finalized
    Active,
    /// Window closed or hard cap reached; waiting for finalize
    EndedAwaitingFinalize,
    /// Terminal
    Finalized,
}

/// Derive the phase from time, funds raised, and the finalized flag.
///
/// Reaching the hard cap ends the sale immediately regardless of the window.
pub fn derive(
    now: Timestamp,
    start_time: Timestamp,
    end_time: Timestamp,
    total_raised: U256,
    goal: U256,
    is_finalized: bool,
) -> SalePhase {
    if is_finalized {
        return SalePhase::Finalized;
    }
    if total_raised >= goal || now >= end_time {
        return SalePhase::EndedAwaitingFinalize;
    }
    if now < start_time {
        return SalePhase::NotStarted;
    }
    SalePhase::Active
}
