//! Token crowdsale engine.
//!
//! Two layered components: a transfer-locked token ledger ([`token`]) and a
//! crowdsale that sells it at a time-tiered rate ([`sale`]), wrapped in a
//! transactional engine ([`engine`]) that serializes every logical call and
//! commits it all-or-nothing, the way a chain would.

pub mod clock;
pub mod engine;
pub mod sale;
pub mod token;

use primitive_types::U256;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::SaleEngine;
pub use sale::{
    Crowdsale, SaleConfig, SaleError, SaleEvent, SalePhase, SaleResult,
};
pub use token::{TokenError, TokenEvent, TokenLedger, TokenResult};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Unix timestamp in seconds. Read once per logical call, never polled.
pub type Timestamp = u64;

/// Seconds in a day, the granularity of the rate schedule.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Convert whole ether to wei (1 ether = 10^18 wei).
pub fn ether(amount: u64) -> U256 {
    U256::from(amount) * U256::exp10(18)
}

/// Convert whole days to seconds.
pub fn days(n: u64) -> u64 {
    n * SECONDS_PER_DAY
}
