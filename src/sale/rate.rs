//! Tiered pricing: a base rate plus a bonus that steps down as the sale ages,
//! front-loading the incentive for early contributors.

use crate::{days, Timestamp};

/// Tokens issued per wei before any bonus.
pub const BASE_RATE: u64 = 3200;

/// Bonus while less than one day has elapsed.
pub const DAY_1_BONUS: u64 = 960;

/// Bonus from day 1 through day 6.
pub const WEEK_1_BONUS: u64 = 640;

/// Bonus from day 7 through day 13.
pub const WEEK_2_BONUS: u64 = 480;

/// Bonus from day 14 onward.
pub const TAIL_BONUS: u64 = 320;

/// Rate at `now` for a sale that opened at `start_time`.
///
/// A non-increasing step function of elapsed time. Defined for any `now`;
/// before the sale opens it clamps to the day-1 rate.
pub fn rate_at(start_time: Timestamp, now: Timestamp) -> u64 {
    let elapsed = now.saturating_sub(start_time);

    let bonus = if elapsed < days(1) {
        DAY_1_BONUS
    } else if elapsed < days(7) {
        WEEK_1_BONUS
    } else if elapsed < days(14) {
        WEEK_2_BONUS
    } else {
        TAIL_BONUS
    };

    BASE_RATE + bonus
}
