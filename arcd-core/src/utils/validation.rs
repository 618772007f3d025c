//! Input checks shared by the event constructors.

use crate::events::EventError;

/// A wager must commit at least one point.
pub fn validate_wager(wager: i64) -> Result<i64, EventError> {
    if wager <= 0 {
        return Err(EventError::InvalidWager(wager));
    }
    Ok(wager)
}

/// Share of `amount` for `percent`, rounded half away from zero.
pub fn percent_of(amount: i64, percent: u8) -> i64 {
    (amount * i64::from(percent) + 50).div_euclid(100)
}
