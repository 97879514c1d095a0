use serde::{Deserialize, Serialize};

use crate::ledger::ResearchRecord;
use crate::{RegistryError, ResearchRegistry};

/// Remaining research time, rounded up to a quarter hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRemaining {
    pub hours: u64,
    /// Always one of 0, 15, 30 or 45.
    pub minutes: u64,
}

impl std::fmt::Display for TimeRemaining {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{:02}", self.hours, self.minutes)
    }
}

/// Converts remaining progress into `hours:minutes`.
///
/// One displayed hour is `2 * base_research_time` progress units and each
/// quarter hour is half of `base_research_time`. A partial quarter counts as a
/// whole one; four quarters carry into the next hour.
///
/// `base_research_time` must be positive. The arithmetic is widened to `u128`
/// so any `u64` inputs are exact.
pub fn quantize_remaining(remaining: u64, base_research_time: u64) -> TimeRemaining {
    let h = u128::from(base_research_time);
    let remaining = u128::from(remaining);
    let per_hour = h * 2;
    // at most u64::MAX / 2, since per_hour >= 2
    let hours = u64::try_from(remaining / per_hour).unwrap_or(u64::MAX);
    // ceil(rem / (H / 2)) == ceil(2 * rem / H), kept in integers; always 0..=4
    let increments = (2 * (remaining % per_hour)).div_ceil(h);

    if increments == 4 {
        TimeRemaining {
            hours: hours + 1,
            minutes: 0,
        }
    } else {
        TimeRemaining {
            hours,
            minutes: u64::try_from(increments * 15).unwrap_or(45),
        }
    }
}

pub fn estimate_remaining(
    registry: &ResearchRegistry,
    record: &ResearchRecord,
) -> Result<TimeRemaining, RegistryError> {
    Ok(quantize_remaining(
        record.remaining(registry)?,
        registry.base_research_time(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const H: u64 = 60;

    fn at(hours: u64, minutes: u64) -> TimeRemaining {
        TimeRemaining { hours, minutes }
    }

    #[test]
    fn test_nothing_remaining_is_zero() {
        assert_eq!(quantize_remaining(0, H), at(0, 0));
    }

    #[test]
    fn test_partial_quarter_rounds_up() {
        assert_eq!(quantize_remaining(1, H), at(0, 15));
        assert_eq!(quantize_remaining(31, H), at(0, 30));
        // 75 units: 2.5 quarters -> 3
        assert_eq!(quantize_remaining(75, H), at(0, 45));
    }

    #[test]
    fn test_exact_quarter_boundary_does_not_round_further() {
        assert_eq!(quantize_remaining(30, H), at(0, 15));
        assert_eq!(quantize_remaining(60, H), at(0, 30));
        assert_eq!(quantize_remaining(90, H), at(0, 45));
        assert_eq!(quantize_remaining(120, H), at(1, 0));
    }

    #[test]
    fn test_fourth_quarter_carries_into_the_hour() {
        assert_eq!(quantize_remaining(119, H), at(1, 0));
        assert_eq!(quantize_remaining(2 * 120 + 91, H), at(3, 0));
    }

    #[test]
    fn test_multi_hour_remainders() {
        assert_eq!(quantize_remaining(330, H), at(2, 45));
        assert_eq!(quantize_remaining(480, H), at(4, 0));
    }

    #[test]
    fn test_odd_base_time_keeps_fractional_quarters() {
        // H = 5: quarter = 2.5 units, hour = 10 units
        assert_eq!(quantize_remaining(5, 5), at(0, 30));
        assert_eq!(quantize_remaining(6, 5), at(0, 45));
        assert_eq!(quantize_remaining(8, 5), at(1, 0));
    }

    #[test]
    fn test_huge_base_time_does_not_overflow() {
        let h = u64::MAX;
        // a full H is half an hour, whatever H is
        assert_eq!(quantize_remaining(h, h), at(0, 30));
        assert_eq!(quantize_remaining(h / 2, h), at(0, 15));
        assert_eq!(quantize_remaining(1, h), at(0, 15));

        // one unit short of a full hour still carries
        let h = u64::MAX / 2 + 1;
        assert_eq!(quantize_remaining(u64::MAX, h), at(1, 0));
    }

    #[test]
    fn test_max_remaining_with_small_base_time() {
        assert_eq!(quantize_remaining(u64::MAX, 1), at(u64::MAX / 2, 30));
    }

    #[test]
    fn test_renders_as_clock() {
        assert_eq!(at(0, 0).to_string(), "0:00");
        assert_eq!(at(12, 45).to_string(), "12:45");
    }
}
