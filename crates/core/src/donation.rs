//! Donation eligibility window arithmetic.
//!
//! Whole-blood donors must wait a fixed interval between donations. The
//! dashboards display the next eligible date; this module is the single
//! source of that arithmetic.

use chrono::{Days, NaiveDate};

/// Minimum number of days between whole-blood donations.
pub const DONATION_INTERVAL_DAYS: u64 = 56;

/// The first date on which a donor who last donated on `last_donation` may
/// donate again.
#[must_use]
pub fn next_eligible_date(last_donation: NaiveDate) -> NaiveDate {
    // checked_add_days only fails near NaiveDate::MAX
    last_donation
        .checked_add_days(Days::new(DONATION_INTERVAL_DAYS))
        .unwrap_or(NaiveDate::MAX)
}

/// Whether a donor with the given last-donation date may donate on `date`.
///
/// A donor with no recorded donation is always eligible.
#[must_use]
pub fn is_eligible_on(last_donation: Option<NaiveDate>, date: NaiveDate) -> bool {
    match last_donation {
        Some(last) => date >= next_eligible_date(last),
        None => true,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_next_eligible_is_56_days_out() {
        assert_eq!(next_eligible_date(d(2026, 1, 1)), d(2026, 2, 26));
    }

    #[test]
    fn test_eligibility_boundary() {
        let last = d(2026, 1, 1);
        assert!(!is_eligible_on(Some(last), d(2026, 2, 25)));
        assert!(is_eligible_on(Some(last), d(2026, 2, 26)));
        assert!(is_eligible_on(Some(last), d(2026, 3, 1)));
    }

    #[test]
    fn test_never_donated_is_eligible() {
        assert!(is_eligible_on(None, d(2026, 1, 1)));
    }
}
