#![forbid(unsafe_code)]

//! Day arithmetic on calendar dates.

use chrono::{Days, NaiveDate};

/// Shifts `date` by `days` (negative moves backwards). `None` when the result
/// leaves chrono's representable range.
pub fn add_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    if days >= 0 {
        date.checked_add_days(Days::new(days as u64))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    }
}

/// Signed number of days from `from` to `to`.
pub fn day_interval(from: NaiveDate, to: NaiveDate) -> i64 {
    to.signed_duration_since(from).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn shifts_across_month_and_leap_day() {
        assert_eq!(add_days(d(2024, 2, 28), 1), Some(d(2024, 2, 29)));
        assert_eq!(add_days(d(2024, 3, 1), -1), Some(d(2024, 2, 29)));
        assert_eq!(add_days(d(2023, 12, 31), 1), Some(d(2024, 1, 1)));
        assert_eq!(add_days(NaiveDate::MAX, 1), None);
        assert_eq!(add_days(d(2000, 1, 1), i64::MIN), None);
    }

    #[test]
    fn interval_is_signed() {
        assert_eq!(day_interval(d(2023, 12, 31), d(2024, 1, 3)), 3);
        assert_eq!(day_interval(d(2024, 1, 3), d(2023, 12, 31)), -3);
    }
}
