use chrono::{Months, NaiveDate};

use crate::errors::HrmError;

/// First and last calendar day of `month` (1-12) in `year`.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), HrmError> {
    let first =
        NaiveDate::from_ymd_opt(year, month, 1).ok_or(HrmError::InvalidMonth { year, month })?;
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or(HrmError::InvalidMonth { year, month })?;
    Ok((first, last))
}

/// Number of days from `start` to `end`, both included.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// Every date from `start` through `end`. Empty when `start > end`.
pub fn dates_inclusive(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d <= end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_bounds_cover_leap_february() {
        assert_eq!(month_bounds(2024, 2).unwrap(), (date(2024, 2, 1), date(2024, 2, 29)));
        assert_eq!(month_bounds(2026, 2).unwrap(), (date(2026, 2, 1), date(2026, 2, 28)));
        assert_eq!(month_bounds(2026, 12).unwrap(), (date(2026, 12, 1), date(2026, 12, 31)));
    }

    #[test]
    fn invalid_month_is_rejected() {
        assert!(matches!(month_bounds(2026, 0), Err(HrmError::InvalidMonth { month: 0, .. })));
        assert!(matches!(month_bounds(2026, 13), Err(HrmError::InvalidMonth { month: 13, .. })));
    }

    #[test]
    fn inclusive_range_counts_both_ends() {
        assert_eq!(inclusive_days(date(2026, 3, 1), date(2026, 3, 1)), 1);
        assert_eq!(inclusive_days(date(2026, 3, 30), date(2026, 4, 2)), 4);
        let days: Vec<_> = dates_inclusive(date(2026, 3, 30), date(2026, 4, 2)).collect();
        assert_eq!(days.len(), 4);
        assert_eq!(days.last(), Some(&date(2026, 4, 2)));
        assert_eq!(dates_inclusive(date(2026, 4, 2), date(2026, 4, 1)).count(), 0);
    }
}
