//! Working-day counting over a supplied holiday set.
//!
//! The calendar is pure: callers fetch the relevant year's holidays and pass
//! them in. The same function validates `days_requested` at submission and
//! re-derives correct values during audits.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate, Weekday};

/// A set of holiday dates to exclude from working-day counts.
#[derive(Debug, Clone, Default)]
pub struct HolidaySet(HashSet<NaiveDate>);

impl HolidaySet {
    /// Creates an empty holiday set.
    #[must_use]
    pub fn empty() -> Self {
        Self(HashSet::new())
    }

    /// Returns true if the given date is a holiday.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.0.contains(&date)
    }

    /// Number of holidays in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the set holds no holidays.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the holiday dates in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<NaiveDate> for HolidaySet {
    fn from_iter<I: IntoIterator<Item = NaiveDate>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Returns true if `date` is neither a weekend day nor a holiday.
#[must_use]
pub fn is_working_day(date: NaiveDate, holidays: &HolidaySet) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !holidays.contains(date)
}

/// Counts working days between `start` and `end`, inclusive of both
/// endpoints.
///
/// Saturdays, Sundays, and any date in `holidays` are excluded. Returns 0
/// when `start > end`.
#[must_use]
pub fn working_days(start: NaiveDate, end: NaiveDate, holidays: &HolidaySet) -> i32 {
    if start > end {
        return 0;
    }

    let count = start
        .iter_days()
        .take_while(|day| *day <= end)
        .filter(|day| is_working_day(*day, holidays))
        .count();

    i32::try_from(count).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_full_working_week() {
        // 2025-01-20 is a Monday
        let count = working_days(date(2025, 1, 20), date(2025, 1, 24), &HolidaySet::empty());
        assert_eq!(count, 5);
    }

    #[test]
    fn test_weekend_only_span_counts_zero() {
        let count = working_days(date(2025, 1, 18), date(2025, 1, 19), &HolidaySet::empty());
        assert_eq!(count, 0);
    }

    #[test]
    fn test_mid_week_holiday_reduces_count() {
        let holidays: HolidaySet = [date(2025, 1, 22)].into_iter().collect();
        let count = working_days(date(2025, 1, 20), date(2025, 1, 24), &holidays);
        assert_eq!(count, 4);
    }

    #[test]
    fn test_weekend_holiday_is_not_double_subtracted() {
        // The holiday falls on a Saturday already excluded by the weekend rule.
        let holidays: HolidaySet = [date(2025, 1, 18)].into_iter().collect();
        let count = working_days(date(2025, 1, 13), date(2025, 1, 24), &holidays);
        assert_eq!(count, 10);
    }

    #[test]
    fn test_inverted_range_counts_zero() {
        let count = working_days(date(2025, 1, 24), date(2025, 1, 20), &HolidaySet::empty());
        assert_eq!(count, 0);
    }

    #[test]
    fn test_single_day_span() {
        assert_eq!(
            working_days(date(2025, 1, 20), date(2025, 1, 20), &HolidaySet::empty()),
            1
        );
        assert_eq!(
            working_days(date(2025, 1, 18), date(2025, 1, 18), &HolidaySet::empty()),
            0
        );
    }

    #[rstest]
    #[case(Weekday::Mon, true)]
    #[case(Weekday::Fri, true)]
    #[case(Weekday::Sat, false)]
    #[case(Weekday::Sun, false)]
    fn test_weekday_rule(#[case] weekday: Weekday, #[case] expected: bool) {
        // 2025-01-20 is a Monday; walk forward to the requested weekday.
        let mut day = date(2025, 1, 20);
        while day.weekday() != weekday {
            day = day.succ_opt().unwrap();
        }
        assert_eq!(is_working_day(day, &HolidaySet::empty()), expected);
    }
}
