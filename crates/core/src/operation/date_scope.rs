//! Calendar windows for date-scoped listings and balances.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Size of a date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// A whole calendar year.
    Year,
    /// A whole calendar month.
    Month,
    /// A single day.
    Day,
}

/// A half-open calendar window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateSpan {
    granularity: Granularity,
    start: NaiveDate,
    end: NaiveDate,
}

impl DateSpan {
    /// Window covering a calendar year.
    ///
    /// Returns `None` if the year is outside the supported calendar.
    #[must_use]
    pub fn year(year: i32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1)?;
        let end = NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?;
        Some(Self {
            granularity: Granularity::Year,
            start,
            end,
        })
    }

    /// Window covering a calendar month.
    ///
    /// Returns `None` for a month outside `1..=12` or an unsupported year.
    #[must_use]
    pub fn month(year: i32, month: u32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let end = if month == 12 {
            NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        Some(Self {
            granularity: Granularity::Month,
            start,
            end,
        })
    }

    /// Window covering one day.
    ///
    /// Returns `None` if the triple names no calendar date (for example February 30).
    #[must_use]
    pub fn day(year: i32, month: u32, day: u32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, day)?;
        let end = start.succ_opt()?;
        Some(Self {
            granularity: Granularity::Day,
            start,
            end,
        })
    }

    /// Window size.
    #[must_use]
    pub const fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// First day inside the window.
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// First day after the window.
    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Returns true if `date` falls inside the window.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

/// Date restriction applied to operations.
///
/// Built from the `year`, `month` and `day` query parameters. Month and day
/// only narrow an existing year; without a year they are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateScope {
    /// No date restriction. Undated operations are included.
    #[default]
    All,
    /// Only operations dated inside the window.
    Span(DateSpan),
    /// The parameters name no real calendar window, so nothing matches.
    Never,
}

impl DateScope {
    /// Resolves the `year` / `month` / `day` chain.
    ///
    /// | year | month | day | scope |
    /// |------|-------|-----|-------|
    /// | -    | any   | any | `All` |
    /// | Y    | -     | any | year Y |
    /// | Y    | M     | -   | month Y-M |
    /// | Y    | M     | D   | day Y-M-D |
    ///
    /// An impossible window (month 13, February 30) resolves to `Never`.
    #[must_use]
    pub fn from_parts(year: Option<i32>, month: Option<u32>, day: Option<u32>) -> Self {
        let Some(year) = year else {
            return Self::All;
        };

        let span = match (month, day) {
            (None, _) => DateSpan::year(year),
            (Some(month), None) => DateSpan::month(year, month),
            (Some(month), Some(day)) => DateSpan::day(year, month, day),
        };

        span.map_or(Self::Never, Self::Span)
    }

    /// Returns true if an operation dated `date` is inside the scope.
    ///
    /// Undated operations only match `All`.
    #[must_use]
    pub fn contains(&self, date: Option<NaiveDate>) -> bool {
        match self {
            Self::All => true,
            Self::Span(span) => date.is_some_and(|d| span.contains(d)),
            Self::Never => false,
        }
    }

    /// Returns the window, if the scope has one.
    #[must_use]
    pub const fn span(&self) -> Option<&DateSpan> {
        match self {
            Self::Span(span) => Some(span),
            Self::All | Self::Never => None,
        }
    }

    /// Returns true if the scope can never match an operation.
    #[must_use]
    pub const fn is_never(&self) -> bool {
        matches!(self, Self::Never)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use proptest::prelude::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case(None, None, None)]
    #[case(None, Some(5), None)]
    #[case(None, Some(5), Some(17))]
    #[case(None, None, Some(17))]
    fn test_month_and_day_need_a_year(
        #[case] year: Option<i32>,
        #[case] month: Option<u32>,
        #[case] day: Option<u32>,
    ) {
        assert_eq!(DateScope::from_parts(year, month, day), DateScope::All);
    }

    #[rstest]
    #[case(Some(2023), None, None, Granularity::Year, date(2023, 1, 1), date(2024, 1, 1))]
    #[case(Some(2023), None, Some(9), Granularity::Year, date(2023, 1, 1), date(2024, 1, 1))]
    #[case(Some(2023), Some(2), None, Granularity::Month, date(2023, 2, 1), date(2023, 3, 1))]
    #[case(Some(2023), Some(12), None, Granularity::Month, date(2023, 12, 1), date(2024, 1, 1))]
    #[case(Some(2024), Some(2), Some(29), Granularity::Day, date(2024, 2, 29), date(2024, 3, 1))]
    #[case(Some(2023), Some(12), Some(31), Granularity::Day, date(2023, 12, 31), date(2024, 1, 1))]
    fn test_from_parts_windows(
        #[case] year: Option<i32>,
        #[case] month: Option<u32>,
        #[case] day: Option<u32>,
        #[case] granularity: Granularity,
        #[case] start: NaiveDate,
        #[case] end: NaiveDate,
    ) {
        let scope = DateScope::from_parts(year, month, day);
        let span = scope.span().unwrap();

        assert_eq!(span.granularity(), granularity);
        assert_eq!(span.start(), start);
        assert_eq!(span.end(), end);
    }

    #[rstest]
    #[case(Some(2023), Some(13), None)]
    #[case(Some(2023), Some(0), None)]
    #[case(Some(2023), Some(2), Some(29))]
    #[case(Some(2023), Some(4), Some(31))]
    #[case(Some(2023), Some(1), Some(0))]
    #[case(Some(i32::MAX), None, None)]
    fn test_impossible_windows_match_nothing(
        #[case] year: Option<i32>,
        #[case] month: Option<u32>,
        #[case] day: Option<u32>,
    ) {
        let scope = DateScope::from_parts(year, month, day);

        assert!(scope.is_never());
        assert!(!scope.contains(Some(date(2023, 1, 1))));
        assert!(!scope.contains(None));
    }

    #[test]
    fn test_undated_operations_only_match_all() {
        assert!(DateScope::All.contains(None));
        assert!(!DateScope::from_parts(Some(2023), None, None).contains(None));
    }

    #[test]
    fn test_year_month_day_chain() {
        // Operations dated (Y,1,1), (Y-1,1,1), (Y-1,2,1).
        let dates = [date(2024, 1, 1), date(2023, 1, 1), date(2023, 2, 1)];
        let count = |scope: DateScope| dates.iter().filter(|d| scope.contains(Some(**d))).count();

        assert_eq!(count(DateScope::from_parts(Some(2023), None, None)), 2);
        assert_eq!(count(DateScope::from_parts(Some(2023), Some(1), None)), 1);
        assert_eq!(count(DateScope::from_parts(Some(2023), Some(1), Some(2))), 0);
        assert_eq!(count(DateScope::from_parts(Some(2023), Some(1), Some(1))), 1);
    }

    proptest! {
        #[test]
        fn prop_span_contains_agrees_with_calendar_fields(
            days in 0u64..40_000,
            year in 1950i32..2100,
            month in 1u32..=12,
            day in 1u32..=31,
        ) {
            let Some(d) = date(1950, 1, 1).checked_add_days(chrono::Days::new(days)) else {
                return Ok(());
            };

            let by_year = DateScope::from_parts(Some(year), None, None);
            prop_assert_eq!(by_year.contains(Some(d)), d.year() == year);

            let by_month = DateScope::from_parts(Some(year), Some(month), None);
            prop_assert_eq!(
                by_month.contains(Some(d)),
                d.year() == year && d.month() == month
            );

            let by_day = DateScope::from_parts(Some(year), Some(month), Some(day));
            prop_assert_eq!(
                by_day.contains(Some(d)),
                d.year() == year && d.month() == month && d.day() == day
            );
        }
    }
}
