//! Inclusive calendar date ranges.

use crate::error::{DataError, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// An inclusive `[start, end]` range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Create a new range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(DataError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// First date in the range.
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last date in the range.
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether `date` falls inside the range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// UTC timestamps bounding the range: midnight of `start` and midnight
    /// after `end`, so the last day is included by providers with an
    /// exclusive upper bound.
    pub fn utc_bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self.start.and_time(NaiveTime::MIN).and_utc();
        let end = (self.end + Duration::days(1))
            .and_time(NaiveTime::MIN)
            .and_utc();
        (start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_rejects_inverted_range() {
        let result = DateRange::new(date(2024, 2, 1), date(2024, 1, 1));
        assert!(matches!(result, Err(DataError::InvalidDateRange { .. })));
    }

    #[test]
    fn test_single_day_range() {
        let range = DateRange::new(date(2024, 1, 2), date(2024, 1, 2)).unwrap();
        assert!(range.contains(date(2024, 1, 2)));
        assert!(!range.contains(date(2024, 1, 3)));
    }

    #[test]
    fn test_utc_bounds_cover_last_day() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 31)).unwrap();
        let (start, end) = range.utc_bounds();
        assert_eq!(start.date_naive(), date(2024, 1, 1));
        assert_eq!(end.date_naive(), date(2024, 2, 1));
    }
}
