use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

impl DateRange {
    /// The calendar month `month` (1-12) of `year`, or `None` for an invalid month.
    pub fn month(year: i32, month: u32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        Some(DateRange { start, end: next.pred_opt()? })
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn contains_instant(self, at: DateTime<Utc>) -> bool {
        self.contains(at.date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_bounds() {
        let jan = DateRange::month(2025, 1).unwrap();
        assert_eq!(jan.start, date(2025, 1, 1));
        assert_eq!(jan.end, date(2025, 1, 31));

        let feb_leap = DateRange::month(2024, 2).unwrap();
        assert_eq!(feb_leap.end, date(2024, 2, 29));

        let dec = DateRange::month(2024, 12).unwrap();
        assert_eq!(dec.end, date(2024, 12, 31));
    }

    #[test]
    fn month_rejects_invalid() {
        assert!(DateRange::month(2025, 0).is_none());
        assert!(DateRange::month(2025, 13).is_none());
    }

    #[test]
    fn contains_is_inclusive() {
        let range = DateRange::month(2025, 1).unwrap();
        assert!(range.contains(date(2025, 1, 1)));
        assert!(range.contains(date(2025, 1, 31)));
        assert!(!range.contains(date(2025, 2, 1)));
        assert!(range.contains_instant(Utc.with_ymd_and_hms(2025, 1, 31, 23, 59, 59).unwrap()));
    }

    #[test]
    fn date_range_display() {
        let range = DateRange::month(2025, 1).unwrap();
        assert_eq!(range.to_string(), "2025-01-01 to 2025-01-31");
    }
}
