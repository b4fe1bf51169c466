//! Collection window: the calendar date range a run is responsible for.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Inclusive [start, end] date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> crate::Result<Self> {
        if end < start {
            return Err(crate::Error::Config(format!(
                "invalid date window: {} is after {}",
                start, end
            )));
        }
        Ok(DateWindow { start, end })
    }

    /// Default scheduled window: exactly the calendar day before `today`.
    /// The one-day lag gives articles published late in the day time to
    /// appear before the window closes.
    pub fn preceding_day(today: NaiveDate) -> Self {
        let yesterday = today - Duration::days(1);
        DateWindow {
            start: yesterday,
            end: yesterday,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_preceding_day_window() {
        let run_date = d(2026, 3, 15);
        let window = DateWindow::preceding_day(run_date);
        // Only D-1 is inside; D-2, D and D+1 are out.
        assert!(!window.contains(d(2026, 3, 13)));
        assert!(window.contains(d(2026, 3, 14)));
        assert!(!window.contains(d(2026, 3, 15)));
        assert!(!window.contains(d(2026, 3, 16)));
    }

    #[test]
    fn test_backfill_range_inclusive() {
        let window = DateWindow::new(d(2026, 3, 1), d(2026, 3, 7)).unwrap();
        assert!(window.contains(d(2026, 3, 1)));
        assert!(window.contains(d(2026, 3, 4)));
        assert!(window.contains(d(2026, 3, 7)));
        assert!(!window.contains(d(2026, 2, 28)));
    }

    #[test]
    fn test_rejects_inverted_range() {
        assert!(DateWindow::new(d(2026, 3, 7), d(2026, 3, 1)).is_err());
    }
}
