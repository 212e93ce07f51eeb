//! Calendar-month values used as the time axis of every dataset.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate};

/// A calendar month, stored as the first day of that month.
///
/// Formats and parses as `YYYY-MM`.
///
/// # Examples
///
/// ```
/// use ward_energy::month::YearMonth;
///
/// let m: YearMonth = "2015-03".parse().unwrap();
/// assert_eq!(m.succ().to_string(), "2015-04");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth(NaiveDate);

/// Error returned when a string is not a valid `YYYY-MM` month.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid month \"{0}\", expected YYYY-MM")]
pub struct ParseMonthError(pub String);

impl YearMonth {
    /// Builds a month from a year and a 1-based month number.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    /// 1-based month number (January = 1).
    pub fn month(self) -> u32 {
        self.0.month()
    }

    /// 0-based calendar index (January = 0), the seasonal phase of this month.
    pub fn calendar_index(self) -> usize {
        self.0.month0() as usize
    }

    /// The following month.
    pub fn succ(self) -> Self {
        self.plus(1)
    }

    /// The month `n` months after this one.
    ///
    /// Saturates at the calendar's upper bound, which is far outside any
    /// consumption history.
    pub fn plus(self, n: u32) -> Self {
        self.0
            .checked_add_months(Months::new(n))
            .map_or(self, Self)
    }

    /// Signed number of months from `self` to `later`.
    pub fn months_until(self, later: Self) -> i64 {
        let years = i64::from(later.year()) - i64::from(self.year());
        let months = i64::from(later.month()) - i64::from(self.month());
        years * 12 + months
    }

    /// `count` consecutive months starting at `self`.
    pub fn range(self, count: usize) -> Vec<Self> {
        let mut out = Vec::with_capacity(count);
        let mut m = self;
        for _ in 0..count {
            out.push(m);
            m = m.succ();
        }
        out
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m"))
    }
}

impl FromStr for YearMonth {
    type Err = ParseMonthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        // Accept full dates too, the way spreadsheet exports sometimes write months.
        let date = NaiveDate::parse_from_str(&format!("{trimmed}-01"), "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d"))
            .map_err(|_| ParseMonthError(s.to_string()))?;
        Ok(Self(date.with_day(1).unwrap_or(date)))
    }
}
