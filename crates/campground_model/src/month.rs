use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Add a signed number of days to a date
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date + chrono::Duration::days(days)
}

/// Signed number of days from `from` to `to`
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// Nights stayed between arrival and departure, never negative
pub fn nights(check_in: NaiveDate, check_out: NaiveDate) -> i64 {
    days_between(check_in, check_out).max(0)
}

/// Whether a date falls on Saturday or Sunday
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// An inclusive run of calendar days.
///
/// Reservations occupy `[check_in, check_out - 1]`, blackouts occupy
/// `[start_date, end_date]`. Expressing both as a `DaySpan` lets overlap tests
/// ignore the end-exclusive/end-inclusive difference between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DaySpan {
    /// First occupied day
    pub first: NaiveDate,
    /// Last occupied day
    pub last: NaiveDate,
}

impl DaySpan {
    /// Span covering `first..=last`
    pub fn new(first: NaiveDate, last: NaiveDate) -> Self {
        Self { first, last }
    }

    /// Span of the nights in a half-open stay `[start, end)`
    pub fn from_half_open(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            first: start,
            last: add_days(end, -1),
        }
    }

    /// A span whose last day precedes its first covers no days
    pub fn is_empty(&self) -> bool {
        self.last < self.first
    }

    /// Number of days covered
    pub fn len(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            days_between(self.first, self.last) + 1
        }
    }

    /// Whether `date` is one of the covered days
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.first && date <= self.last
    }

    /// Whether the two spans share at least one day
    pub fn overlaps(&self, other: &DaySpan) -> bool {
        !self.is_empty() && !other.is_empty() && self.first <= other.last && self.last >= other.first
    }

    /// Whether every day of `other` is covered by this span
    pub fn covers(&self, other: &DaySpan) -> bool {
        other.first >= self.first && other.last <= self.last
    }
}

/// One calendar month, the unit the scheduling grid displays and fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthRange {
    first: NaiveDate,
    last: NaiveDate,
}

impl MonthRange {
    /// Month `month` (1-12) of `year`
    pub fn new(year: i32, month: u32) -> Result<Self, ModelError> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| ModelError::InvalidMonth(format!("{:04}-{:02}", year, month)))?;
        let last = first
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .ok_or_else(|| ModelError::InvalidMonth(format!("{:04}-{:02}", year, month)))?;

        Ok(Self { first, last })
    }

    /// The month that contains `date`
    pub fn containing(date: NaiveDate) -> Self {
        let first = date.with_day(1).unwrap_or(date);
        let last = first
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(date);

        Self { first, last }
    }

    /// First day of the month
    pub fn first(&self) -> NaiveDate {
        self.first
    }

    /// Last day of the month
    pub fn last(&self) -> NaiveDate {
        self.last
    }

    /// The day after the last day, i.e. the month's exclusive end
    pub fn end_exclusive(&self) -> NaiveDate {
        add_days(self.last, 1)
    }

    /// Number of days in the month
    pub fn total_days(&self) -> i64 {
        days_between(self.first, self.last) + 1
    }

    /// The month as an inclusive day span
    pub fn span(&self) -> DaySpan {
        DaySpan::new(self.first, self.last)
    }

    /// Whether `date` lies within the month
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.first && date <= self.last
    }

    /// Zero-based column of `date`, if it lies within the month
    pub fn day_index(&self, date: NaiveDate) -> Option<usize> {
        if self.contains(date) {
            Some(days_between(self.first, date) as usize)
        } else {
            None
        }
    }

    /// Date of the zero-based column `index`
    pub fn date_at(&self, index: usize) -> Option<NaiveDate> {
        if (index as i64) < self.total_days() {
            Some(add_days(self.first, index as i64))
        } else {
            None
        }
    }

    /// Every day of the month in order
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let first = self.first;
        (0..self.total_days()).map(move |offset| add_days(first, offset))
    }

    /// The following month
    pub fn next(&self) -> Self {
        Self::containing(self.end_exclusive())
    }

    /// The preceding month
    pub fn previous(&self) -> Self {
        Self::containing(add_days(self.first, -1))
    }
}

impl fmt::Display for MonthRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.first.year(), self.first.month())
    }
}

impl FromStr for MonthRange {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| ModelError::InvalidMonth(s.to_string()))?;

        let year: i32 = year
            .parse()
            .map_err(|_| ModelError::InvalidMonth(s.to_string()))?;
        let month: u32 = month
            .parse()
            .map_err(|_| ModelError::InvalidMonth(s.to_string()))?;

        Self::new(year, month)
    }
}

impl TryFrom<String> for MonthRange {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthRange> for String {
    fn from(month: MonthRange) -> Self {
        month.to_string()
    }
}
