//! calendar helpers: whole-month arithmetic and month periods

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{LedgerError, Result};

/// add whole calendar months, clamping the day to the target month's length
///
/// jan 31 + 1 month is feb 28 (or 29), never march.
pub fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| LedgerError::InvalidDate {
            message: format!("{date} + {months} months is out of range"),
        })
}

/// subtract whole calendar months with the same clamping rule
pub fn sub_months(date: NaiveDate, months: u32) -> Result<NaiveDate> {
    date.checked_sub_months(Months::new(months))
        .ok_or_else(|| LedgerError::InvalidDate {
            message: format!("{date} - {months} months is out of range"),
        })
}

/// a calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawMonthPeriod", into = "RawMonthPeriod")]
pub struct MonthPeriod {
    year: i32,
    month: u32,
}

#[derive(Serialize, Deserialize)]
struct RawMonthPeriod {
    year: i32,
    month: u32,
}

impl TryFrom<RawMonthPeriod> for MonthPeriod {
    type Error = LedgerError;

    fn try_from(raw: RawMonthPeriod) -> Result<Self> {
        MonthPeriod::new(raw.year, raw.month)
    }
}

impl From<MonthPeriod> for RawMonthPeriod {
    fn from(period: MonthPeriod) -> Self {
        RawMonthPeriod {
            year: period.year,
            month: period.month,
        }
    }
}

impl MonthPeriod {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(LedgerError::InvalidDate {
                message: format!("month {month} is not in 1..=12"),
            });
        }
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(LedgerError::InvalidDate {
                message: format!("year {year} is out of range"),
            });
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// the period containing `date`
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        // years outside chrono's range clamp to its bounds
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(if self.year < 0 {
            NaiveDate::MIN
        } else {
            NaiveDate::MAX
        })
    }

    pub fn last_day(&self) -> NaiveDate {
        self.next().first_day().pred_opt().unwrap_or(NaiveDate::MIN)
    }

    pub fn date_range(&self) -> DateRange {
        DateRange {
            start: self.first_day(),
            end: self.last_day(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn next(&self) -> Self {
        self.offset(1)
    }

    pub fn previous(&self) -> Self {
        self.offset(-1)
    }

    /// shift by a signed number of months
    pub fn offset(&self, months: i32) -> Self {
        let index = self.year * 12 + (self.month as i32 - 1) + months;
        Self {
            year: index.div_euclid(12),
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    /// signed number of months from this period to `other`
    pub fn months_until(&self, other: MonthPeriod) -> i32 {
        (other.year - self.year) * 12 + (other.month as i32 - self.month as i32)
    }

    /// `count` consecutive periods starting with this one
    pub fn iter(&self, count: u32) -> impl Iterator<Item = MonthPeriod> {
        let start = *self;
        (0..count).map(move |i| start.offset(i as i32))
    }
}

impl fmt::Display for MonthPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// inclusive date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(LedgerError::InvalidDate {
                message: format!("range end {end} is before start {start}"),
            });
        }
        Ok(Self { start, end })
    }

    /// from `days` days before `end` through `end`
    pub fn trailing_days(end: NaiveDate, days: u32) -> Self {
        let start = end - chrono::Duration::days(days as i64);
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}
