//! Month calendar of journal days.

use std::collections::BTreeSet;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// A year and month, used for navigation links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthRef {
    pub year: i32,
    pub month: u32,
}

impl MonthRef {
    /// `None` unless the month's first day is a representable date.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn prev(self) -> Self {
        if self.month == 1 {
            Self { year: self.year - 1, month: 12 }
        } else {
            Self { year: self.year, month: self.month - 1 }
        }
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }

    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn name(self) -> &'static str {
        MONTH_NAMES[(self.month as usize - 1) % 12]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    /// False for the leading and trailing days borrowed from adjacent months.
    pub in_month: bool,
    pub has_journal: bool,
    pub is_today: bool,
}

/// A month laid out as whole Sunday-to-Saturday weeks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
    pub month_name: String,
    pub weeks: Vec<Vec<CalendarDay>>,
    pub prev: MonthRef,
    pub next: MonthRef,
}

/// Lay out `month`, flagging days that have a journal and today's date.
///
/// Returns `None` when the month is out of chrono's date range.
pub fn month_view(
    month: MonthRef,
    today: NaiveDate,
    journal_days: &BTreeSet<NaiveDate>,
) -> Option<MonthView> {
    let first = month.first_day()?;
    let last = month.next().first_day()?.pred_opt()?;

    let start = first.checked_sub_days(Days::new(first.weekday().num_days_from_sunday() as u64))?;
    let end = last.checked_add_days(Days::new(6 - last.weekday().num_days_from_sunday() as u64))?;

    let days: Vec<CalendarDay> = start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(|date| CalendarDay {
            date,
            in_month: date.month() == month.month && date.year() == month.year,
            has_journal: journal_days.contains(&date),
            is_today: date == today,
        })
        .collect();

    Some(MonthView {
        year: month.year,
        month: month.month,
        month_name: month.name().to_string(),
        weeks: days.chunks(7).map(<[CalendarDay]>::to_vec).collect(),
        prev: month.prev(),
        next: month.next(),
    })
}
