//! Calendar context for pacing
//!
//! Converts a local wall-clock time into fractional progress through the
//! current day, week (Monday start) and month. Pure and total: every valid
//! timestamp yields a context.

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, Timelike};

/// Elapsed progress through the current day, week and month
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalendarContext {
    /// Fraction of the day elapsed, in [0, 1]
    pub day_fraction: f64,
    /// Days elapsed since Monday 00:00, in [0, 7]
    pub week_elapsed_days: f64,
    pub days_in_month: u32,
    /// Days elapsed since the 1st 00:00, in [0, days_in_month]
    pub elapsed_days: f64,
}

impl CalendarContext {
    pub fn at(t: &NaiveDateTime) -> Self {
        let month = month_context(t);
        Self {
            day_fraction: month.day_fraction,
            week_elapsed_days: week_elapsed_days(t),
            days_in_month: month.days_in_month,
            elapsed_days: month.elapsed_days,
        }
    }
}

/// Month part of the calendar context
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthContext {
    pub days_in_month: u32,
    pub elapsed_days: f64,
    pub day_fraction: f64,
}

/// `(hours + minutes/60 + seconds/3600) / 24`, clamped to [0, 1]
pub fn day_fraction(t: &NaiveDateTime) -> f64 {
    let hours = t.hour() as f64 + t.minute() as f64 / 60.0 + t.second() as f64 / 3600.0;
    (hours / 24.0).clamp(0.0, 1.0)
}

/// Days since Monday 00:00, clamped to [0, 7]
pub fn week_elapsed_days(t: &NaiveDateTime) -> f64 {
    // Sunday-based numbering shifted so Monday = 0
    let dow = (t.weekday().num_days_from_sunday() + 6) % 7;
    (dow as f64 + day_fraction(t)).clamp(0.0, 7.0)
}

pub fn month_context(t: &NaiveDateTime) -> MonthContext {
    let fraction = day_fraction(t);
    MonthContext {
        days_in_month: days_in_month(t.year(), t.month()),
        elapsed_days: (t.day() - 1) as f64 + fraction,
        day_fraction: fraction,
    }
}

/// Number of days in `month` of `year`: the day before the 1st of next month
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month >= 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

/// Source of "now" for the pace engine
pub trait Clock: Send + Sync {
    /// Current local wall-clock time
    fn now(&self) -> NaiveDateTime;
}

/// Local system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Frozen time, for tests and replaying a sample
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
