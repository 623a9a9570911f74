use chrono::{Duration, NaiveDate};

use crate::error::SyncError;
use crate::field_map::DAYS_PER_WEEK;

/// Current calendar date and week tab index of a walk.
///
/// The date is always `start + 7 * (week - 1) + days processed in the current week`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateCursor {
    start: NaiveDate,
    date: NaiveDate,
    week: u32,
}

impl DateCursor {
    /// `start` is day 1 of week 1.
    pub fn new(start: NaiveDate) -> Self {
        Self {
            start,
            date: start,
            week: 1,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn week(&self) -> u32 {
        self.week
    }

    /// Day 1 of the current week.
    pub fn week_start(&self) -> NaiveDate {
        self.start + Duration::days(i64::from(DAYS_PER_WEEK) * i64::from(self.week - 1))
    }

    /// Moves to `week` without visiting the days in between.
    pub fn fast_forward(&mut self, week: u32) -> Result<(), SyncError> {
        if week <= self.week {
            return Ok(());
        }
        let weeks = i64::from(week - self.week);
        self.date = step(self.date, weeks * i64::from(DAYS_PER_WEEK))?;
        self.week = week;
        Ok(())
    }

    pub fn skip_week(&mut self) -> Result<(), SyncError> {
        self.date = step(self.date, i64::from(DAYS_PER_WEEK))?;
        self.week += 1;
        Ok(())
    }

    pub fn advance_day(&mut self) -> Result<(), SyncError> {
        self.date = step(self.date, 1)?;
        Ok(())
    }

    /// Called after all seven days of a week were advanced.
    pub fn next_week(&mut self) {
        self.week += 1;
    }

    pub fn tab_title(&self) -> String {
        format!("Week {}", self.week)
    }
}

fn step(date: NaiveDate, days: i64) -> Result<NaiveDate, SyncError> {
    Duration::try_days(days)
        .and_then(|d| date.checked_add_signed(d))
        .ok_or_else(|| SyncError::Config(format!("{date} + {days} days is out of range")))
}
