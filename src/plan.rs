//! Works back from the last day of the current week to list every tracked day,
//! which gives the start date for week 1.

use chrono::{Duration, NaiveDate};

use crate::field_map::DAYS_PER_WEEK;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedDay {
    pub week: u32,
    pub day: u8,
    pub date: NaiveDate,
}

impl std::fmt::Display for PlannedDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Week {} - Day {}: {} - {}",
            self.week,
            self.day,
            self.date.format("%A"),
            self.date.format("%Y-%m-%d")
        )
    }
}

/// `last_day` is day 7 of `week`. Days come out newest first.
pub fn plan_backwards(last_day: NaiveDate, week: u32) -> Vec<PlannedDay> {
    let mut date = last_day;
    let mut days = Vec::with_capacity(week as usize * DAYS_PER_WEEK as usize);
    for week in (1..=week).rev() {
        for day in (1..=DAYS_PER_WEEK).rev() {
            days.push(PlannedDay { week, day, date });
            date -= Duration::days(1);
        }
    }
    days
}
