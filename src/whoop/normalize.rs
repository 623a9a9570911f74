//! Turns the wearable collections for one calendar day into a [`DailyRecord`].
//!
//! The service treats sleep as spanning two calendar days, so a query anchored on a
//! day can return zero, one or two sessions. The policy is fixed:
//!
//! * zero records: the fields are unavailable
//! * one record: use it
//! * two or more: use the second, assumed to be the night leading into the queried
//!   day (the first being the following night)
//!
//! This is a heuristic. Naps and timezone changes around the anchor can select the
//! wrong record. Recovery and strain follow the same rule independently.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

use super::{Cycle, Recovery, RecoveryScore, SleepSession, WearableSource};
use crate::error::SyncError;
use crate::field_map::Source;
use crate::metric::{DailyRecord, Reading};

pub const SLEEP_EFFICIENCY: &str = "sleep_efficiency";
pub const SLEEP_DURATION: &str = "sleep_duration";
pub const SLEEP_TIME: &str = "sleep_time";
pub const WAKE_TIME: &str = "wake_time";
pub const HRV: &str = "HRV";
pub const RHR: &str = "RHR";
pub const RECOVERY: &str = "recovery";
pub const STRAIN: &str = "strain";

#[derive(Debug, Clone, PartialEq)]
pub struct SleepSummary {
    pub asleep: Duration,
    /// Fraction of time in bed spent asleep, `None` for unscored sessions.
    pub efficiency: Option<f64>,
    pub onset: NaiveTime,
    pub wake: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WearableDay {
    pub sleep: Option<SleepSummary>,
    pub recovery: Option<RecoveryScore>,
    pub strain: Option<f64>,
}

/// Local noon of `date` as an absolute instant.
pub fn cycle_anchor(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let noon = date.and_time(NaiveTime::MIN) + Duration::hours(12);
    tz.from_local_datetime(&noon)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&noon))
}

/// The ±1 day query window around the cycle anchor.
pub fn cycle_window(date: NaiveDate, tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let anchor = cycle_anchor(date, tz);
    (anchor - Duration::days(1), anchor + Duration::days(1))
}

/// Applies the 0 / 1 / 2+ cardinality rule.
pub fn pick<T>(records: Vec<T>) -> Option<T> {
    let mut records = records.into_iter();
    let first = records.next()?;
    Some(records.next().unwrap_or(first))
}

pub fn summarize_sleep(session: &SleepSession, tz: Tz) -> SleepSummary {
    let (asleep, efficiency) = match session {
        SleepSession::Scored(s) => (
            Duration::milliseconds(s.score.stage_summary.asleep_millis()),
            s.score
                .sleep_efficiency_percentage
                .map(|pct| pct.round() / 100.0),
        ),
        SleepSession::Unscored(s) => (s.end - s.start, None),
    };

    SleepSummary {
        asleep,
        efficiency,
        onset: session.start().with_timezone(&tz).time(),
        wake: session.end().with_timezone(&tz).time(),
    }
}

/// `HH:MM`, truncating seconds.
pub fn format_hhmm(duration: Duration) -> String {
    let minutes = duration.num_minutes().max(0);
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

fn clock(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

impl WearableDay {
    pub fn into_record(self, date: NaiveDate) -> DailyRecord {
        let mut record = DailyRecord::new(date, Source::Wearable);

        match &self.sleep {
            Some(sleep) => {
                record.push(
                    SLEEP_EFFICIENCY,
                    sleep.efficiency.map_or(Reading::Unavailable, Reading::Number),
                );
                record.push(SLEEP_DURATION, Reading::Text(format_hhmm(sleep.asleep)));
                record.push(SLEEP_TIME, Reading::Text(clock(sleep.onset)));
                record.push(WAKE_TIME, Reading::Text(clock(sleep.wake)));
            }
            None => {
                for metric in [SLEEP_EFFICIENCY, SLEEP_DURATION, SLEEP_TIME, WAKE_TIME] {
                    record.push(metric, Reading::Unavailable);
                }
            }
        }

        let whole = |v: f64| Reading::Whole(v.round() as i64);
        let recovery = self.recovery.as_ref();
        record.push(HRV, Reading::from_option(recovery.map(|r| r.hrv_rmssd_milli), whole));
        record.push(RHR, Reading::from_option(recovery.map(|r| r.resting_heart_rate), whole));
        record.push(RECOVERY, Reading::from_option(recovery.map(|r| r.recovery_score), whole));
        record.push(
            STRAIN,
            Reading::from_option(self.strain, |s| Reading::Number(round_to(s, 1))),
        );

        record
    }
}

/// Resolves the collection result, absorbing non-fatal failures as "no records".
fn absorb<T>(
    what: &str,
    date: NaiveDate,
    result: Result<Vec<T>, SyncError>,
) -> Result<Vec<T>, SyncError> {
    match result {
        Ok(records) => Ok(records),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            warn!("Could not fetch whoop {} for {}: {}", what, date, e);
            Ok(Vec::new())
        }
    }
}

pub async fn fetch_day(
    source: &dyn WearableSource,
    date: NaiveDate,
    tz: Tz,
) -> Result<WearableDay, SyncError> {
    let (start, end) = cycle_window(date, tz);
    debug!("Querying whoop for {} between {} and {}", date, start, end);

    let sessions = absorb("sleep", date, source.sleep(start, end).await)?;
    debug!("{} sleep sessions for {}", sessions.len(), date);
    let sleep = pick(sessions).map(|s| summarize_sleep(&s, tz));

    let recoveries: Vec<Recovery> = absorb("recovery", date, source.recovery(start, end).await)?;
    let recovery = pick(recoveries).and_then(|r| r.score);

    let cycles: Vec<Cycle> = absorb("cycles", date, source.cycles(start, end).await)?;
    let strain = pick(cycles).and_then(|c| c.score).map(|s| s.strain);

    Ok(WearableDay {
        sleep,
        recovery,
        strain,
    })
}

pub async fn day_record(
    source: &dyn WearableSource,
    date: NaiveDate,
    tz: Tz,
) -> Result<DailyRecord, SyncError> {
    Ok(fetch_day(source, date, tz).await?.into_record(date))
}
