//! Wearable source: WHOOP sleep, recovery and cycle (strain) collections.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::SyncError;

pub mod client;
pub mod normalize;

/// One page of a WHOOP collection endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub records: Vec<T>,
    #[serde(default)]
    pub next_token: Option<String>,
}

/// A sleep session. The service omits (or nulls) `score` until it has scored the
/// session, so the shape is resolved here rather than in the normaliser.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SleepSession {
    Scored(ScoredSleep),
    Unscored(UnscoredSleep),
}

impl SleepSession {
    pub fn start(&self) -> DateTime<Utc> {
        match self {
            SleepSession::Scored(s) => s.start,
            SleepSession::Unscored(s) => s.start,
        }
    }

    pub fn end(&self) -> DateTime<Utc> {
        match self {
            SleepSession::Scored(s) => s.end,
            SleepSession::Unscored(s) => s.end,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ScoredSleep {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub nap: bool,
    pub score: SleepScore,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct UnscoredSleep {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub nap: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SleepScore {
    pub stage_summary: StageSummary,
    #[serde(default)]
    pub sleep_efficiency_percentage: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StageSummary {
    pub total_light_sleep_time_milli: i64,
    pub total_slow_wave_sleep_time_milli: i64,
    pub total_rem_sleep_time_milli: i64,
}

impl StageSummary {
    /// Light + REM + slow-wave; awake time is excluded.
    pub fn asleep_millis(&self) -> i64 {
        self.total_light_sleep_time_milli
            + self.total_rem_sleep_time_milli
            + self.total_slow_wave_sleep_time_milli
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Recovery {
    #[serde(default)]
    pub cycle_id: Option<i64>,
    #[serde(default)]
    pub score: Option<RecoveryScore>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RecoveryScore {
    pub recovery_score: f64,
    pub resting_heart_rate: f64,
    pub hrv_rmssd_milli: f64,
}

/// The service's 24h physiological window.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Cycle {
    pub id: i64,
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub score: Option<CycleScore>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CycleScore {
    pub strain: f64,
}

/// Records are returned in service order, newest first.
#[async_trait]
pub trait WearableSource: Send + Sync {
    async fn sleep(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SleepSession>, SyncError>;

    async fn recovery(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Recovery>, SyncError>;

    async fn cycles(&self, start: DateTime<Utc>, end: DateTime<Utc>)
        -> Result<Vec<Cycle>, SyncError>;
}
