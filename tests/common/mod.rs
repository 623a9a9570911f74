#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use health_sync::coord::Coord;
use health_sync::metric::CellAssignment;
use health_sync::mfp::{DaySummary, MeasurementPage, NutritionSource};
use health_sync::sheets::{Spreadsheet, Tab};
use health_sync::whoop::{
    Cycle, CycleScore, Recovery, RecoveryScore, ScoredSleep, SleepScore, SleepSession,
    StageSummary, WearableSource,
};
use health_sync::SyncError;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Completion cell in the template field map.
pub const COMPLETE_CELL: &str = "B2";

/// In-memory spreadsheet addressed by (tab title, cell).
#[derive(Default)]
pub struct FakeSheet {
    pub tabs: HashSet<String>,
    pub cells: HashMap<(String, Coord), String>,
    pub writes: Mutex<Vec<(String, Vec<CellAssignment>)>>,
    pub fail_writes: bool,
}

impl FakeSheet {
    /// Tabs with their value at [`COMPLETE_CELL`].
    pub fn with_tabs(tabs: &[(&str, &str)]) -> Self {
        let mut sheet = Self::default();
        for (title, marker) in tabs {
            sheet.tabs.insert(title.to_string());
            sheet = sheet.with_cell(title, COMPLETE_CELL, marker);
        }
        sheet
    }

    pub fn with_cell(mut self, title: &str, a1: &str, value: &str) -> Self {
        let coord: Coord = a1.parse().unwrap();
        self.cells.insert((title.to_string(), coord), value.to_string());
        self
    }

    pub fn writes(&self) -> Vec<(String, Vec<CellAssignment>)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl Spreadsheet for FakeSheet {
    async fn open_tab(&self, title: &str) -> Result<Option<Tab>, SyncError> {
        Ok(self.tabs.contains(title).then(|| Tab {
            title: title.to_string(),
        }))
    }

    async fn read_cell(&self, tab: &Tab, coord: Coord) -> Result<String, SyncError> {
        Ok(self
            .cells
            .get(&(tab.title.clone(), coord))
            .cloned()
            .unwrap_or_default())
    }

    async fn bulk_write(&self, tab: &Tab, cells: &[CellAssignment]) -> Result<(), SyncError> {
        if self.fail_writes {
            return Err(SyncError::Sheet("quota exceeded".into()));
        }
        self.writes
            .lock()
            .unwrap()
            .push((tab.title.clone(), cells.to_vec()));
        Ok(())
    }
}

pub fn sleep_session(start: &str, end: &str, asleep_millis: i64) -> SleepSession {
    SleepSession::Scored(ScoredSleep {
        start: start.parse().unwrap(),
        end: end.parse().unwrap(),
        nap: false,
        score: SleepScore {
            stage_summary: StageSummary {
                total_light_sleep_time_milli: asleep_millis / 2,
                total_slow_wave_sleep_time_milli: asleep_millis / 4,
                total_rem_sleep_time_milli: asleep_millis - asleep_millis / 2 - asleep_millis / 4,
            },
            sleep_efficiency_percentage: Some(90.4),
        },
    })
}

/// Wearable fake keyed by the day each query window is anchored on.
#[derive(Default)]
pub struct FakeWhoop {
    pub sleep: BTreeMap<NaiveDate, Vec<SleepSession>>,
    pub recovery: BTreeMap<NaiveDate, Vec<Recovery>>,
    pub cycles: BTreeMap<NaiveDate, Vec<Cycle>>,
    pub queried: Mutex<Vec<NaiveDate>>,
    pub auth_failure: bool,
    /// Collections ("sleep", "recovery", "cycles") that answer 503.
    pub unavailable: Vec<&'static str>,
}

impl FakeWhoop {
    /// One scored night, recovery and cycle for every day in `days`.
    pub fn with_days(days: impl IntoIterator<Item = NaiveDate>) -> Self {
        let mut fake = Self::default();
        for (i, day) in days.into_iter().enumerate() {
            let i = i as i64;
            let wake = day.and_hms_opt(7, 0, 0).unwrap().and_utc();
            let onset = wake - Duration::hours(8);
            fake.sleep.insert(
                day,
                vec![SleepSession::Scored(ScoredSleep {
                    start: onset,
                    end: wake,
                    nap: false,
                    score: SleepScore {
                        stage_summary: StageSummary {
                            total_light_sleep_time_milli: 3_600_000 * 4,
                            total_slow_wave_sleep_time_milli: 3_600_000,
                            total_rem_sleep_time_milli: 3_600_000 + i * 60_000,
                        },
                        sleep_efficiency_percentage: Some(90.0 + i as f64),
                    },
                })],
            );
            fake.recovery.insert(
                day,
                vec![Recovery {
                    cycle_id: Some(100 + i),
                    score: Some(RecoveryScore {
                        recovery_score: 60.0 + i as f64,
                        resting_heart_rate: 50.2,
                        hrv_rmssd_milli: 70.7,
                    }),
                }],
            );
            fake.cycles.insert(
                day,
                vec![Cycle {
                    id: 100 + i,
                    start: wake,
                    end: None,
                    score: Some(CycleScore { strain: 10.04 + i as f64 }),
                }],
            );
        }
        fake
    }

    pub fn queried(&self) -> Vec<NaiveDate> {
        self.queried.lock().unwrap().clone()
    }

    fn anchor_day(start: DateTime<Utc>) -> NaiveDate {
        (start + Duration::days(1)).date_naive()
    }

    fn check(&self, collection: &str) -> Result<(), SyncError> {
        if self.auth_failure {
            return Err(SyncError::Auth {
                service: "whoop",
                detail: "token revoked".into(),
            });
        }
        if self.unavailable.iter().any(|c| *c == collection) {
            return Err(SyncError::Status {
                service: "whoop",
                status: 503,
                body: "service unavailable".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl WearableSource for FakeWhoop {
    async fn sleep(
        &self,
        start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<SleepSession>, SyncError> {
        let day = Self::anchor_day(start);
        self.queried.lock().unwrap().push(day);
        self.check("sleep")?;
        Ok(self.sleep.get(&day).cloned().unwrap_or_default())
    }

    async fn recovery(
        &self,
        start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<Recovery>, SyncError> {
        self.check("recovery")?;
        Ok(self
            .recovery
            .get(&Self::anchor_day(start))
            .cloned()
            .unwrap_or_default())
    }

    async fn cycles(
        &self,
        start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<Cycle>, SyncError> {
        self.check("cycles")?;
        Ok(self
            .cycles
            .get(&Self::anchor_day(start))
            .cloned()
            .unwrap_or_default())
    }
}

/// Nutrition fake with a day summary per date and a paged weight feed.
#[derive(Default)]
pub struct FakeMfp {
    pub days: HashMap<NaiveDate, DaySummary>,
    pub weight_pages: Vec<MeasurementPage>,
    pub pages_fetched: Mutex<Vec<u32>>,
    pub failing_days: Vec<NaiveDate>,
}

impl FakeMfp {
    pub fn pages_fetched(&self) -> Vec<u32> {
        self.pages_fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl NutritionSource for FakeMfp {
    async fn day(&self, date: NaiveDate) -> Result<DaySummary, SyncError> {
        if self.failing_days.contains(&date) {
            return Err(SyncError::Status {
                service: "mfp",
                status: 502,
                body: "bad gateway".into(),
            });
        }
        Ok(self.days.get(&date).cloned().unwrap_or_default())
    }

    async fn measurements(&self, _kind: &str, page: u32) -> Result<MeasurementPage, SyncError> {
        self.pages_fetched.lock().unwrap().push(page);
        Ok(self
            .weight_pages
            .get(page as usize - 1)
            .cloned()
            .unwrap_or_default())
    }
}

pub const FIELD_MAP: &str = include_str!("../../templates/spreadsheet_map.json");
