//! Walks the tracking spreadsheet one week tab at a time.
//!
//! ```text
//! FAST_FORWARD -> PROCESSING_WEEK -> SKIP_COMPLETE -> PROCESSING_WEEK
//!                                 -> WRITE_BATCH   -> PROCESSING_WEEK | DONE
//! ```
//!
//! A run ends when the spreadsheet has no tab for the next week, or when the cursor
//! moves past today. Neither is an error.

use std::time::Duration;

use chrono::NaiveDate;
use chrono_tz::Tz;
use tracing::{debug, error, info, warn};

use crate::cursor::DateCursor;
use crate::error::SyncError;
use crate::field_map::{FieldMap, DAYS_PER_WEEK};
use crate::metric::{render, DailyRecord, WeekBatch};
use crate::mfp::{self, NutritionSource};
use crate::sheets::{Spreadsheet, Tab};
use crate::whoop::{self, WearableSource};

const COMPLETE_MARKER: &str = "Y";

#[derive(Debug, Clone)]
pub struct WalkSettings {
    /// Day 1 of week 1.
    pub start_date: NaiveDate,
    pub start_week: u32,
    pub timezone: Tz,
    /// Delay before each week tab lookup.
    pub pacing: Duration,
}

/// Enabled data sources. A disabled source is `None`.
#[derive(Clone, Copy, Default)]
pub struct Sources<'a> {
    pub wearable: Option<&'a dyn WearableSource>,
    pub nutrition: Option<&'a dyn NutritionSource>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finish {
    /// No tab exists for the next week.
    OutOfTabs,
    /// The cursor moved past today.
    ReachedPresent,
}

#[derive(Debug, Clone)]
pub struct WalkReport {
    pub finish: Finish,
    pub cursor: DateCursor,
    pub weeks_written: u32,
    pub weeks_skipped: u32,
    pub cells_written: usize,
}

pub struct WeekWalker<'a> {
    settings: &'a WalkSettings,
    field_map: &'a FieldMap,
    sheet: &'a dyn Spreadsheet,
    sources: Sources<'a>,
    today: NaiveDate,
}

impl<'a> WeekWalker<'a> {
    pub fn new(
        settings: &'a WalkSettings,
        field_map: &'a FieldMap,
        sheet: &'a dyn Spreadsheet,
        sources: Sources<'a>,
        today: NaiveDate,
    ) -> Self {
        Self {
            settings,
            field_map,
            sheet,
            sources,
            today,
        }
    }

    pub async fn run(&self) -> Result<WalkReport, SyncError> {
        let mut cursor = DateCursor::new(self.settings.start_date);
        if self.settings.start_week > 1 {
            cursor.fast_forward(self.settings.start_week)?;
            info!(
                "Fast-forwarded to week {} starting {}",
                cursor.week(),
                cursor.date()
            );
        }

        let mut report = WalkReport {
            finish: Finish::OutOfTabs,
            cursor,
            weeks_written: 0,
            weeks_skipped: 0,
            cells_written: 0,
        };

        let finish = loop {
            if cursor.date() > self.today {
                break Finish::ReachedPresent;
            }

            tokio::time::sleep(self.settings.pacing).await;

            let title = cursor.tab_title();
            let Some(tab) = self.sheet.open_tab(&title).await? else {
                info!("Could not find tab for week {} - stopping", cursor.week());
                break Finish::OutOfTabs;
            };

            let marker = self.sheet.read_cell(&tab, self.field_map.complete()).await?;
            if marker == COMPLETE_MARKER {
                info!("Week {} is already complete, moving on", cursor.week());
                cursor.skip_week()?;
                report.weeks_skipped += 1;
                continue;
            }

            info!("Processing week {}", cursor.week());
            let mut batch = WeekBatch::new();
            let mut days_done = 0;
            while days_done < DAYS_PER_WEEK && cursor.date() <= self.today {
                days_done += 1;
                self.collect_day(days_done, cursor.date(), &mut batch).await?;
                cursor.advance_day()?;
            }

            self.flush(&tab, &mut batch, &mut report).await?;

            if days_done < DAYS_PER_WEEK {
                info!("Caught up to {} during week {}", self.today, cursor.week());
                break Finish::ReachedPresent;
            }
            cursor.next_week();
        };

        info!("Walk finished ({:?}) at {}", finish, cursor.date());
        report.finish = finish;
        report.cursor = cursor;
        Ok(report)
    }

    async fn collect_day(
        &self,
        day: u8,
        date: NaiveDate,
        batch: &mut WeekBatch,
    ) -> Result<(), SyncError> {
        info!("Processing day {} - {}", date, date.format("%A"));

        if let Some(wearable) = self.sources.wearable {
            let record =
                whoop::normalize::day_record(wearable, date, self.settings.timezone).await?;
            self.stage(day, &record, batch);
        }

        if let Some(nutrition) = self.sources.nutrition {
            let record = mfp::normalize::day_record(nutrition, date).await?;
            self.stage(day, &record, batch);
        }

        Ok(())
    }

    fn stage(&self, day: u8, record: &DailyRecord, batch: &mut WeekBatch) {
        for (metric, reading) in &record.entries {
            match self.field_map.lookup(day, record.source, metric) {
                Ok(coord) => batch.push(coord, render(record.source, metric, reading)),
                Err(miss) => warn!("{}", miss),
            }
        }
    }

    async fn flush(
        &self,
        tab: &Tab,
        batch: &mut WeekBatch,
        report: &mut WalkReport,
    ) -> Result<(), SyncError> {
        if batch.is_empty() {
            debug!("Nothing to write for '{}'", tab.title);
            return Ok(());
        }

        match self.sheet.bulk_write(tab, batch.cells()).await {
            Ok(()) => {
                report.weeks_written += 1;
                report.cells_written += batch.len();
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => error!("Failed to update '{}': {}", tab.title, e),
        }
        batch.clear();
        Ok(())
    }
}
