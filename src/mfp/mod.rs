//! Nutrition source: MyFitnessPal diary totals, water and weight measurements.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::SyncError;

pub mod client;
pub mod normalize;

/// Diary totals for one day. Nutrients the user logged nothing for are absent.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct DaySummary {
    #[serde(default)]
    pub totals: HashMap<String, f64>,
    /// Millilitres.
    #[serde(default)]
    pub water: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Measurement {
    pub date: NaiveDate,
    pub value: f64,
}

/// One page of the measurement history, newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementPage {
    pub items: Vec<Measurement>,
    pub has_more: bool,
}

#[async_trait]
pub trait NutritionSource: Send + Sync {
    /// Diary totals and water for `date`.
    ///
    /// The HTTP client reads these from `GET /api/services/diary/summary?date=YYYY-MM-DD`,
    /// expecting `{"totals": {name: value}, "water": ml}`. That endpoint shape has not been
    /// checked against the live service.
    async fn day(&self, date: NaiveDate) -> Result<DaySummary, SyncError>;

    /// `page` starts at 1.
    async fn measurements(&self, kind: &str, page: u32) -> Result<MeasurementPage, SyncError>;
}
