use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{debug, warn};

use super::{DaySummary, NutritionSource};
use crate::error::SyncError;
use crate::field_map::Source;
use crate::metric::{DailyRecord, Reading};

pub const WATER: &str = "water";
pub const CALORIES: &str = "calories";
pub const CARBS: &str = "carbs";
pub const FAT: &str = "fat";
pub const PROTEIN: &str = "protein";
pub const FIBER: &str = "fiber";
pub const WEIGHT: &str = "weight";

const WEIGHT_KIND: &str = "Weight";

const MACROS: [&str; 5] = [CALORIES, CARBS, FAT, PROTEIN, FIBER];

#[derive(Debug, Clone, PartialEq)]
pub struct NutritionDay {
    pub water_ml: f64,
    pub calories: f64,
    pub carbs: f64,
    pub fat: f64,
    pub protein: f64,
    pub fiber: f64,
}

impl NutritionDay {
    /// Absent water and absent totals count as zero.
    pub fn from_summary(summary: &DaySummary) -> Self {
        let total = |key: &str| summary.totals.get(key).copied().unwrap_or(0.0);
        Self {
            water_ml: summary.water.unwrap_or(0.0),
            calories: total("calories"),
            carbs: total("carbohydrates"),
            fat: total("fat"),
            protein: total("protein"),
            fiber: total("fiber"),
        }
    }
}

pub fn millilitres_to_litres(ml: f64) -> f64 {
    (ml / 1000.0 * 100.0).round() / 100.0
}

/// Walks the newest-first measurement feed until a page reaches past `date`.
pub async fn resolve_weight(
    source: &dyn NutritionSource,
    date: NaiveDate,
) -> Result<Option<f64>, SyncError> {
    let mut seen = BTreeMap::new();
    for page_num in 1.. {
        let page = source.measurements(WEIGHT_KIND, page_num).await?;
        let mut done = !page.has_more || page.items.is_empty();
        for item in page.items {
            if item.date < date {
                done = true;
                break;
            }
            seen.insert(item.date, item.value);
        }
        if done {
            break;
        }
    }
    debug!("Scanned {} weight entries back to {}", seen.len(), date);
    Ok(seen.get(&date).copied())
}

pub fn build_record(
    date: NaiveDate,
    day: Option<NutritionDay>,
    weight: Result<Option<f64>, ()>,
) -> DailyRecord {
    let mut record = DailyRecord::new(date, Source::Nutrition);

    match day {
        Some(day) => {
            record.push(WATER, Reading::Number(day.water_ml));
            record.push(CALORIES, Reading::Number(day.calories));
            record.push(CARBS, Reading::Number(day.carbs));
            record.push(FAT, Reading::Number(day.fat));
            record.push(PROTEIN, Reading::Number(day.protein));
            record.push(FIBER, Reading::Number(day.fiber));
        }
        None => {
            record.push(WATER, Reading::Unavailable);
            for metric in MACROS {
                record.push(metric, Reading::Unavailable);
            }
        }
    }

    let weight = match weight {
        Ok(Some(kg)) => Reading::Number(kg),
        Ok(None) => Reading::Blank,
        Err(()) => Reading::Unavailable,
    };
    record.push(WEIGHT, weight);
    record
}

pub async fn day_record(
    source: &dyn NutritionSource,
    date: NaiveDate,
) -> Result<DailyRecord, SyncError> {
    let day = match source.day(date).await {
        Ok(summary) => {
            debug!("mfp totals for {}: {:?}", date, summary);
            Some(NutritionDay::from_summary(&summary))
        }
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => {
            warn!("Could not fetch mfp diary for {}: {}", date, e);
            None
        }
    };

    let weight = match resolve_weight(source, date).await {
        Ok(weight) => Ok(weight),
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => {
            warn!("Could not fetch mfp weight for {}: {}", date, e);
            Err(())
        }
    };

    Ok(build_record(date, day, weight))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_millilitres() {
        assert_eq!(millilitres_to_litres(2500.0), 2.5);
        assert_eq!(millilitres_to_litres(0.0), 0.0);
        assert_eq!(millilitres_to_litres(1999.0), 2.0);
        assert_eq!(millilitres_to_litres(1234.0), 1.23);
    }

    #[test]
    fn absent_totals_default_to_zero() {
        let summary = DaySummary {
            totals: [("calories".to_string(), 2100.0), ("protein".to_string(), 150.0)]
                .into_iter()
                .collect(),
            water: None,
        };
        let day = NutritionDay::from_summary(&summary);
        assert_eq!(day.water_ml, 0.0);
        assert_eq!(day.calories, 2100.0);
        assert_eq!(day.protein, 150.0);
        assert_eq!(day.carbs, 0.0);
        assert_eq!(day.fat, 0.0);
        assert_eq!(day.fiber, 0.0);
    }

    #[test]
    fn missing_weight_is_blank_and_failed_weight_is_unavailable() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let day = NutritionDay::from_summary(&DaySummary::default());

        let record = build_record(date, Some(day.clone()), Ok(None));
        assert_eq!(record.get(WEIGHT), Some(&Reading::Blank));

        let record = build_record(date, Some(day), Err(()));
        assert_eq!(record.get(WEIGHT), Some(&Reading::Unavailable));
    }

    #[test]
    fn failed_diary_marks_macros_unavailable() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let record = build_record(date, None, Ok(Some(81.2)));
        assert_eq!(record.entries.len(), 7);
        assert_eq!(record.get(CALORIES), Some(&Reading::Unavailable));
        assert_eq!(record.get(WATER), Some(&Reading::Unavailable));
        assert_eq!(record.get(WEIGHT), Some(&Reading::Number(81.2)));
    }
}
