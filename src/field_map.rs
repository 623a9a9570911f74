//! Static mapping from (day of week, source, metric) to a cell in a week tab.
//!
//! The document is loaded once per run:
//!
//! ```json
//! {
//!   "complete": "B2",
//!   "1": [{ "whoop": { "HRV": "C5" }, "mfp": { "calories": "C20" } }],
//!   "2": [{ "whoop": { "HRV": "D5" }, "mfp": { "calories": "D20" } }]
//! }
//! ```
//!
//! Source keys may be spelled `wearable`/`nutrition` or `whoop`/`mfp`.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::coord::Coord;
use crate::error::{MappingMiss, SyncError};

pub const DAYS_PER_WEEK: u8 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "wearable", alias = "whoop")]
    Wearable,
    #[serde(rename = "nutrition", alias = "mfp")]
    Nutrition,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Wearable => f.write_str("whoop"),
            Source::Nutrition => f.write_str("mfp"),
        }
    }
}

type MetricCoords = HashMap<String, Coord>;

#[derive(Debug, Deserialize)]
struct RawFieldMap {
    complete: Coord,
    #[serde(flatten)]
    days: HashMap<String, Vec<HashMap<Source, MetricCoords>>>,
}

#[derive(Debug, Clone)]
pub struct FieldMap {
    complete: Coord,
    days: BTreeMap<u8, HashMap<Source, MetricCoords>>,
}

impl FieldMap {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SyncError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SyncError::ConfigMissing(format!(
                "spreadsheet map not found at {}",
                path.display()
            )));
        }

        debug!("Loading spreadsheet map from: {}", path.display());
        let content = std::fs::read_to_string(path)?;
        let map = Self::from_json(&content)?;
        info!(
            "Loaded spreadsheet map: {} days, completion cell {}",
            map.days.len(),
            map.complete
        );
        Ok(map)
    }

    pub fn from_json(json: &str) -> Result<Self, SyncError> {
        let raw: RawFieldMap = serde_json::from_str(json)
            .map_err(|e| SyncError::Config(format!("spreadsheet map: {e}")))?;

        let mut days = BTreeMap::new();
        for (key, entries) in raw.days {
            let day = key
                .parse::<u8>()
                .ok()
                .filter(|d| (1..=DAYS_PER_WEEK).contains(d))
                .ok_or_else(|| {
                    SyncError::Config(format!("spreadsheet map: '{key}' is not a day 1-7"))
                })?;

            let mut merged: HashMap<Source, MetricCoords> = HashMap::new();
            for entry in entries {
                for (source, coords) in entry {
                    merged.entry(source).or_default().extend(coords);
                }
            }
            days.insert(day, merged);
        }

        Ok(Self {
            complete: raw.complete,
            days,
        })
    }

    /// The cell that reads `"Y"` once a week tab is finished.
    pub fn complete(&self) -> Coord {
        self.complete
    }

    pub fn lookup(&self, day: u8, source: Source, metric: &str) -> Result<Coord, MappingMiss> {
        self.days
            .get(&day)
            .and_then(|sources| sources.get(&source))
            .and_then(|coords| coords.get(metric))
            .copied()
            .ok_or_else(|| MappingMiss {
                day,
                service: source,
                metric: metric.to_string(),
            })
    }
}
