use chrono::NaiveDate;

use crate::coord::Coord;
use crate::field_map::Source;
use crate::mfp;

/// One normalised metric value, before it is rendered for the sheet.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    Number(f64),
    Whole(i64),
    Text(String),
    /// Legitimately empty, written as an empty cell.
    Blank,
    /// Could not be computed from the source.
    Unavailable,
}

impl Reading {
    pub fn from_option<T>(value: Option<T>, f: impl FnOnce(T) -> Reading) -> Reading {
        value.map(f).unwrap_or(Reading::Unavailable)
    }
}

/// All metrics for one (date, source) pair, in the order the source produced them.
#[derive(Debug, Clone)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub source: Source,
    pub entries: Vec<(&'static str, Reading)>,
}

impl DailyRecord {
    pub fn new(date: NaiveDate, source: Source) -> Self {
        Self {
            date,
            source,
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, metric: &'static str, reading: Reading) {
        self.entries.push((metric, reading));
    }

    pub fn get(&self, metric: &str) -> Option<&Reading> {
        self.entries
            .iter()
            .find(|(name, _)| *name == metric)
            .map(|(_, reading)| reading)
    }
}

/// Scalar written into a single cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Whole(i64),
    Text(String),
}

impl CellValue {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CellValue::Number(n) => serde_json::json!(n),
            CellValue::Whole(n) => serde_json::json!(n),
            CellValue::Text(s) => serde_json::json!(s),
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Whole(n) => write!(f, "{n}"),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

pub const WHOOP_UNAVAILABLE: &str = "N/A - Whoop Error";
pub const MFP_UNAVAILABLE: &str = "N/A - MyFitnessPal Error";

pub fn unavailable_marker(source: Source) -> &'static str {
    match source {
        Source::Wearable => WHOOP_UNAVAILABLE,
        Source::Nutrition => MFP_UNAVAILABLE,
    }
}

/// Renders a reading for the sheet. Unit conversions happen here and nowhere earlier.
pub fn render(source: Source, metric: &str, reading: &Reading) -> CellValue {
    match reading {
        Reading::Number(ml) if source == Source::Nutrition && metric == mfp::normalize::WATER => {
            CellValue::Number(mfp::normalize::millilitres_to_litres(*ml))
        }
        Reading::Number(n) => CellValue::Number(*n),
        Reading::Whole(n) => CellValue::Whole(*n),
        Reading::Text(s) => CellValue::Text(s.clone()),
        Reading::Blank => CellValue::Text(String::new()),
        Reading::Unavailable => CellValue::Text(unavailable_marker(source).to_string()),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellAssignment {
    pub coord: Coord,
    pub value: CellValue,
}

/// Cell writes collected for one week tab, flushed in a single bulk write.
#[derive(Debug, Default)]
pub struct WeekBatch {
    cells: Vec<CellAssignment>,
}

impl WeekBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, coord: Coord, value: CellValue) {
        self.cells.push(CellAssignment { coord, value });
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[CellAssignment] {
        &self.cells
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn water_is_converted_to_litres_at_render_time() {
        let cell = render(Source::Nutrition, "water", &Reading::Number(2500.0));
        assert_eq!(cell, CellValue::Number(2.5));
        let cell = render(Source::Nutrition, "water", &Reading::Number(0.0));
        assert_eq!(cell, CellValue::Number(0.0));
        let cell = render(Source::Nutrition, "water", &Reading::Number(1234.0));
        assert_eq!(cell, CellValue::Number(1.23));
    }

    #[test]
    fn other_numbers_pass_through() {
        let cell = render(Source::Nutrition, "calories", &Reading::Number(2500.0));
        assert_eq!(cell, CellValue::Number(2500.0));
        let cell = render(Source::Wearable, "water", &Reading::Number(2500.0));
        assert_eq!(cell, CellValue::Number(2500.0));
    }

    #[test]
    fn blank_and_unavailable_render_differently() {
        assert_eq!(
            render(Source::Nutrition, "weight", &Reading::Blank),
            CellValue::Text(String::new())
        );
        assert_eq!(
            render(Source::Wearable, "HRV", &Reading::Unavailable),
            CellValue::Text("N/A - Whoop Error".into())
        );
        assert_eq!(
            render(Source::Nutrition, "calories", &Reading::Unavailable),
            CellValue::Text("N/A - MyFitnessPal Error".into())
        );
    }

    #[test]
    fn cell_values_serialise_as_scalars() {
        assert_eq!(CellValue::Whole(67).to_json(), serde_json::json!(67));
        assert_eq!(CellValue::Number(12.4).to_json(), serde_json::json!(12.4));
        assert_eq!(CellValue::Text("07:45".into()).to_json(), serde_json::json!("07:45"));
    }
}
