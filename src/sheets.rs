use async_trait::async_trait;
use google_sheets4::api::{BatchUpdateValuesRequest, ValueRange};
use google_sheets4::{hyper, hyper_rustls, Sheets};
use regex::Regex;
use tracing::{debug, info};

use crate::coord::Coord;
use crate::error::SyncError;
use crate::metric::CellAssignment;

pub type SheetsHub = Sheets<hyper_rustls::HttpsConnector<hyper::client::HttpConnector>>;

/// A resolved week tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub title: String,
}

impl Tab {
    /// `'Week 1'!C27`
    pub fn range(&self, coord: Coord) -> String {
        format!("'{}'!{}", self.title.replace('\'', "''"), coord.to_a1())
    }
}

#[async_trait]
pub trait Spreadsheet: Send + Sync {
    /// `None` when the spreadsheet has no tab with that title.
    async fn open_tab(&self, title: &str) -> Result<Option<Tab>, SyncError>;

    /// Formatted value of a cell, empty when the cell is empty.
    async fn read_cell(&self, tab: &Tab, coord: Coord) -> Result<String, SyncError>;

    async fn bulk_write(&self, tab: &Tab, cells: &[CellAssignment]) -> Result<(), SyncError>;
}

/// Accepts a full spreadsheet URL or a bare id.
pub fn spreadsheet_id(url_or_id: &str) -> Result<String, SyncError> {
    let re = Regex::new(r"/spreadsheets/d/([a-zA-Z0-9_-]+)")
        .map_err(|e| SyncError::Config(e.to_string()))?;
    let trimmed = url_or_id.trim();
    if let Some(captures) = re.captures(trimmed) {
        return Ok(captures[1].to_string());
    }
    if trimmed.is_empty() || trimmed.contains('/') {
        return Err(SyncError::Config(format!(
            "'{url_or_id}' is not a spreadsheet url or id"
        )));
    }
    Ok(trimmed.to_string())
}

pub struct GoogleSheet {
    hub: SheetsHub,
    spreadsheet_id: String,
}

impl GoogleSheet {
    pub fn new(hub: SheetsHub, spreadsheet_id: impl Into<String>) -> Self {
        Self {
            hub,
            spreadsheet_id: spreadsheet_id.into(),
        }
    }
}

fn sheet_error(e: impl std::fmt::Display) -> SyncError {
    SyncError::Sheet(e.to_string())
}

#[async_trait]
impl Spreadsheet for GoogleSheet {
    async fn open_tab(&self, title: &str) -> Result<Option<Tab>, SyncError> {
        debug!("Looking up tab '{}' in {}", title, self.spreadsheet_id);
        let (_, spreadsheet) = self
            .hub
            .spreadsheets()
            .get(&self.spreadsheet_id)
            .doit()
            .await
            .map_err(sheet_error)?;

        let found = spreadsheet.sheets.unwrap_or_default().into_iter().any(|s| {
            s.properties
                .and_then(|p| p.title)
                .is_some_and(|t| t == title)
        });
        Ok(found.then(|| Tab {
            title: title.to_string(),
        }))
    }

    async fn read_cell(&self, tab: &Tab, coord: Coord) -> Result<String, SyncError> {
        let range = tab.range(coord);
        let (_, value_range) = self
            .hub
            .spreadsheets()
            .values_get(&self.spreadsheet_id, &range)
            .value_render_option("FORMATTED_VALUE")
            .doit()
            .await
            .map_err(sheet_error)?;

        let value = value_range
            .values
            .and_then(|rows| rows.into_iter().next())
            .and_then(|row| row.into_iter().next())
            .map(|v| match v {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .unwrap_or_default();
        debug!("{} = '{}'", range, value);
        Ok(value)
    }

    async fn bulk_write(&self, tab: &Tab, cells: &[CellAssignment]) -> Result<(), SyncError> {
        let data = cells
            .iter()
            .map(|cell| ValueRange {
                range: Some(tab.range(cell.coord)),
                values: Some(vec![vec![cell.value.to_json()]]),
                ..Default::default()
            })
            .collect();
        let req = BatchUpdateValuesRequest {
            data: Some(data),
            value_input_option: Some("USER_ENTERED".to_string()),
            ..Default::default()
        };

        self.hub
            .spreadsheets()
            .values_batch_update(req, &self.spreadsheet_id)
            .doit()
            .await
            .map_err(sheet_error)?;
        info!("Wrote {} cells to '{}'", cells.len(), tab.title);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_id_from_url() {
        let id = spreadsheet_id(
            "https://docs.google.com/spreadsheets/d/1AbC-dEf_123/edit#gid=0",
        )
        .unwrap();
        assert_eq!(id, "1AbC-dEf_123");
        assert_eq!(spreadsheet_id("1AbC-dEf_123").unwrap(), "1AbC-dEf_123");
        assert!(spreadsheet_id("https://example.com/other").is_err());
        assert!(spreadsheet_id("  ").is_err());
    }

    #[test]
    fn ranges_quote_the_tab_title() {
        let tab = Tab {
            title: "Week 3".into(),
        };
        assert_eq!(tab.range(Coord::new(27, 3)), "'Week 3'!C27");
        let tab = Tab {
            title: "Bob's Week".into(),
        };
        assert_eq!(tab.range(Coord::new(1, 1)), "'Bob''s Week'!A1");
    }
}
