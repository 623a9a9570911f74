use async_trait::async_trait;
use csv::Writer;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::coord::Coord;
use crate::error::SyncError;
use crate::metric::CellAssignment;
use crate::sheets::{Spreadsheet, Tab};

const HEADERS: [&str; 3] = ["tab", "cell", "value"];

pub fn append(
    csv_path: &Path,
    tab: &str,
    cells: &[CellAssignment],
    ensure_directories: bool,
) -> Result<(), SyncError> {
    info!("Appending {} cells to CSV file: {}", cells.len(), csv_path.display());

    if cells.is_empty() {
        debug!("No cells to append, skipping");
        return Ok(());
    }

    if ensure_directories {
        if let Some(parent) = csv_path.parent() {
            std::fs::create_dir_all(parent)?;
            debug!("Created directory: {:?}", parent);
        }
    }

    let needs_header = !csv_path.exists();
    let file = OpenOptions::new().create(true).append(true).open(csv_path)?;
    let mut writer = Writer::from_writer(file);
    let csv_err = |e: csv::Error| SyncError::Io(e.into());

    if needs_header {
        info!("Writing CSV header to new file");
        writer.write_record(HEADERS).map_err(csv_err)?;
    }

    for cell in cells {
        writer
            .write_record([tab.to_string(), cell.coord.to_a1(), cell.value.to_string()])
            .map_err(csv_err)?;
    }

    writer.flush()?;
    Ok(())
}

/// Dry-run wrapper: reads go to the real spreadsheet, writes land in a CSV file.
pub struct CsvMirror<S> {
    inner: S,
    path: PathBuf,
    ensure: bool,
}

impl<S: Spreadsheet> CsvMirror<S> {
    pub fn new(inner: S, path: impl Into<PathBuf>, ensure: bool) -> Self {
        Self {
            inner,
            path: path.into(),
            ensure,
        }
    }
}

#[async_trait]
impl<S: Spreadsheet> Spreadsheet for CsvMirror<S> {
    async fn open_tab(&self, title: &str) -> Result<Option<Tab>, SyncError> {
        self.inner.open_tab(title).await
    }

    async fn read_cell(&self, tab: &Tab, coord: Coord) -> Result<String, SyncError> {
        self.inner.read_cell(tab, coord).await
    }

    async fn bulk_write(&self, tab: &Tab, cells: &[CellAssignment]) -> Result<(), SyncError> {
        append(&self.path, &tab.title, cells, self.ensure)
    }
}
