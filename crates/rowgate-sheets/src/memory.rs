//! In-memory spreadsheet backend.
//!
//! Mirrors the Sheets API semantics the gateway relies on:
//! - append writes after the last non-empty row of the sheet
//! - reads are bounded by the range and omit trailing empty rows
//! - updates overwrite only the addressed cells and fail past the grid
//!
//! Sheets must exist before they are addressed, as with the real service.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::RwLock;

use crate::error::SheetsError;
use crate::range::{A1Range, CellRef, Column};
use crate::store::{Row, SheetStore};

const MEMORY_SPREADSHEET_ID: &str = "memory";

/// Row count of a freshly created Google sheet.
pub const DEFAULT_GRID_ROWS: u32 = 1000;

/// Process-local [`SheetStore`] used for development and tests.
#[derive(Debug)]
pub struct InMemorySheetStore {
    sheets: RwLock<HashMap<String, Vec<Row>>>,
    grid_rows: u32,
}

impl InMemorySheetStore {
    /// Creates a store holding one empty sheet named `Sheet1`.
    pub fn new() -> Self {
        Self::with_sheets(["Sheet1"])
    }

    /// Creates a store with the given empty sheets.
    pub fn with_sheets<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sheets = names
            .into_iter()
            .map(|name| (name.into(), Vec::new()))
            .collect();
        Self {
            sheets: RwLock::new(sheets),
            grid_rows: DEFAULT_GRID_ROWS,
        }
    }

    /// Sets how many rows an update may address. Appends grow the grid
    /// past this, updates cannot.
    #[must_use]
    pub fn with_grid_rows(mut self, rows: u32) -> Self {
        self.grid_rows = rows;
        self
    }

    /// Adds an empty sheet. Existing sheets are left untouched.
    pub async fn add_sheet(&self, name: impl Into<String>) {
        self.sheets.write().await.entry(name.into()).or_default();
    }

    /// Returns a copy of every stored row of `sheet`.
    pub async fn snapshot(&self, sheet: &str) -> Option<Vec<Row>> {
        self.sheets.read().await.get(sheet).cloned()
    }

    fn unknown_sheet(range: &A1Range) -> SheetsError {
        SheetsError::api(400, format!("Unable to parse range: {range}"))
    }
}

impl Default for InMemorySheetStore {
    fn default() -> Self {
        Self::new()
    }
}

fn is_empty_row(row: &Row) -> bool {
    row.iter().all(|cell| match cell {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    })
}

/// Writes `values` into `row` starting at `column`, leaving other cells alone.
fn write_cells(row: &mut Row, column: Column, values: &[Value]) {
    let offset = (column.index() - 1) as usize;
    let needed = offset + values.len();
    if row.len() < needed {
        row.resize(needed, Value::Null);
    }
    row[offset..needed].clone_from_slice(values);
}

fn written_range(sheet: &A1Range, first_row: u32, rows: &[Row]) -> String {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0) as u32;
    let start = sheet.start().column;
    let last_row = first_row + rows.len().saturating_sub(1) as u32;
    let end = Column::new(start.index() + width.saturating_sub(1)).unwrap_or(start);
    let quoted = A1Range::new(
        sheet.sheet(),
        CellRef::new(start, first_row),
        Some(CellRef::new(end, last_row)),
    );
    match quoted {
        Ok(range) => range.to_string(),
        Err(_) => sheet.to_string(),
    }
}

fn cell_count(rows: &[Row]) -> usize {
    rows.iter().map(Vec::len).sum()
}

#[async_trait]
impl SheetStore for InMemorySheetStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn append_rows(&self, range: &A1Range, rows: &[Row]) -> Result<Value, SheetsError> {
        let mut sheets = self.sheets.write().await;
        let data = sheets
            .get_mut(range.sheet())
            .ok_or_else(|| Self::unknown_sheet(range))?;

        while data.last().is_some_and(is_empty_row) {
            data.pop();
        }
        let first_row = data.len() as u32 + 1;
        let column = range.start().column;
        for values in rows {
            let mut row = Row::new();
            write_cells(&mut row, column, values);
            data.push(row);
        }

        Ok(json!({
            "spreadsheetId": MEMORY_SPREADSHEET_ID,
            "tableRange": range.to_string(),
            "updates": {
                "spreadsheetId": MEMORY_SPREADSHEET_ID,
                "updatedRange": written_range(range, first_row, rows),
                "updatedRows": rows.len(),
                "updatedColumns": rows.iter().map(Vec::len).max().unwrap_or(0),
                "updatedCells": cell_count(rows),
            }
        }))
    }

    async fn read_rows(&self, range: &A1Range) -> Result<Vec<Row>, SheetsError> {
        let sheets = self.sheets.read().await;
        let data = sheets
            .get(range.sheet())
            .ok_or_else(|| Self::unknown_sheet(range))?;

        let first = range.start().row.unwrap_or(1) as usize - 1;
        let last = match range.end().and_then(|end| end.row) {
            Some(row) => (row as usize).min(data.len()),
            None => data.len(),
        };
        let first_col = (range.start().column.index() - 1) as usize;
        let last_col = range.end().map(|end| end.column.index() as usize);

        let mut rows: Vec<Row> = data
            .get(first..last)
            .unwrap_or_default()
            .iter()
            .map(|row| {
                let end = last_col.map_or(row.len(), |c| c.min(row.len()));
                row.get(first_col..end).map(<[Value]>::to_vec).unwrap_or_default()
            })
            .collect();
        while rows.last().is_some_and(is_empty_row) {
            rows.pop();
        }
        Ok(rows)
    }

    async fn update_rows(&self, range: &A1Range, rows: &[Row]) -> Result<Value, SheetsError> {
        let start_row = range.start().row.ok_or_else(|| {
            SheetsError::invalid_range(format!("update range {range} has no start row"))
        })?;
        if let Some(width) = range.width() {
            if let Some(wide) = rows.iter().find(|row| row.len() as u32 > width) {
                return Err(SheetsError::api(
                    400,
                    format!(
                        "Requested writing within range [{range}], but tried writing {} columns",
                        wide.len()
                    ),
                ));
            }
        }
        if let Some(height) = range.height() {
            if rows.len() as u32 > height {
                return Err(SheetsError::api(
                    400,
                    format!(
                        "Requested writing within range [{range}], but tried writing {} rows",
                        rows.len()
                    ),
                ));
            }
        }

        let mut sheets = self.sheets.write().await;
        let data = sheets
            .get_mut(range.sheet())
            .ok_or_else(|| Self::unknown_sheet(range))?;

        let first = (start_row - 1) as usize;
        let grid_rows = data.len().max(self.grid_rows as usize);
        if first + rows.len() > grid_rows {
            return Err(SheetsError::api(
                400,
                format!("Range ({range}) exceeds grid limits. Max rows: {grid_rows}"),
            ));
        }
        if data.len() < first + rows.len() {
            data.resize(first + rows.len(), Row::new());
        }
        let column = range.start().column;
        for (offset, values) in rows.iter().enumerate() {
            write_cells(&mut data[first + offset], column, values);
        }

        Ok(json!({
            "spreadsheetId": MEMORY_SPREADSHEET_ID,
            "updatedRange": written_range(range, start_row, rows),
            "updatedRows": rows.len(),
            "updatedColumns": rows.iter().map(Vec::len).max().unwrap_or(0),
            "updatedCells": cell_count(rows),
        }))
    }
}
