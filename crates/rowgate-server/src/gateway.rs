//! Request-to-row translation.
//!
//! Each operation picks a range, shapes the JSON payload into rows and issues
//! exactly one call on the injected [`SheetStore`]. Payload fields are not
//! schema-checked beyond what is needed to build rows: missing `name` or
//! `email` become `null` cells and are forwarded as-is.

use std::sync::Arc;

use rowgate_sheets::{A1Range, Column, Row, SheetStore, SheetsError};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::GatewayError;

/// Stateless translator between HTTP payloads and a [`SheetStore`].
#[derive(Debug, Clone)]
pub struct RowGateway {
    store: Arc<dyn SheetStore>,
    default_sheet: String,
}

impl RowGateway {
    pub fn new(store: Arc<dyn SheetStore>, default_sheet: impl Into<String>) -> Self {
        Self {
            store,
            default_sheet: default_sheet.into(),
        }
    }

    pub fn store(&self) -> &Arc<dyn SheetStore> {
        &self.store
    }

    pub fn default_sheet(&self) -> &str {
        &self.default_sheet
    }

    /// Appends `[name, email]` to the fixed `A1:B1` range of the default sheet.
    #[instrument(skip_all, fields(sheet = %self.default_sheet))]
    pub async fn submit_contact(&self, payload: &Value) -> Result<Value, GatewayError> {
        let fields = payload.as_object().ok_or_else(|| {
            SheetsError::invalid_input(format!(
                "request body must be a JSON object, got {}",
                json_kind(payload)
            ))
        })?;
        let row: Row = ["name", "email"]
            .iter()
            .map(|key| fields.get(*key).cloned().unwrap_or(Value::Null))
            .collect();

        let range = A1Range::row_span(&self.default_sheet, 1, Column::A, Column::B)?;
        let result = self.store.append_rows(&range, &[row]).await?;
        debug!(range = %range, "Contact submitted");
        Ok(result)
    }

    /// Appends the payload's row(s) to `{sheet}!A1:Z1`.
    #[instrument(skip_all, fields(sheet = %sheet))]
    pub async fn append_rows(&self, sheet: &str, payload: &Value) -> Result<Value, GatewayError> {
        let rows = rows_from_payload(payload)?;
        let range = A1Range::row_span(sheet, 1, Column::A, Column::Z)?;
        let result = self.store.append_rows(&range, &rows).await?;
        debug!(range = %range, rows = rows.len(), "Rows appended");
        Ok(result)
    }

    /// Reads `{sheet}!A1:Z`, falling back to the default sheet.
    #[instrument(skip_all, fields(sheet = ?sheet))]
    pub async fn read_rows(&self, sheet: Option<&str>) -> Result<Vec<Row>, GatewayError> {
        let sheet = sheet.unwrap_or(&self.default_sheet);
        let range = A1Range::open_rows(sheet, 1, Column::A, Column::Z)?;
        let rows = self.store.read_rows(&range).await?;
        debug!(range = %range, rows = rows.len(), "Rows read");
        Ok(rows)
    }

    /// Overwrites row `index + 1`.
    ///
    /// `updatedData` is either the row's cells or a one-element array holding
    /// them, the `values` shape the Sheets API itself uses.
    ///
    /// A named sheet is written across `A:Z`; the default sheet keeps the
    /// two-column `A:B` layout of the contact form.
    #[instrument(skip_all, fields(sheet = ?sheet))]
    pub async fn update_row(
        &self,
        sheet: Option<&str>,
        payload: &Value,
    ) -> Result<Value, GatewayError> {
        let request = UpdateRequest::from_payload(payload)?;
        let (sheet, last_column) = match sheet {
            Some(name) => (name, Column::Z),
            None => (self.default_sheet.as_str(), Column::B),
        };
        let row_number = request.row_number()?;
        let range = A1Range::row_span(sheet, row_number, Column::A, last_column)?;
        let result = self.store.update_rows(&range, &request.rows).await?;
        debug!(range = %range, "Row updated");
        Ok(result)
    }
}

/// `{index, updatedData}` body of the update endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRequest {
    /// 0-based position of the row, the sheet row is `index + 1`.
    pub index: u64,
    pub rows: Vec<Row>,
}

impl UpdateRequest {
    pub fn from_payload(payload: &Value) -> Result<Self, SheetsError> {
        let index = match payload.get("index") {
            None | Some(Value::Null) => {
                return Err(SheetsError::invalid_input("index is required"));
            }
            Some(value) => value.as_u64().ok_or_else(|| {
                SheetsError::invalid_input(format!(
                    "index must be a non-negative integer, got {value}"
                ))
            })?,
        };
        let rows = match payload.get("updatedData") {
            Some(data @ Value::Array(_)) => rows_from_payload(data)?,
            Some(other) => {
                return Err(SheetsError::invalid_input(format!(
                    "updatedData must be an array of cell values, got {}",
                    json_kind(other)
                )));
            }
            None => return Err(SheetsError::invalid_input("updatedData is required")),
        };
        Ok(Self { index, rows })
    }

    /// The 1-based sheet row addressed by `index`.
    pub fn row_number(&self) -> Result<u32, SheetsError> {
        self.index
            .checked_add(1)
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| {
                SheetsError::invalid_input(format!("index {} is out of range", self.index))
            })
    }
}

/// Turns an append payload into rows.
///
/// An array of arrays is several rows; any other array is one row.
pub fn rows_from_payload(payload: &Value) -> Result<Vec<Row>, SheetsError> {
    match payload {
        Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_array) => Ok(items
            .iter()
            .filter_map(|item| item.as_array().cloned())
            .collect()),
        Value::Array(cells) => Ok(vec![cells.clone()]),
        other => Err(SheetsError::invalid_input(format!(
            "row payload must be a JSON array, got {}",
            json_kind(other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
