//! The row store abstraction the gateway talks to.
//!
//! A [`SheetStore`] performs exactly one remote operation per call. Append and
//! update return the backend's response body verbatim so the HTTP layer can
//! echo it back to the caller.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SheetsError;
use crate::range::A1Range;

/// An ordered list of cell values. Position is significant.
pub type Row = Vec<Value>;

/// Row-oriented access to one spreadsheet.
///
/// Implementations must be thread-safe (`Send + Sync`); the server shares a
/// single instance across all requests.
#[async_trait]
pub trait SheetStore: Send + Sync + fmt::Debug {
    /// Short backend identifier used in logs and the service info endpoint.
    fn backend_name(&self) -> &'static str;

    /// Whether the backend initialized successfully.
    fn is_available(&self) -> bool {
        true
    }

    /// Appends `rows` after the last row of the table found in `range`.
    ///
    /// # Errors
    ///
    /// Returns `SheetsError::Api` when the backend rejects the write, or a
    /// transport/authentication error when the call could not be made.
    async fn append_rows(&self, range: &A1Range, rows: &[Row]) -> Result<Value, SheetsError>;

    /// Reads every row inside `range`. An empty range yields an empty vector.
    async fn read_rows(&self, range: &A1Range) -> Result<Vec<Row>, SheetsError>;

    /// Overwrites the cells addressed by `range` with `rows`.
    async fn update_rows(&self, range: &A1Range, rows: &[Row]) -> Result<Value, SheetsError>;
}

/// Wire shape of a Sheets `ValueRange`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_dimension: Option<String>,
    /// Absent on the wire when the range holds no data.
    #[serde(default)]
    pub values: Vec<Row>,
}

/// Stand-in used when the real backend failed to initialize.
///
/// Every operation fails with [`SheetsError::Unavailable`] carrying the
/// startup failure.
#[derive(Debug, Clone)]
pub struct UnavailableStore {
    reason: String,
}

impl UnavailableStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

#[async_trait]
impl SheetStore for UnavailableStore {
    fn backend_name(&self) -> &'static str {
        "unavailable"
    }

    fn is_available(&self) -> bool {
        false
    }

    async fn append_rows(&self, _range: &A1Range, _rows: &[Row]) -> Result<Value, SheetsError> {
        Err(SheetsError::unavailable(&self.reason))
    }

    async fn read_rows(&self, _range: &A1Range) -> Result<Vec<Row>, SheetsError> {
        Err(SheetsError::unavailable(&self.reason))
    }

    async fn update_rows(&self, _range: &A1Range, _rows: &[Row]) -> Result<Value, SheetsError> {
        Err(SheetsError::unavailable(&self.reason))
    }
}
