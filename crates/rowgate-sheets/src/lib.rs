//! # RowGate Sheets
//!
//! Row-oriented access to a remote spreadsheet.
//!
//! - [`SheetStore`]: the async seam the HTTP gateway depends on
//! - [`GoogleSheetsStore`]: Google Sheets API v4 over REST, authenticated with
//!   a service account key
//! - [`InMemorySheetStore`]: local backend with the same range semantics
//! - [`UnavailableStore`]: placeholder for a backend that failed to start

pub mod auth;
pub mod client;
pub mod credentials;
pub mod error;
pub mod memory;
pub mod range;
pub mod store;

pub use auth::{SPREADSHEETS_SCOPE, TokenProvider};
pub use client::{DEFAULT_API_BASE_URL, GoogleSheetsStore, GoogleSheetsStoreBuilder};
pub use credentials::{DEFAULT_TOKEN_URI, ServiceAccountKey};
pub use error::SheetsError;
pub use memory::{DEFAULT_GRID_ROWS, InMemorySheetStore};
pub use range::{A1Range, CellRef, Column};
pub use store::{Row, SheetStore, UnavailableStore, ValueRange};
