//! A1-notation ranges.
//!
//! Ranges are built from typed parts and rendered with [`std::fmt::Display`],
//! so the gateway never assembles range strings by hand.
//!
//! ```ignore
//! use rowgate_sheets::range::{A1Range, Column};
//!
//! let range = A1Range::row_span("Sheet1", 3, Column::A, Column::Z)?;
//! assert_eq!(range.to_string(), "Sheet1!A3:Z3");
//! ```

use std::fmt;

use crate::error::SheetsError;

/// A 1-based spreadsheet column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Column(u32);

impl Column {
    pub const A: Column = Column(1);
    pub const B: Column = Column(2);
    pub const Z: Column = Column(26);

    /// Creates a column from its 1-based index.
    pub fn new(index: u32) -> Result<Self, SheetsError> {
        if index == 0 {
            return Err(SheetsError::invalid_range("column index must be >= 1"));
        }
        Ok(Self(index))
    }

    /// Parses column letters such as `A`, `Z` or `AA`.
    pub fn from_letters(letters: &str) -> Result<Self, SheetsError> {
        if letters.is_empty() {
            return Err(SheetsError::invalid_range("empty column letters"));
        }
        let mut index: u32 = 0;
        for ch in letters.chars() {
            if !ch.is_ascii_alphabetic() {
                return Err(SheetsError::invalid_range(format!(
                    "invalid column letters '{letters}'"
                )));
            }
            let digit = (ch.to_ascii_uppercase() as u32) - ('A' as u32) + 1;
            index = index
                .checked_mul(26)
                .and_then(|v| v.checked_add(digit))
                .ok_or_else(|| {
                    SheetsError::invalid_range(format!("column '{letters}' out of range"))
                })?;
        }
        Ok(Self(index))
    }

    /// Returns the 1-based column index.
    pub fn index(self) -> u32 {
        self.0
    }

    /// Returns the column letters (`1 -> A`, `27 -> AA`).
    pub fn letters(self) -> String {
        let mut n = self.0;
        let mut out = Vec::new();
        while n > 0 {
            let rem = (n - 1) % 26;
            out.push(b'A' + rem as u8);
            n = (n - 1) / 26;
        }
        out.reverse();
        String::from_utf8(out).unwrap_or_default()
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.letters())
    }
}

/// A cell reference. A missing row makes the reference open-ended (`A1:Z`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    pub column: Column,
    pub row: Option<u32>,
}

impl CellRef {
    pub fn new(column: Column, row: u32) -> Self {
        Self {
            column,
            row: Some(row),
        }
    }

    pub fn column_only(column: Column) -> Self {
        Self { column, row: None }
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row {
            Some(row) => write!(f, "{}{}", self.column, row),
            None => write!(f, "{}", self.column),
        }
    }
}

/// A range inside a named sheet, e.g. `Sheet1!A1:B1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct A1Range {
    sheet: String,
    start: CellRef,
    end: Option<CellRef>,
}

impl A1Range {
    /// Creates a range after checking that it addresses at least one cell.
    pub fn new(
        sheet: impl Into<String>,
        start: CellRef,
        end: Option<CellRef>,
    ) -> Result<Self, SheetsError> {
        let sheet = sheet.into();
        if sheet.trim().is_empty() {
            return Err(SheetsError::invalid_range("sheet name must not be empty"));
        }
        if start.row == Some(0) || end.and_then(|e| e.row) == Some(0) {
            return Err(SheetsError::invalid_range("row numbers are 1-based"));
        }
        if let Some(end) = end {
            if end.column < start.column {
                return Err(SheetsError::invalid_range(format!(
                    "end column {} precedes start column {}",
                    end.column, start.column
                )));
            }
            if let (Some(s), Some(e)) = (start.row, end.row) {
                if e < s {
                    return Err(SheetsError::invalid_range(format!(
                        "end row {e} precedes start row {s}"
                    )));
                }
            }
        }
        Ok(Self { sheet, start, end })
    }

    /// A single row spanning `first..=last` columns, e.g. `Sheet1!A4:Z4`.
    pub fn row_span(
        sheet: impl Into<String>,
        row: u32,
        first: Column,
        last: Column,
    ) -> Result<Self, SheetsError> {
        Self::new(
            sheet,
            CellRef::new(first, row),
            Some(CellRef::new(last, row)),
        )
    }

    /// Every row from `first_row` down, e.g. `Sheet1!A1:Z`.
    pub fn open_rows(
        sheet: impl Into<String>,
        first_row: u32,
        first: Column,
        last: Column,
    ) -> Result<Self, SheetsError> {
        Self::new(
            sheet,
            CellRef::new(first, first_row),
            Some(CellRef::column_only(last)),
        )
    }

    /// The unquoted sheet name.
    pub fn sheet(&self) -> &str {
        self.sheet
            .strip_prefix('\'')
            .and_then(|s| s.strip_suffix('\''))
            .unwrap_or(&self.sheet)
    }

    pub fn start(&self) -> CellRef {
        self.start
    }

    pub fn end(&self) -> Option<CellRef> {
        self.end
    }

    /// Number of columns covered, or `None` when the range has no end cell.
    pub fn width(&self) -> Option<u32> {
        self.end
            .map(|end| end.column.index() - self.start.column.index() + 1)
    }

    /// Number of rows covered, or `None` when the range is open-ended.
    pub fn height(&self) -> Option<u32> {
        match (self.start.row, self.end) {
            (Some(start), Some(CellRef { row: Some(end), .. })) => Some(end - start + 1),
            (Some(_), None) => Some(1),
            _ => None,
        }
    }

    fn quoted_sheet(&self) -> String {
        let already_quoted = self.sheet.len() >= 2
            && self.sheet.starts_with('\'')
            && self.sheet.ends_with('\'');
        if already_quoted || is_plain_sheet_name(&self.sheet) {
            self.sheet.clone()
        } else {
            format!("'{}'", self.sheet.replace('\'', "''"))
        }
    }
}

/// Whether `name` can appear unquoted before `!`.
///
/// Names that start with a digit or read as a cell reference (`Q1`, `AB12`,
/// `R1C1`) must be quoted.
fn is_plain_sheet_name(name: &str) -> bool {
    name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && !looks_like_a1_cell(name)
        && !looks_like_r1c1_cell(name)
}

fn looks_like_a1_cell(name: &str) -> bool {
    let letters = name.chars().take_while(char::is_ascii_alphabetic).count();
    let digits = &name[letters..];
    (1..=3).contains(&letters) && !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn looks_like_r1c1_cell(name: &str) -> bool {
    let upper = name.to_ascii_uppercase();
    let Some(rest) = upper.strip_prefix('R') else {
        return false;
    };
    match rest.split_once('C') {
        Some((row, col)) => {
            row.chars().all(|c| c.is_ascii_digit()) && col.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

impl fmt::Display for A1Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}", self.quoted_sheet(), self.start)?;
        if let Some(end) = self.end {
            write!(f, ":{end}")?;
        }
        Ok(())
    }
}
