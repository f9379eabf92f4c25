//! Spreadsheet parsing: workbook bytes → a grid of [`RawCell`]s.
//!
//! calamine sniffs the container format (xlsx, xlsm, xlsb, xls, ods) from the
//! bytes themselves, so uploads do not need a trustworthy file extension.
//! Only the first worksheet is read.
//!
//! Cells are addressed by their absolute position in the worksheet: a
//! calamine `Range` starts at the first non-empty cell, which would shift
//! every row offset if the template's banner rows happened to be blank.

use crate::error::Upc2PdfError;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;
use tracing::debug;

/// An untyped cell value as the spreadsheet stored it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    /// Missing, blank, or an error value such as `#N/A`.
    Empty,
    Integer(i64),
    Number(f64),
    Text(String),
}

impl RawCell {
    pub fn is_empty(&self) -> bool {
        matches!(self, RawCell::Empty)
    }
}

impl std::fmt::Display for RawCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawCell::Empty => Ok(()),
            RawCell::Integer(i) => write!(f, "{i}"),
            RawCell::Number(n) => write!(f, "{n}"),
            RawCell::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for RawCell {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            RawCell::Empty
        } else {
            RawCell::Text(s.to_string())
        }
    }
}

impl From<f64> for RawCell {
    fn from(n: f64) -> Self {
        RawCell::Number(n)
    }
}

impl From<i64> for RawCell {
    fn from(i: i64) -> Self {
        RawCell::Integer(i)
    }
}

impl From<&Data> for RawCell {
    fn from(cell: &Data) -> Self {
        match cell {
            Data::Empty | Data::Error(_) => RawCell::Empty,
            Data::String(s) if s.is_empty() => RawCell::Empty,
            Data::String(s) => RawCell::Text(s.clone()),
            Data::Int(i) => RawCell::Integer(*i),
            Data::Float(f) => RawCell::Number(*f),
            Data::Bool(b) => RawCell::Integer(i64::from(*b)),
            other => RawCell::Text(other.to_string()),
        }
    }
}

/// The first worksheet of a workbook, as rows of cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    /// Worksheet name, when parsed from a workbook.
    pub name: Option<String>,
    rows: Vec<Vec<RawCell>>,
}

impl Sheet {
    /// Build a sheet from literal rows. Row 0 is spreadsheet row 1.
    pub fn from_rows(rows: Vec<Vec<RawCell>>) -> Self {
        Self { name: None, rows }
    }

    /// Parse workbook bytes and read the first worksheet.
    ///
    /// `source_name` is only used in error messages.
    pub fn from_bytes(bytes: &[u8], source_name: &str) -> Result<Self, Upc2PdfError> {
        let unreadable = |detail: String| Upc2PdfError::UploadUnreadable {
            source_name: source_name.to_string(),
            detail,
        };

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
            .map_err(|e| unreadable(e.to_string()))?;

        let name = workbook.sheet_names().first().cloned();
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| unreadable("workbook has no worksheets".into()))?
            .map_err(|e| unreadable(e.to_string()))?;

        let rows = match range.end() {
            Some((last_row, last_col)) => (0..=last_row)
                .map(|r| {
                    (0..=last_col)
                        .map(|c| {
                            range
                                .get_value((r, c))
                                .map(RawCell::from)
                                .unwrap_or(RawCell::Empty)
                        })
                        .collect()
                })
                .collect(),
            None => Vec::new(),
        };

        let sheet = Sheet { name, rows };
        debug!(
            "Parsed worksheet {:?}: {} rows × {} columns",
            sheet.name,
            sheet.row_count(),
            sheet.width_from(0)
        );
        Ok(sheet)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Cells of a 0-based row; empty for rows past the end.
    pub fn row(&self, index: usize) -> &[RawCell] {
        self.rows.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Cell at a 0-based position; `Empty` outside the grid.
    pub fn cell(&self, row: usize, col: usize) -> &RawCell {
        static EMPTY: RawCell = RawCell::Empty;
        self.rows.get(row).and_then(|r| r.get(col)).unwrap_or(&EMPTY)
    }

    /// Number of columns that hold a value in any row from `first_row` on.
    pub fn width_from(&self, first_row: usize) -> usize {
        self.rows
            .iter()
            .skip(first_row)
            .filter_map(|r| r.iter().rposition(|c| !c.is_empty()))
            .map(|last| last + 1)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_are_unreadable() {
        let err = Sheet::from_bytes(b"definitely not a workbook", "upload.xlsx").unwrap_err();
        match err {
            Upc2PdfError::UploadUnreadable { source_name, .. } => {
                assert_eq!(source_name, "upload.xlsx")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_bytes_are_unreadable() {
        assert!(Sheet::from_bytes(&[], "empty.xlsx").is_err());
    }

    #[test]
    fn calamine_cells_map_to_raw_cells() {
        assert_eq!(RawCell::from(&Data::Empty), RawCell::Empty);
        assert_eq!(RawCell::from(&Data::String(String::new())), RawCell::Empty);
        assert_eq!(RawCell::from(&Data::Int(42)), RawCell::Integer(42));
        assert_eq!(RawCell::from(&Data::Float(1.5)), RawCell::Number(1.5));
        assert_eq!(RawCell::from(&Data::Bool(true)), RawCell::Integer(1));
        assert_eq!(
            RawCell::from(&Data::String("0614".into())),
            RawCell::Text("0614".into())
        );
    }

    #[test]
    fn width_ignores_trailing_blanks_and_banner() {
        let sheet = Sheet::from_rows(vec![
            vec!["banner".into(), "".into(), "".into(), "wide".into()],
            vec!["a".into(), "b".into(), RawCell::Empty],
        ]);
        assert_eq!(sheet.width_from(0), 4);
        assert_eq!(sheet.width_from(1), 2);
        assert_eq!(sheet.width_from(5), 0);
    }

    #[test]
    fn cell_outside_grid_is_empty() {
        let sheet = Sheet::from_rows(vec![vec![RawCell::Integer(1)]]);
        assert_eq!(sheet.cell(0, 0), &RawCell::Integer(1));
        assert!(sheet.cell(0, 7).is_empty());
        assert!(sheet.cell(9, 0).is_empty());
        assert!(sheet.row(3).is_empty());
    }
}
