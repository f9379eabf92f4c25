//! Row extraction: pull the identifier column out of a parsed [`Sheet`].
//!
//! Sheet layout assumed by the extractor:
//!
//! ```text
//! row 1 .. header_rows       banner, ignored
//! row header_rows + 1        header row (column labels, may be blank)
//! row header_rows + 2 ..     data
//! ```
//!
//! Rows whose identifier cell is missing entirely are dropped here. Rows with
//! a present but unusable value are kept so the normaliser can classify and
//! report them; one bad row never aborts the run.

use crate::config::ColumnSelector;
use crate::error::Upc2PdfError;
use crate::pipeline::sheet::{RawCell, Sheet};
use tracing::debug;

/// One identifier cell together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedCell {
    /// 1-based spreadsheet row number.
    pub row: usize,
    pub value: RawCell,
}

/// Extract the configured column's data cells, in sheet order.
///
/// # Errors
/// [`Upc2PdfError::ConfigurationMismatch`] when the sheet has no header row
/// after the banner, or the column cannot be found.
pub fn extract(
    sheet: &Sheet,
    header_rows: usize,
    column: &ColumnSelector,
) -> Result<Vec<ExtractedCell>, Upc2PdfError> {
    let mismatch = |detail: String| Upc2PdfError::ConfigurationMismatch {
        column: column.to_string(),
        detail,
    };

    if sheet.row_count() <= header_rows {
        return Err(mismatch(format!(
            "sheet has {} rows, expected a header row after the first {}",
            sheet.row_count(),
            header_rows
        )));
    }

    let col = resolve_column(sheet, header_rows, column).map_err(mismatch)?;

    let cells: Vec<ExtractedCell> = (header_rows + 1..sheet.row_count())
        .filter_map(|r| {
            let value = sheet.cell(r, col);
            (!value.is_empty()).then(|| ExtractedCell {
                row: r + 1,
                value: value.clone(),
            })
        })
        .collect();

    debug!(
        "Extracted {} non-empty cells from column {} ({} data rows)",
        cells.len(),
        col,
        sheet.row_count() - header_rows - 1
    );
    Ok(cells)
}

/// Resolve a selector to a 0-based column index.
fn resolve_column(
    sheet: &Sheet,
    header_rows: usize,
    column: &ColumnSelector,
) -> Result<usize, String> {
    let width = sheet.width_from(header_rows);
    match column {
        ColumnSelector::Index(i) if *i < width => Ok(*i),
        ColumnSelector::Index(_) => Err(format!("sheet has {width} columns")),
        ColumnSelector::Header(name) => {
            let wanted = name.trim();
            sheet
                .row(header_rows)
                .iter()
                .position(|cell| !cell.is_empty() && cell.to_string().trim() == wanted)
                .ok_or_else(|| {
                    format!("no header cell in row {} reads '{wanted}'", header_rows + 1)
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn banner(n: usize) -> Vec<Vec<RawCell>> {
        (0..n).map(|i| vec![RawCell::Text(format!("banner {i}"))]).collect()
    }

    fn sheet_with(header: Vec<RawCell>, data: Vec<Vec<RawCell>>) -> Sheet {
        let mut rows = banner(10);
        rows.push(header);
        rows.extend(data);
        Sheet::from_rows(rows)
    }

    #[test]
    fn extracts_by_index_and_drops_missing() {
        let sheet = sheet_with(
            vec!["SKU".into(), RawCell::Empty],
            vec![
                vec!["a".into(), "012345678905".into()],
                vec!["b".into(), RawCell::Number(614141000012.0)],
                vec!["c".into(), RawCell::Empty],
                vec!["d".into(), "abc".into()],
            ],
        );
        let cells = extract(&sheet, 10, &ColumnSelector::Index(1)).unwrap();
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[0].row, 12);
        assert_eq!(cells[1].value, RawCell::Number(614141000012.0));
        assert_eq!(cells[2].row, 15);
        assert_eq!(cells[2].value, RawCell::Text("abc".into()));
    }

    #[test]
    fn extracts_by_header_name() {
        let sheet = sheet_with(
            vec!["SKU".into(), " UPC ".into()],
            vec![vec!["a".into(), "036000291452".into()]],
        );
        let cells = extract(&sheet, 10, &ColumnSelector::Header("UPC".into())).unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].value, RawCell::Text("036000291452".into()));
    }

    #[test]
    fn numeric_header_matches_by_display_text() {
        let sheet = sheet_with(
            vec!["SKU".into(), RawCell::Number(2023.0), RawCell::Integer(2024)],
            vec![vec!["a".into(), "x".into(), "4006381333931".into()]],
        );
        let cells = extract(&sheet, 10, &ColumnSelector::Header("2024".into())).unwrap();
        assert_eq!(cells[0].value, RawCell::Text("4006381333931".into()));

        let cells = extract(&sheet, 10, &ColumnSelector::Header("2023".into())).unwrap();
        assert_eq!(cells[0].value, RawCell::Text("x".into()));
    }

    #[test]
    fn missing_index_column_is_mismatch() {
        let sheet = sheet_with(vec!["SKU".into()], vec![vec!["a".into()]]);
        let err = extract(&sheet, 10, &ColumnSelector::Index(13)).unwrap_err();
        assert!(
            matches!(err, Upc2PdfError::ConfigurationMismatch { ref column, .. } if column == "#13"),
            "got: {err}"
        );
    }

    #[test]
    fn missing_header_column_is_mismatch() {
        let sheet = sheet_with(vec!["SKU".into()], vec![vec!["a".into()]]);
        let err = extract(&sheet, 10, &ColumnSelector::Header("UPC".into())).unwrap_err();
        assert!(matches!(err, Upc2PdfError::ConfigurationMismatch { .. }));
    }

    #[test]
    fn sheet_shorter_than_banner_is_mismatch() {
        let sheet = Sheet::from_rows(banner(10));
        let err = extract(&sheet, 10, &ColumnSelector::Index(0)).unwrap_err();
        assert!(matches!(err, Upc2PdfError::ConfigurationMismatch { .. }));
    }

    #[test]
    fn banner_width_does_not_count() {
        let mut rows = banner(10);
        rows[0] = (0..20).map(RawCell::Integer).collect();
        rows.push(vec!["only".into()]);
        let sheet = Sheet::from_rows(rows);
        assert!(extract(&sheet, 10, &ColumnSelector::Index(13)).is_err());
    }

    #[test]
    fn column_present_with_no_data_yields_nothing() {
        let sheet = sheet_with(
            vec!["SKU".into(), "UPC".into()],
            vec![vec!["a".into(), RawCell::Empty]],
        );
        let cells = extract(&sheet, 10, &ColumnSelector::Index(1)).unwrap();
        assert!(cells.is_empty());
    }
}
