//! Result types returned by the orchestrator.

use crate::error::RowError;
use crate::pipeline::layout::Document;
use serde::{Deserialize, Serialize};

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// The finished PDF.
    pub pdf: Vec<u8>,
    /// Name to deliver the PDF under, e.g. `barcodes.pdf`.
    pub file_name: String,
    /// Page and cell of every rendered barcode.
    pub document: Document,
    pub report: RunReport,
}

/// What happened to the rows of one spreadsheet.
///
/// Every row that did not end up as a barcode on the page appears exactly
/// once in `skipped` or as a blank slot, with its spreadsheet row number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Non-missing cells found in the identifier column.
    pub rows_read: usize,
    /// Cells that normalised to a canonical identifier.
    pub identifiers: usize,
    /// Barcodes rendered and laid out.
    pub rendered: usize,
    pub pages: usize,
    /// Laid-out barcodes whose image could not be read back.
    pub blank_slots: usize,
    /// Rows left out, in spreadsheet order, then blank slots.
    pub skipped: Vec<RowError>,
    pub duration_ms: u64,
}

impl RunReport {
    /// Barcodes actually drawn on a page.
    pub fn placed(&self) -> usize {
        self.rendered.saturating_sub(self.blank_slots)
    }

    /// Rows that did not produce a drawn barcode.
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts() {
        let report = RunReport {
            rows_read: 4,
            identifiers: 3,
            rendered: 2,
            pages: 1,
            blank_slots: 1,
            skipped: vec![
                RowError::InvalidIdentifier {
                    row: 14,
                    raw: "abc".into(),
                    reason: "no digits".into(),
                },
                RowError::ImageUnreadable {
                    row: 12,
                    identifier: "012345678905".into(),
                    detail: "gone".into(),
                },
            ],
            duration_ms: 3,
        };
        assert_eq!(report.placed(), 1);
        assert_eq!(report.skipped_count(), 2);
    }

    #[test]
    fn report_serialises_to_json() {
        let report = RunReport {
            rows_read: 1,
            skipped: vec![RowError::InvalidIdentifier {
                row: 12,
                raw: String::new(),
                reason: "all zeros".into(),
            }],
            ..Default::default()
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["rows_read"], 1);
        assert_eq!(json["skipped"][0]["InvalidIdentifier"]["row"], 12);
        let back: RunReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, report);
    }
}
