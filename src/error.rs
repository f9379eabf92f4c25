//! Error types for the upc2pdf library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Upc2PdfError`] — **Fatal**: the run cannot produce a document at all
//!   (unreadable upload, identifier column missing, PDF assembly failed).
//!   Returned as `Err(Upc2PdfError)` from the top-level `generate*` functions.
//!
//! * [`RowError`] — **Non-fatal**: a single spreadsheet row could not be
//!   turned into a barcode, but every other row is fine. Collected in
//!   [`crate::output::RunReport::skipped`] so callers can see exactly which
//!   rows were left out and why.
//!
//! Whether an unsupported identifier is a [`RowError`] or aborts the run as
//! [`Upc2PdfError::UnsupportedIdentifier`] is decided per run by
//! [`crate::config::FailurePolicy`].

use crate::run::RunStage;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the upc2pdf library.
///
/// Row-level failures use [`RowError`] and are stored in
/// [`crate::output::RunReport`] rather than propagated here.
#[derive(Debug, Error)]
pub enum Upc2PdfError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The request carried no file, or the file was empty.
    #[error("No spreadsheet uploaded.")]
    UploadMissing,

    /// Input file was not found at the given path.
    #[error("Spreadsheet not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The bytes do not parse as a workbook calamine understands.
    #[error("Could not read '{source_name}' as a spreadsheet: {detail}")]
    UploadUnreadable { source_name: String, detail: String },

    // ── Layout errors ─────────────────────────────────────────────────────
    /// The configured identifier column is not present in the sheet.
    #[error("Column {column} not found in the uploaded file: {detail}")]
    ConfigurationMismatch { column: String, detail: String },

    // ── Render errors ─────────────────────────────────────────────────────
    /// An identifier cannot be mapped to UPC-A or EAN-13.
    #[error("Error generating barcode for {identifier}: {detail}")]
    UnsupportedIdentifier { identifier: String, detail: String },

    /// Scratch storage for rendered images could not be created or written.
    #[error("Scratch storage failed: {0}")]
    ScratchFailed(String),

    /// The PDF could not be assembled.
    #[error("Failed to compose PDF: {0}")]
    CompositionFailure(String),

    // ── Delivery errors ───────────────────────────────────────────────────
    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Upc2PdfError {
    /// The pipeline stage this error aborts.
    pub fn stage(&self) -> RunStage {
        match self {
            Upc2PdfError::UploadMissing
            | Upc2PdfError::FileNotFound { .. }
            | Upc2PdfError::PermissionDenied { .. }
            | Upc2PdfError::UploadUnreadable { .. }
            | Upc2PdfError::InvalidConfig(_) => RunStage::Received,
            Upc2PdfError::ConfigurationMismatch { .. } => RunStage::Parsed,
            Upc2PdfError::UnsupportedIdentifier { .. } | Upc2PdfError::ScratchFailed(_) => {
                RunStage::Normalized
            }
            Upc2PdfError::CompositionFailure(_) => RunStage::Rendered,
            Upc2PdfError::OutputWriteFailed { .. } => RunStage::Composed,
        }
    }

    /// True when the failure is caused by what the caller sent rather than
    /// by this process. The upload boundary answers these with HTTP 400.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Upc2PdfError::UploadMissing
                | Upc2PdfError::UploadUnreadable { .. }
                | Upc2PdfError::ConfigurationMismatch { .. }
                | Upc2PdfError::UnsupportedIdentifier { .. }
        )
    }
}

/// A non-fatal error for a single spreadsheet row.
///
/// `row` is the 1-based row number as shown by spreadsheet applications.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum RowError {
    /// The cell held nothing a barcode can be made from.
    #[error("Row {row}: invalid identifier {raw:?} ({reason})")]
    InvalidIdentifier {
        row: usize,
        raw: String,
        reason: String,
    },

    /// The normalised identifier is not 12 or 13 digits long.
    #[error("Row {row}: unsupported identifier {identifier}: {detail}")]
    UnsupportedIdentifier {
        row: usize,
        identifier: String,
        detail: String,
    },

    /// The rendered image could not be read back when composing the page;
    /// its slot was left blank.
    #[error("Row {row}: barcode image for {identifier} unreadable: {detail}")]
    ImageUnreadable {
        row: usize,
        identifier: String,
        detail: String,
    },
}

impl RowError {
    /// Spreadsheet row number the error refers to.
    pub fn row(&self) -> usize {
        match self {
            RowError::InvalidIdentifier { row, .. }
            | RowError::UnsupportedIdentifier { row, .. }
            | RowError::ImageUnreadable { row, .. } => *row,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_mismatch_display() {
        let e = Upc2PdfError::ConfigurationMismatch {
            column: "#13".into(),
            detail: "sheet has 4 columns".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("#13"), "got: {msg}");
        assert!(msg.contains("4 columns"), "got: {msg}");
        assert_eq!(e.stage(), RunStage::Parsed);
    }

    #[test]
    fn unsupported_identifier_display() {
        let e = Upc2PdfError::UnsupportedIdentifier {
            identifier: "12345678901234".into(),
            detail: "14 digits".into(),
        };
        assert!(e.to_string().contains("12345678901234"));
        assert!(e.is_client_error());
    }

    #[test]
    fn server_side_errors_are_not_client_errors() {
        assert!(!Upc2PdfError::CompositionFailure("boom".into()).is_client_error());
        assert!(!Upc2PdfError::ScratchFailed("disk full".into()).is_client_error());
        assert!(Upc2PdfError::UploadMissing.is_client_error());
    }

    #[test]
    fn every_fatal_error_maps_to_a_stage() {
        let cases = [
            (Upc2PdfError::UploadMissing, RunStage::Received),
            (Upc2PdfError::InvalidConfig("dpi".into()), RunStage::Received),
            (Upc2PdfError::ScratchFailed("disk full".into()), RunStage::Normalized),
            (Upc2PdfError::CompositionFailure("xref".into()), RunStage::Rendered),
        ];
        for (e, stage) in cases {
            assert_eq!(e.stage(), stage, "{e}");
        }
    }

    #[test]
    fn output_write_failed_stage() {
        let e = Upc2PdfError::OutputWriteFailed {
            path: PathBuf::from("/nope/barcodes.pdf"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(e.stage(), RunStage::Composed);
        assert!(e.to_string().contains("/nope/barcodes.pdf"));
    }

    #[test]
    fn row_error_display_names_row() {
        let e = RowError::InvalidIdentifier {
            row: 14,
            raw: "abc".into(),
            reason: "no digits".into(),
        };
        assert_eq!(e.row(), 14);
        assert!(e.to_string().starts_with("Row 14"));
    }
}
