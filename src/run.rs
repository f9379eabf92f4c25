//! Run orchestration: one spreadsheet in, one barcode PDF out.
//!
//! A run moves through a fixed sequence of stages:
//!
//! ```text
//! Received ─▶ Parsed ─▶ Extracted ─▶ Normalized ─▶ Rendered ─▶ Composed ─▶ Delivered
//!     │          │           │            │             │            │
//!     └──────────┴───────────┴────────────┴─────────────┴────────────┴─▶ Failed(Upc2PdfError)
//! ```
//!
//! ## Why a per-row report instead of silent drops?
//!
//! Rows that cannot become barcodes (blank, non-numeric, all zeros, wrong
//! length) are expected in real spreadsheets and must not abort the run, but
//! an operator printing labels needs to know which products are missing from
//! the sheet. Every left-out row is therefore recorded as a
//! [`RowError`] in [`RunReport::skipped`], with its spreadsheet row number.
//!
//! Everything a run allocates, including the scratch directory holding the
//! rendered images, is owned by that run and released when it returns,
//! whether it succeeded or not.

use crate::config::{FailurePolicy, RunConfig};
use crate::error::{RowError, Upc2PdfError};
use crate::output::{RunOutput, RunReport};
use crate::pipeline::barcode;
use crate::pipeline::compose::write_pdf;
use crate::pipeline::extract::extract;
use crate::pipeline::layout::paginate;
use crate::pipeline::normalize::{normalize, Normalized};
use crate::pipeline::scratch::ScratchDir;
use crate::pipeline::sheet::Sheet;
use crate::progress::RunProgressCallback;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Stages of a run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStage {
    Received,
    Parsed,
    Extracted,
    Normalized,
    Rendered,
    Composed,
    Delivered,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunStage::Received => "received",
            RunStage::Parsed => "parsed",
            RunStage::Extracted => "extracted",
            RunStage::Normalized => "normalized",
            RunStage::Rendered => "rendered",
            RunStage::Composed => "composed",
            RunStage::Delivered => "delivered",
        })
    }
}

/// Generate a barcode PDF from a spreadsheet on disk.
///
/// # Errors
/// [`Upc2PdfError::FileNotFound`] / [`Upc2PdfError::PermissionDenied`] if the
/// file cannot be read, then anything [`generate_from_bytes`] returns.
pub fn generate(path: impl AsRef<Path>, config: &RunConfig) -> Result<RunOutput, Upc2PdfError> {
    let path = path.as_ref();
    let bytes = read_input(path)?;
    let source_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    generate_from_bytes(&bytes, &source_name, config)
}

/// Generate a barcode PDF from uploaded workbook bytes.
///
/// `source_name` (typically the uploaded file name) only appears in logs and
/// error messages.
///
/// # Errors
/// [`Upc2PdfError::UploadMissing`] for zero bytes,
/// [`Upc2PdfError::UploadUnreadable`] if the bytes are not a workbook, then
/// anything [`generate_from_sheet`] returns.
pub fn generate_from_bytes(
    bytes: &[u8],
    source_name: &str,
    config: &RunConfig,
) -> Result<RunOutput, Upc2PdfError> {
    if bytes.is_empty() {
        warn!("Run failed at {}: {}", RunStage::Received, Upc2PdfError::UploadMissing);
        return Err(Upc2PdfError::UploadMissing);
    }
    info!("Received '{}' ({} bytes)", source_name, bytes.len());

    let sheet = Sheet::from_bytes(bytes, source_name).inspect_err(|e| {
        warn!("Run failed at {}: {}", e.stage(), e);
    })?;
    generate_from_sheet(&sheet, config)
}

/// Generate a barcode PDF from an already-parsed sheet.
///
/// This is the whole pipeline minus workbook parsing, and the entry point
/// the other `generate*` functions funnel into.
///
/// # Returns
/// `Ok(RunOutput)` even if some rows were skipped; see
/// [`RunReport::skipped`]. A sheet without a single usable identifier yields
/// a PDF with no pages.
///
/// # Errors
/// - [`Upc2PdfError::ConfigurationMismatch`] if the identifier column is absent
/// - [`Upc2PdfError::UnsupportedIdentifier`] under [`FailurePolicy::Abort`]
/// - [`Upc2PdfError::ScratchFailed`] / [`Upc2PdfError::CompositionFailure`]
pub fn generate_from_sheet(sheet: &Sheet, config: &RunConfig) -> Result<RunOutput, Upc2PdfError> {
    run_pipeline(sheet, config).inspect_err(|e| {
        warn!("Run failed at {}: {}", e.stage(), e);
    })
}

/// Generate a barcode PDF and write it to `output_path`.
///
/// Uses atomic write (temp file + rename) so a failed run never leaves a
/// partial PDF behind.
pub fn generate_to_file(
    input: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &RunConfig,
) -> Result<RunReport, Upc2PdfError> {
    let output = generate(input, config)?;
    let path = output_path.as_ref();
    write_atomic(path, &output.pdf)?;
    info!(
        "Run {}: {} ({} bytes)",
        RunStage::Delivered,
        path.display(),
        output.pdf.len()
    );
    Ok(output.report)
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn run_pipeline(sheet: &Sheet, config: &RunConfig) -> Result<RunOutput, Upc2PdfError> {
    let start = Instant::now();
    let cb = config.progress_callback.as_deref();
    debug!(
        "Run {}: {} rows, column {}, {} banner rows",
        RunStage::Parsed,
        sheet.row_count(),
        config.column,
        config.header_rows
    );

    // ── Step 1: Extract the identifier column ────────────────────────────
    let cells = extract(sheet, config.header_rows, &config.column)?;
    info!(
        "Run {}: {} cells in column {}",
        RunStage::Extracted,
        cells.len(),
        config.column
    );

    // ── Step 2: Normalise ────────────────────────────────────────────────
    let mut skipped = Vec::new();
    let mut identifiers = Vec::with_capacity(cells.len());
    for cell in &cells {
        match normalize(&cell.value) {
            Normalized::Valid(id) => identifiers.push((cell.row, id)),
            Normalized::Invalid(reason) => skip(
                cb,
                &mut skipped,
                RowError::InvalidIdentifier {
                    row: cell.row,
                    raw: cell.value.to_string(),
                    reason: reason.to_string(),
                },
            ),
        }
    }
    info!(
        "Run {}: {} identifiers, {} rows skipped",
        RunStage::Normalized,
        identifiers.len(),
        skipped.len()
    );
    if identifiers.is_empty() {
        warn!("No usable identifiers in column {}", config.column);
    }

    // ── Step 3: Render into scratch storage ──────────────────────────────
    let total = identifiers.len();
    if let Some(cb) = cb {
        cb.on_run_start(total);
    }
    let scratch = ScratchDir::create(config.scratch_dir.as_deref())?;
    let mut stored = Vec::with_capacity(total);
    for (i, (row, id)) in identifiers.iter().enumerate() {
        match barcode::render(id, &config.barcode) {
            Ok(image) => {
                stored.push(scratch.store(stored.len(), *row, &image)?);
                if let Some(cb) = cb {
                    cb.on_item_rendered(i, total, id.as_str());
                }
            }
            Err(Upc2PdfError::UnsupportedIdentifier { identifier, detail })
                if config.render_policy == FailurePolicy::Skip =>
            {
                skip(
                    cb,
                    &mut skipped,
                    RowError::UnsupportedIdentifier {
                        row: *row,
                        identifier,
                        detail,
                    },
                );
            }
            Err(e) => return Err(e),
        }
    }
    info!("Run {}: {} barcodes", RunStage::Rendered, stored.len());

    // ── Step 4: Lay out and compose ──────────────────────────────────────
    let document = paginate(stored.len(), &config.grid);
    let composed = write_pdf(&document, &stored, config.page_size)?;
    scratch.close();

    for blank in &composed.blank_slots {
        if let Some(cb) = cb {
            cb.on_item_skipped(blank.row(), &blank.to_string());
        }
    }
    skipped.extend(composed.blank_slots.iter().cloned());

    let report = RunReport {
        rows_read: cells.len(),
        identifiers: total,
        rendered: stored.len(),
        pages: document.page_count(),
        blank_slots: composed.blank_slots.len(),
        skipped,
        duration_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        "Run {}: {} barcodes on {} pages, {} rows skipped, {}ms",
        RunStage::Composed,
        report.placed(),
        report.pages,
        report.skipped_count(),
        report.duration_ms
    );
    if let Some(cb) = cb {
        cb.on_run_complete(report.placed(), report.skipped_count());
    }

    Ok(RunOutput {
        pdf: composed.bytes,
        file_name: config.output_name.clone(),
        document,
        report,
    })
}

/// Record a left-out row.
fn skip(cb: Option<&dyn RunProgressCallback>, skipped: &mut Vec<RowError>, err: RowError) {
    warn!("Skipping {}", err);
    if let Some(cb) = cb {
        cb.on_item_skipped(err.row(), &err.to_string());
    }
    skipped.push(err);
}

/// Read an input spreadsheet with friendly not-found / permission errors.
fn read_input(path: &Path) -> Result<Vec<u8>, Upc2PdfError> {
    match std::fs::read(path) {
        Ok(bytes) => {
            debug!("Read {} ({} bytes)", path.display(), bytes.len());
            Ok(bytes)
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(Upc2PdfError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(_) => Err(Upc2PdfError::FileNotFound {
            path: path.to_path_buf(),
        }),
    }
}

/// Write `bytes` to `path` through a sibling temp file and a rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Upc2PdfError> {
    let write_failed = |source| Upc2PdfError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_failed)?;
    }
    let tmp_path = path.with_extension("pdf.tmp");
    std::fs::write(&tmp_path, bytes).map_err(write_failed)?;
    std::fs::rename(&tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        write_failed(e)
    })
}
