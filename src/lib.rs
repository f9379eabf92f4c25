//! # upc2pdf
//!
//! Turn a spreadsheet column of UPC/EAN identifiers into a printable PDF
//! sheet of labelled barcodes.
//!
//! ## Why this crate?
//!
//! Product spreadsheets exported from inventory systems store UPCs as
//! numbers: leading zeros disappear, `.0` suffixes appear, and blank or
//! placeholder rows are mixed in with real data. This crate normalises each
//! cell back into a canonical 12- or 13-digit identifier, renders it as a
//! UPC-A or EAN-13 barcode with its digits underneath, and lays the results
//! out six to a page, ready to print on label stock.
//!
//! ## Pipeline Overview
//!
//! ```text
//! xlsx / xls / ods
//!  │
//!  ├─ 1. Parse      first worksheet via calamine
//!  ├─ 2. Extract    skip 10 banner rows, pick the identifier column
//!  ├─ 3. Normalise  numeric-or-digits, zero-pad to 12, drop all-zero
//!  ├─ 4. Render     UPC-A (12) / EAN-13 (13) glyph + centred label
//!  ├─ 5. Layout     2 × 3 grid of 75 × 50 mm cells, 5 mm margins
//!  └─ 6. Compose    one PDF, rows left out listed in the run report
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use upc2pdf::{generate, ColumnSelector, FailurePolicy, RunConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RunConfig::builder()
//!         .column(ColumnSelector::Header("UPC".into()))
//!         .render_policy(FailurePolicy::Skip)
//!         .build()?;
//!     let output = generate("products.xlsx", &config)?;
//!     std::fs::write(&output.file_name, &output.pdf)?;
//!     for row in &output.report.skipped {
//!         eprintln!("{row}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | HTTP upload form + `POST /generate` (axum + tokio) |
//! | `cli`    | on      | Enables the `upc2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable both when using only the library:
//! ```toml
//! upc2pdf = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod run;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    BarcodeStyle, ColumnSelector, FailurePolicy, GridLayout, PageSize, RunConfig, RunConfigBuilder,
};
pub use error::{RowError, Upc2PdfError};
pub use output::{RunOutput, RunReport};
pub use pipeline::layout::{Document, Placement};
pub use pipeline::sheet::{RawCell, Sheet};
pub use progress::{NoopProgressCallback, ProgressCallback, RunProgressCallback};
pub use run::{generate, generate_from_bytes, generate_from_sheet, generate_to_file, RunStage};
