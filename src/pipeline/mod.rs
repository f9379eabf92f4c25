//! Pipeline stages for spreadsheet-to-barcode-sheet generation.
//!
//! Each submodule implements exactly one transformation step and is pure
//! apart from [`scratch`] and the final write in [`compose`]. Keeping stages
//! separate makes each independently testable; the orchestrator in
//! [`crate::run`] is the only place that knows their order.
//!
//! ## Data Flow
//!
//! ```text
//! sheet ──▶ extract ──▶ normalize ──▶ barcode ──▶ scratch ──▶ layout ──▶ compose
//! (calamine) (column)   (digits+pad)  (barcoders) (tempdir)   (grid)     (lopdf)
//! ```
//!
//! 1. [`sheet`]     — parse workbook bytes into a grid of [`sheet::RawCell`]s
//! 2. [`extract`]   — skip the banner rows, locate the identifier column, drop
//!    missing cells
//! 3. [`normalize`] — numeric-or-digits sanitising, zero padding, sentinel
//!    rejection
//! 4. [`barcode`]   — pick UPC-A / EAN-13 by length and paint the glyph plus
//!    its label
//! 5. [`scratch`]   — persist each raster to a run-scoped temp directory
//! 6. [`layout`]    — assign every barcode a page and a grid cell
//! 7. [`compose`]   — embed the images into a paginated PDF

pub mod barcode;
pub mod compose;
pub mod extract;
pub mod layout;
pub mod normalize;
pub mod scratch;
pub mod sheet;
