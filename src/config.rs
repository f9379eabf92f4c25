//! Configuration types for a barcode-sheet run.
//!
//! All run behaviour is controlled through [`RunConfig`], built via its
//! [`RunConfigBuilder`]. The config is passed explicitly into every run; the
//! library keeps no process-wide state between runs.
//!
//! The defaults reproduce the layout of the supplier template this tool was
//! written for: ten banner rows, identifiers in the fourteenth column, and an
//! A4 sheet of 2 × 3 barcodes, each 75 × 50 mm with 5 mm gutters.

use crate::error::Upc2PdfError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Configuration for one spreadsheet → PDF run.
///
/// Built via [`RunConfig::builder()`] or using [`RunConfig::default()`].
///
/// # Example
/// ```rust
/// use upc2pdf::{ColumnSelector, FailurePolicy, RunConfig};
///
/// let config = RunConfig::builder()
///     .header_rows(3)
///     .column(ColumnSelector::Header("UPC".into()))
///     .render_policy(FailurePolicy::Abort)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct RunConfig {
    /// Leading banner rows to ignore. The row right after them is the header
    /// row; data starts on the row after that. Default: 10.
    pub header_rows: usize,

    /// Which column holds the identifiers. Default: `Index(13)` (column N).
    pub column: ColumnSelector,

    /// What to do when an identifier cannot be rendered. Default: `Skip`.
    pub render_policy: FailurePolicy,

    /// Grid geometry in layout units (millimetres).
    pub grid: GridLayout,

    /// Page size in layout units (millimetres). Default: A4.
    pub page_size: PageSize,

    /// Raster geometry of each barcode image.
    pub barcode: BarcodeStyle,

    /// File name offered for download. Default: `barcodes.pdf`.
    pub output_name: String,

    /// Root under which each run creates its private scratch directory.
    /// If None, the system temp directory is used.
    pub scratch_dir: Option<PathBuf>,

    /// Optional progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            header_rows: 10,
            column: ColumnSelector::default(),
            render_policy: FailurePolicy::default(),
            grid: GridLayout::default(),
            page_size: PageSize::default(),
            barcode: BarcodeStyle::default(),
            output_name: "barcodes.pdf".to_string(),
            scratch_dir: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("header_rows", &self.header_rows)
            .field("column", &self.column)
            .field("render_policy", &self.render_policy)
            .field("grid", &self.grid)
            .field("page_size", &self.page_size)
            .field("barcode", &self.barcode)
            .field("output_name", &self.output_name)
            .field("scratch_dir", &self.scratch_dir)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn RunProgressCallback>"),
            )
            .finish()
    }
}

impl RunConfig {
    /// Create a new builder for `RunConfig`.
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`RunConfig`].
#[derive(Debug)]
pub struct RunConfigBuilder {
    config: RunConfig,
}

impl RunConfigBuilder {
    pub fn header_rows(mut self, n: usize) -> Self {
        self.config.header_rows = n;
        self
    }

    pub fn column(mut self, column: ColumnSelector) -> Self {
        self.config.column = column;
        self
    }

    pub fn render_policy(mut self, policy: FailurePolicy) -> Self {
        self.config.render_policy = policy;
        self
    }

    pub fn grid(mut self, grid: GridLayout) -> Self {
        self.config.grid = grid;
        self
    }

    pub fn page_size(mut self, size: PageSize) -> Self {
        self.config.page_size = size;
        self
    }

    pub fn barcode(mut self, style: BarcodeStyle) -> Self {
        self.config.barcode = style;
        self
    }

    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.config.output_name = name.into();
        self
    }

    pub fn scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.scratch_dir = Some(dir.into());
        self
    }

    /// Attach a progress callback that receives per-item events.
    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RunConfig, Upc2PdfError> {
        let c = &self.config;
        let g = &c.grid;
        if g.per_row == 0 || g.per_col == 0 {
            return Err(Upc2PdfError::InvalidConfig(format!(
                "Grid must have at least one row and column, got {}×{}",
                g.per_row, g.per_col
            )));
        }
        if g.cell_width <= 0.0 || g.cell_height <= 0.0 || g.margin < 0.0 {
            return Err(Upc2PdfError::InvalidConfig(format!(
                "Cell size must be positive and margin non-negative, got {}×{} / {}",
                g.cell_width, g.cell_height, g.margin
            )));
        }
        let (need_w, need_h) = g.extent();
        if need_w > c.page_size.width || need_h > c.page_size.height {
            return Err(Upc2PdfError::InvalidConfig(format!(
                "Grid needs {need_w}×{need_h} but the page is {}×{}",
                c.page_size.width, c.page_size.height
            )));
        }
        let b = &c.barcode;
        if b.module_px == 0 || b.bar_height_px == 0 || b.label_scale == 0 {
            return Err(Upc2PdfError::InvalidConfig(
                "Barcode module width, bar height and label scale must be ≥ 1".into(),
            ));
        }
        if b.label_scale * crate::pipeline::barcode::GLYPH_HEIGHT > b.label_band_px {
            return Err(Upc2PdfError::InvalidConfig(format!(
                "Label at scale {} does not fit a {} px band",
                b.label_scale, b.label_band_px
            )));
        }
        if c.output_name.trim().is_empty() {
            return Err(Upc2PdfError::InvalidConfig(
                "Output name must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Locates the identifier column in the sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnSelector {
    /// 0-based column index (A = 0).
    Index(usize),
    /// Header text in the row right after the skipped banner rows.
    Header(String),
}

impl Default for ColumnSelector {
    fn default() -> Self {
        ColumnSelector::Index(13)
    }
}

impl fmt::Display for ColumnSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnSelector::Index(i) => write!(f, "#{i}"),
            ColumnSelector::Header(h) => write!(f, "'{h}'"),
        }
    }
}

impl FromStr for ColumnSelector {
    type Err = Upc2PdfError;

    /// All-digit strings select by index; anything else by header text.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Upc2PdfError::InvalidConfig(
                "Column selector must not be empty".into(),
            ));
        }
        if s.chars().all(|c| c.is_ascii_digit()) {
            let idx = s
                .parse()
                .map_err(|e| Upc2PdfError::InvalidConfig(format!("Bad column index '{s}': {e}")))?;
            return Ok(ColumnSelector::Index(idx));
        }
        Ok(ColumnSelector::Header(s.to_string()))
    }
}

/// Policy for identifiers the renderer rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Record the row in the report and keep going. (default)
    #[default]
    Skip,
    /// Abort the whole run with [`Upc2PdfError::UnsupportedIdentifier`].
    Abort,
}

/// Fixed grid every page is laid out on. All lengths in layout units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridLayout {
    pub per_row: usize,
    pub per_col: usize,
    pub cell_width: f32,
    pub cell_height: f32,
    /// Gap between cells and between the grid and the page's top/left edge.
    pub margin: f32,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            per_row: 2,
            per_col: 3,
            cell_width: 75.0,
            cell_height: 50.0,
            margin: 5.0,
        }
    }
}

impl GridLayout {
    /// Cells per page.
    pub fn per_page(&self) -> usize {
        self.per_row * self.per_col
    }

    /// Width and height from the page origin to the far edge of the last cell.
    pub fn extent(&self) -> (f32, f32) {
        (
            self.margin + self.per_row as f32 * (self.cell_width + self.margin),
            self.margin + self.per_col as f32 * (self.cell_height + self.margin),
        )
    }
}

/// Page size in layout units (millimetres).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub const A4: PageSize = PageSize {
        width: 210.0,
        height: 297.0,
    };
    pub const LETTER: PageSize = PageSize {
        width: 215.9,
        height: 279.4,
    };
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize::A4
    }
}

/// Raster geometry of one barcode image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarcodeStyle {
    /// Width of the narrowest bar in pixels.
    pub module_px: u32,
    /// Height of the bars in pixels.
    pub bar_height_px: u32,
    /// Blank modules left and right of the symbol.
    pub quiet_zone_modules: u32,
    /// Height of the white band under the bars that carries the label.
    pub label_band_px: u32,
    /// Pixel scale of the label digits (each digit is 5 × 7 at scale 1).
    pub label_scale: u32,
}

impl Default for BarcodeStyle {
    fn default() -> Self {
        Self {
            module_px: 3,
            bar_height_px: 150,
            quiet_zone_modules: 10,
            label_band_px: 30,
            label_scale: 3,
        }
    }
}
