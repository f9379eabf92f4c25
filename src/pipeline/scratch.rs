//! Per-run scratch storage for rendered barcode images.
//!
//! Every run gets its own [`TempDir`]. Rendered images are written there as
//! PNG and read back by the compositor, so peak memory stays at one raster
//! no matter how long the identifier column is. The directory is removed
//! when the [`ScratchDir`] is dropped, which covers every early return and
//! panic; [`ScratchDir::close`] does the same on the success path but logs
//! a removal failure instead of ignoring it.

use crate::error::Upc2PdfError;
use crate::pipeline::barcode::{BarcodeImage, Symbology};
use crate::pipeline::normalize::CanonicalIdentifier;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// A rendered barcode persisted to scratch storage.
#[derive(Debug, Clone)]
pub struct StoredBarcode {
    /// 0-based placement index in the document.
    pub index: usize,
    /// 1-based spreadsheet row the identifier came from.
    pub row: usize,
    pub identifier: CanonicalIdentifier,
    pub symbology: Symbology,
    pub path: PathBuf,
}

/// A run-scoped scratch directory.
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    /// Create a fresh directory under `root`, or the system temp dir.
    pub fn create(root: Option<&Path>) -> Result<Self, Upc2PdfError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("upc2pdf-");
        let dir = match root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(|e| Upc2PdfError::ScratchFailed(format!("create scratch dir: {e}")))?;
        debug!("Scratch dir: {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a rendered barcode as PNG.
    pub fn store(
        &self,
        index: usize,
        row: usize,
        barcode: &BarcodeImage,
    ) -> Result<StoredBarcode, Upc2PdfError> {
        let path = self
            .dir
            .path()
            .join(format!("{index:05}-{}.png", barcode.identifier));
        barcode
            .image
            .save(&path)
            .map_err(|e| Upc2PdfError::ScratchFailed(format!("write {}: {e}", path.display())))?;
        Ok(StoredBarcode {
            index,
            row,
            identifier: barcode.identifier.clone(),
            symbology: barcode.symbology,
            path,
        })
    }

    /// Remove the directory, logging (not returning) any failure.
    pub fn close(self) {
        let path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            warn!("Failed to remove scratch dir {}: {}", path.display(), e);
        }
    }
}
