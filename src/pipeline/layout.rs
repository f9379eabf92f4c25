//! Grid layout: assign every barcode a page and a cell.
//!
//! Placement is a pure function of the item's position in the whole
//! sequence, so the layout can be computed (and tested) without any images:
//!
//! ```text
//! slot     = i mod per_page
//! row, col = slot div per_row, slot mod per_row
//! x        = margin + col · (cell_width  + margin)
//! y        = margin + row · (cell_height + margin)
//! ```
//!
//! Coordinates are in layout units from the page's top-left corner.

use crate::config::GridLayout;
use serde::Serialize;

/// Where one item lands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    /// 0-based index in the item sequence.
    pub index: usize,
    /// 0-based page number.
    pub page: usize,
    pub row: usize,
    pub col: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// One page's placements in item order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Page {
    pub placements: Vec<Placement>,
}

/// The laid-out document: pages in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Document {
    pub pages: Vec<Page>,
}

impl Document {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn placements(&self) -> impl Iterator<Item = &Placement> {
        self.pages.iter().flat_map(|p| p.placements.iter())
    }
}

impl GridLayout {
    /// Placement of item `index`.
    pub fn place(&self, index: usize) -> Placement {
        let slot = index % self.per_page();
        let (row, col) = (slot / self.per_row, slot % self.per_row);
        Placement {
            index,
            page: index / self.per_page(),
            row,
            col,
            x: self.margin + col as f32 * (self.cell_width + self.margin),
            y: self.margin + row as f32 * (self.cell_height + self.margin),
            width: self.cell_width,
            height: self.cell_height,
        }
    }
}

/// Lay out `count` items. A new page starts at every slot 0, so the
/// document has `ceil(count / per_page)` pages.
pub fn paginate(count: usize, grid: &GridLayout) -> Document {
    let mut doc = Document::default();
    for i in 0..count {
        let placement = grid.place(i);
        if placement.row == 0 && placement.col == 0 {
            doc.pages.push(Page::default());
        }
        if let Some(page) = doc.pages.last_mut() {
            page.placements.push(placement);
        }
    }
    doc
}
