//! Shared fixtures for the integration tests: a minimal xlsx writer laid
//! out like the product template (10 banner rows, header row, identifiers
//! in column N), plus PDF inspection helpers.

#![allow(dead_code)]

use lopdf::content::Content;
use std::io::{Cursor, Write};
use upc2pdf::{RawCell, Sheet};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Index of column N, the template's identifier column.
pub const TEMPLATE_COLUMN: usize = 13;

/// One fixture cell.
#[derive(Debug, Clone)]
pub enum Cell {
    Blank,
    Text(String),
    Number(f64),
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<&Cell> for RawCell {
    fn from(c: &Cell) -> Self {
        match c {
            Cell::Blank => RawCell::Empty,
            Cell::Text(s) => RawCell::from(s.as_str()),
            Cell::Number(n) => RawCell::Number(*n),
        }
    }
}

/// Template rows with `values` in column `col` below the header row.
pub fn template_rows(header: &str, col: usize, values: &[Cell]) -> Vec<Vec<Cell>> {
    let mut rows = Vec::new();
    rows.push(vec![Cell::from("Purchase order 4711")]);
    for _ in 1..10 {
        rows.push(vec![Cell::Blank]);
    }
    let mut header_row = vec![Cell::from("Description")];
    header_row.resize(col, Cell::Blank);
    header_row.push(Cell::from(header));
    rows.push(header_row);
    for v in values {
        let mut row = vec![Cell::from("item")];
        row.resize(col, Cell::Blank);
        row.push(v.clone());
        rows.push(row);
    }
    rows
}

/// The template as an in-memory sheet, identifiers in column N.
pub fn template_sheet(values: &[Cell]) -> Sheet {
    Sheet::from_rows(
        template_rows("", TEMPLATE_COLUMN, values)
            .iter()
            .map(|row| row.iter().map(RawCell::from).collect())
            .collect(),
    )
}

/// The template as xlsx bytes, identifiers in column N under `header`.
pub fn template_xlsx(header: &str, values: &[Cell]) -> Vec<u8> {
    xlsx(&template_rows(header, TEMPLATE_COLUMN, values))
}

// ── xlsx writer ──────────────────────────────────────────────────────────────

/// A single-sheet workbook with inline strings, stored (uncompressed).
pub fn xlsx(rows: &[Vec<Cell>]) -> Vec<u8> {
    let content_types = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;
    let root_rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;
    let workbook = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#;
    let workbook_rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

    let mut sheet = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    for (r, row) in rows.iter().enumerate() {
        sheet.push_str(&format!(r#"<row r="{}">"#, r + 1));
        for (c, cell) in row.iter().enumerate() {
            let at = format!("{}{}", column_name(c), r + 1);
            match cell {
                Cell::Blank => {}
                Cell::Text(s) => sheet.push_str(&format!(
                    r#"<c r="{at}" t="inlineStr"><is><t>{}</t></is></c>"#,
                    escape(s)
                )),
                Cell::Number(n) => sheet.push_str(&format!(r#"<c r="{at}"><v>{n}</v></c>"#)),
            }
        }
        sheet.push_str("</row>");
    }
    sheet.push_str("</sheetData></worksheet>");

    zip_stored(&[
        ("[Content_Types].xml", content_types.as_bytes()),
        ("_rels/.rels", root_rels.as_bytes()),
        ("xl/workbook.xml", workbook.as_bytes()),
        ("xl/_rels/workbook.xml.rels", workbook_rels.as_bytes()),
        ("xl/worksheets/sheet1.xml", sheet.as_bytes()),
    ])
}

fn column_name(mut c: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (c % 26) as u8);
        if c < 26 {
            break;
        }
        c = c / 26 - 1;
    }
    name.reverse();
    String::from_utf8(name).unwrap()
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// A zip archive of uncompressed entries.
fn zip_stored(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

// ── PDF inspection ───────────────────────────────────────────────────────────

/// Number of images drawn on each page, in page order.
pub fn images_per_page(pdf: &[u8]) -> Vec<usize> {
    let doc = lopdf::Document::load_mem(pdf).expect("output is not a PDF");
    doc.get_pages()
        .values()
        .map(|&id| {
            let content = doc.get_page_content(id).unwrap();
            Content::decode(&content)
                .unwrap()
                .operations
                .iter()
                .filter(|op| op.operator == "Do")
                .count()
        })
        .collect()
}
