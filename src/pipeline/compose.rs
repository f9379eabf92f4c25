//! PDF composition: laid-out document + stored barcodes → PDF bytes.
//!
//! Each barcode is embedded as an 8-bit DeviceGray image XObject and drawn
//! into its cell with a single `cm` + `Do`. Layout units are millimetres
//! measured from the top-left corner; PDF user space is points from the
//! bottom-left, so y is flipped here and nowhere else.
//!
//! A barcode whose scratch image is missing or cannot be decoded leaves its
//! cell blank; the page and the rest of the document are still produced.

use crate::config::PageSize;
use crate::error::{RowError, Upc2PdfError};
use crate::pipeline::layout::{Document, Placement};
use crate::pipeline::scratch::StoredBarcode;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Object, Stream};
use tracing::{debug, warn};

/// PDF points per layout unit (millimetre).
pub const PT_PER_UNIT: f32 = 72.0 / 25.4;

/// The emitted PDF plus the cells that had to be left blank.
#[derive(Debug, Clone)]
pub struct ComposedPdf {
    pub bytes: Vec<u8>,
    pub blank_slots: Vec<RowError>,
}

/// Write every page of `document` into a PDF.
///
/// `barcodes[i]` is the image for the placement with `index == i`.
///
/// # Errors
/// [`Upc2PdfError::CompositionFailure`] if a content stream cannot be
/// encoded or the PDF cannot be serialised.
pub fn write_pdf(
    document: &Document,
    barcodes: &[StoredBarcode],
    page_size: PageSize,
) -> Result<ComposedPdf, Upc2PdfError> {
    let page_w = page_size.width * PT_PER_UNIT;
    let page_h = page_size.height * PT_PER_UNIT;

    let mut pdf = lopdf::Document::with_version("1.5");
    let pages_id = pdf.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(document.page_count());
    let mut blank_slots = Vec::new();

    for (page_no, page) in document.pages.iter().enumerate() {
        let mut xobjects = Dictionary::new();
        let mut operations = Vec::with_capacity(page.placements.len() * 4);

        for placement in &page.placements {
            let Some(barcode) = barcodes.get(placement.index) else {
                warn!("No barcode for slot {}; leaving it blank", placement.index);
                continue;
            };

            let gray = match image::open(&barcode.path) {
                Ok(img) => img.to_luma8(),
                Err(e) => {
                    warn!(
                        "Barcode image for {} unreadable, leaving slot {} blank: {}",
                        barcode.identifier, placement.index, e
                    );
                    blank_slots.push(RowError::ImageUnreadable {
                        row: barcode.row,
                        identifier: barcode.identifier.to_string(),
                        detail: e.to_string(),
                    });
                    continue;
                }
            };

            let (w, h) = gray.dimensions();
            debug!(
                "Placing {} {} (row {}) in slot {}",
                barcode.symbology, barcode.identifier, barcode.row, placement.index
            );
            let image_id = pdf.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => i64::from(w),
                    "Height" => i64::from(h),
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8_i64,
                },
                gray.into_raw(),
            ));

            let name = format!("Im{}", placement.index);
            xobjects.set(name.as_bytes().to_vec(), image_id);
            operations.extend(draw_ops(&name, placement, page_h));
        }

        let content = Content { operations }
            .encode()
            .map_err(|e| Upc2PdfError::CompositionFailure(format!("page {}: {e}", page_no + 1)))?;
        let content_id = pdf.add_object(Stream::new(Dictionary::new(), content));
        let page_id = pdf.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! { "XObject" => xobjects },
        });
        kids.push(page_id.into());
        debug!(
            "Composed page {} with {} slots",
            page_no + 1,
            page.placements.len()
        );
    }

    if kids.is_empty() {
        warn!("No barcodes to place; emitting a PDF with no pages");
    }

    let count = kids.len() as i64;
    pdf.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(page_w),
                Object::Real(page_h),
            ],
        }),
    );
    let catalog_id = pdf.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = pdf.add_object(dictionary! {
        "Producer" => Object::string_literal(concat!("upc2pdf ", env!("CARGO_PKG_VERSION"))),
    });
    pdf.trailer.set("Root", catalog_id);
    pdf.trailer.set("Info", info_id);
    pdf.compress();

    let mut bytes = Vec::new();
    pdf.save_to(&mut bytes)
        .map_err(|e| Upc2PdfError::CompositionFailure(format!("serialise PDF: {e}")))?;

    Ok(ComposedPdf { bytes, blank_slots })
}

/// `q w 0 0 h x y cm /Name Do Q` for one cell.
fn draw_ops(name: &str, p: &Placement, page_h: f32) -> [Operation; 4] {
    let w = p.width * PT_PER_UNIT;
    let h = p.height * PT_PER_UNIT;
    let x = p.x * PT_PER_UNIT;
    let y = page_h - (p.y + p.height) * PT_PER_UNIT;
    [
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                Object::Real(w),
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(h),
                Object::Real(x),
                Object::Real(y),
            ],
        ),
        Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BarcodeStyle, GridLayout};
    use crate::pipeline::barcode::render;
    use crate::pipeline::layout::paginate;
    use crate::pipeline::normalize::{normalize, Normalized};
    use crate::pipeline::scratch::ScratchDir;

    fn store_all(scratch: &ScratchDir, ids: &[&str]) -> Vec<StoredBarcode> {
        ids.iter()
            .enumerate()
            .map(|(i, s)| {
                let Normalized::Valid(id) = normalize(&(*s).into()) else {
                    panic!("{s} did not normalise");
                };
                let img = render(&id, &BarcodeStyle::default()).unwrap();
                scratch.store(i, 12 + i, &img).unwrap()
            })
            .collect()
    }

    fn draws_per_page(bytes: &[u8]) -> Vec<usize> {
        let pdf = lopdf::Document::load_mem(bytes).unwrap();
        pdf.get_pages()
            .values()
            .map(|&id| {
                let content = pdf.get_page_content(id).unwrap();
                Content::decode(&content)
                    .unwrap()
                    .operations
                    .iter()
                    .filter(|op| op.operator == "Do")
                    .count()
            })
            .collect()
    }

    #[test]
    fn one_page_for_two_barcodes() {
        let scratch = ScratchDir::create(None).unwrap();
        let stored = store_all(&scratch, &["012345678905", "614141000012"]);
        let doc = paginate(stored.len(), &GridLayout::default());

        let out = write_pdf(&doc, &stored, PageSize::A4).unwrap();
        assert!(out.bytes.starts_with(b"%PDF-1.5"));
        assert!(out.blank_slots.is_empty());
        assert_eq!(draws_per_page(&out.bytes), vec![2]);
    }

    #[test]
    fn unreadable_image_leaves_slot_blank() {
        let scratch = ScratchDir::create(None).unwrap();
        let stored = store_all(&scratch, &["012345678905", "4006381333931", "614141000012"]);
        std::fs::write(&stored[1].path, b"not a png").unwrap();
        let doc = paginate(stored.len(), &GridLayout::default());

        let out = write_pdf(&doc, &stored, PageSize::A4).unwrap();
        assert_eq!(draws_per_page(&out.bytes), vec![2]);
        assert_eq!(out.blank_slots.len(), 1);
        match &out.blank_slots[0] {
            RowError::ImageUnreadable {
                row, identifier, ..
            } => {
                assert_eq!(*row, 13);
                assert_eq!(identifier, "4006381333931");
            }
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn missing_image_file_leaves_slot_blank() {
        let scratch = ScratchDir::create(None).unwrap();
        let stored = store_all(&scratch, &["012345678905"]);
        std::fs::remove_file(&stored[0].path).unwrap();
        let doc = paginate(1, &GridLayout::default());

        let out = write_pdf(&doc, &stored, PageSize::A4).unwrap();
        assert_eq!(draws_per_page(&out.bytes), vec![0]);
        assert_eq!(out.blank_slots.len(), 1);
    }

    #[test]
    fn empty_document_has_no_pages() {
        let out = write_pdf(&Document::default(), &[], PageSize::A4).unwrap();
        let pdf = lopdf::Document::load_mem(&out.bytes).unwrap();
        assert!(pdf.get_pages().is_empty());
    }

    #[test]
    fn top_left_cell_maps_to_pdf_coordinates() {
        let p = GridLayout::default().place(0);
        let ops = draw_ops("Im0", &p, PageSize::A4.height * PT_PER_UNIT);
        let cm = &ops[1].operands;
        let x = cm[4].as_float().unwrap();
        let y = cm[5].as_float().unwrap();
        assert!((x - 5.0 * PT_PER_UNIT).abs() < 1e-3);
        assert!((y - (297.0 - 55.0) * PT_PER_UNIT).abs() < 1e-3);
    }
}
