//! Barcode rendering: canonical identifier → labelled grayscale raster.
//!
//! Symbology is chosen from the identifier's length alone: 12 digits is
//! UPC-A, 13 is EAN-13, anything else is rejected. Module patterns and check
//! digits come from `barcoders`; this module only paints them.
//!
//! UPC-A is the EAN-13 symbology with an implicit leading zero, so both are
//! encoded through `barcoders`' EAN-13 encoder. As with most barcode
//! libraries, the final check digit is always recomputed from the leading
//! digits rather than validated. The label is read back from the encoded
//! modules, so the printed digits are always the ones a scanner sees.
//!
//! ```text
//! ┌──────────────────────────────────┐
//! │ quiet ▌▌ ▌▌▌ ▌ ▌▌ ▌▌▌ ▌ ▌▌ quiet │  bar_height_px
//! │       ▌▌ ▌▌▌ ▌ ▌▌ ▌▌▌ ▌ ▌▌       │
//! ├──────────────────────────────────┤
//! │           012345678905           │  label_band_px
//! └──────────────────────────────────┘
//! ```

use crate::config::BarcodeStyle;
use crate::error::Upc2PdfError;
use crate::pipeline::normalize::{CanonicalIdentifier, EAN_13_LEN, UPC_A_LEN};
use barcoders::sym::ean13::EAN13;
use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Height of a label glyph in font pixels.
pub const GLYPH_HEIGHT: u32 = 7;
/// Width of a label glyph in font pixels.
pub const GLYPH_WIDTH: u32 = 5;
/// Blank font pixels between two glyphs.
const GLYPH_SPACING: u32 = 1;

/// Modules in an EAN-13 symbol, guards included.
const EAN_13_MODULES: usize = 95;
/// Width of one encoded digit in modules.
const DIGIT_MODULES: usize = 7;
/// Offset of the check digit: the last right-half digit before the end guard.
const CHECK_DIGIT_OFFSET: usize = EAN_13_MODULES - 3 - DIGIT_MODULES;

/// Right-half (R-code) patterns for digits 0-9.
const R_CODES: [[u8; 7]; 10] = [
    [1, 1, 1, 0, 0, 1, 0],
    [1, 1, 0, 0, 1, 1, 0],
    [1, 1, 0, 1, 1, 0, 0],
    [1, 0, 0, 0, 0, 1, 0],
    [1, 0, 1, 1, 1, 0, 0],
    [1, 0, 0, 1, 1, 1, 0],
    [1, 0, 1, 0, 0, 0, 0],
    [1, 0, 0, 0, 1, 0, 0],
    [1, 0, 0, 1, 0, 0, 0],
    [1, 1, 1, 0, 1, 0, 0],
];

const WHITE: Luma<u8> = Luma([255]);
const BLACK: Luma<u8> = Luma([0]);

/// 5 × 7 digit face; each row's low five bits, most significant bit leftmost.
const DIGITS: [[u8; 7]; 10] = [
    [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
    [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
    [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
    [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
    [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
    [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
    [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
    [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
    [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
    [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
];

/// The two supported 1-D retail symbologies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Symbology {
    UpcA,
    Ean13,
}

impl Symbology {
    /// Pick the symbology for an identifier by its length.
    pub fn for_identifier(id: &CanonicalIdentifier) -> Result<Self, Upc2PdfError> {
        match id.len() {
            UPC_A_LEN => Ok(Symbology::UpcA),
            EAN_13_LEN => Ok(Symbology::Ean13),
            n => Err(Upc2PdfError::UnsupportedIdentifier {
                identifier: id.to_string(),
                detail: format!("{n} digits; UPC-A needs {UPC_A_LEN}, EAN-13 needs {EAN_13_LEN}"),
            }),
        }
    }

    /// Digits handed to the encoder: everything but the check digit, with
    /// UPC-A widened to EAN-13 by a leading zero.
    fn encoder_payload(self, id: &str) -> String {
        match self {
            Symbology::UpcA => format!("0{}", &id[..UPC_A_LEN - 1]),
            Symbology::Ean13 => id[..EAN_13_LEN - 1].to_string(),
        }
    }

    /// Human-readable digits for an encoded payload: the payload plus the
    /// check digit, without the zero that widened UPC-A to EAN-13.
    fn label(self, payload: &str, check_digit: u8) -> String {
        let digits = match self {
            Symbology::UpcA => &payload[1..],
            Symbology::Ean13 => payload,
        };
        format!("{digits}{check_digit}")
    }
}

/// Read the check digit back out of an EAN-13 module sequence.
fn encoded_check_digit(modules: &[u8]) -> Option<u8> {
    if modules.len() != EAN_13_MODULES {
        return None;
    }
    let code = &modules[CHECK_DIGIT_OFFSET..CHECK_DIGIT_OFFSET + DIGIT_MODULES];
    R_CODES
        .iter()
        .position(|r| r[..] == *code)
        .map(|d| d as u8)
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Symbology::UpcA => "UPC-A",
            Symbology::Ean13 => "EAN-13",
        })
    }
}

/// A rendered barcode with its human-readable label painted underneath.
#[derive(Debug, Clone)]
pub struct BarcodeImage {
    pub identifier: CanonicalIdentifier,
    pub symbology: Symbology,
    /// Digits printed under the bars; differs from `identifier` only in the
    /// final digit, when the identifier carried a wrong check digit.
    pub label: String,
    pub image: GrayImage,
}

/// Render one identifier.
///
/// # Errors
/// [`Upc2PdfError::UnsupportedIdentifier`] when the identifier is not 12 or
/// 13 digits, or the encoder refuses it.
pub fn render(id: &CanonicalIdentifier, style: &BarcodeStyle) -> Result<BarcodeImage, Upc2PdfError> {
    let symbology = Symbology::for_identifier(id)?;
    let payload = symbology.encoder_payload(id.as_str());

    let modules = EAN13::new(payload.as_str())
        .map_err(|e| Upc2PdfError::UnsupportedIdentifier {
            identifier: id.to_string(),
            detail: format!("{symbology} encoder rejected {payload}: {e:?}"),
        })?
        .encode();

    let check_digit =
        encoded_check_digit(&modules).ok_or_else(|| Upc2PdfError::UnsupportedIdentifier {
            identifier: id.to_string(),
            detail: format!("{symbology} encoder produced an unreadable symbol for {payload}"),
        })?;
    let label = symbology.label(&payload, check_digit);
    if label != id.as_str() {
        warn!("{symbology} {id} has a wrong check digit; encoded as {label}");
    }

    let glyph_width = (modules.len() as u32 + 2 * style.quiet_zone_modules) * style.module_px;
    let mut image = GrayImage::from_pixel(
        glyph_width,
        style.bar_height_px + style.label_band_px,
        WHITE,
    );

    for (i, _) in modules.iter().enumerate().filter(|(_, m)| **m == 1) {
        let x0 = (style.quiet_zone_modules + i as u32) * style.module_px;
        fill_rect(&mut image, x0, 0, style.module_px, style.bar_height_px);
    }

    let scale = style.label_scale;
    let label_x = label_offset(glyph_width, label_width(label.len(), scale));
    let label_y = style.bar_height_px + style.label_band_px.saturating_sub(GLYPH_HEIGHT * scale) / 2;
    draw_label(&mut image, &label, label_x, label_y, scale);

    debug!(
        "Rendered {} {} → {}x{} px",
        symbology,
        id,
        image.width(),
        image.height()
    );

    Ok(BarcodeImage {
        identifier: id.clone(),
        symbology,
        label,
        image,
    })
}

/// Width in pixels of a label of `chars` digits at `scale`.
pub fn label_width(chars: usize, scale: u32) -> u32 {
    match chars as u32 {
        0 => 0,
        n => (n * (GLYPH_WIDTH + GLYPH_SPACING) - GLYPH_SPACING) * scale,
    }
}

/// Horizontal offset that centres a label under a glyph; 0 if it overflows.
pub fn label_offset(glyph_width: u32, label_width: u32) -> u32 {
    glyph_width.saturating_sub(label_width) / 2
}

fn draw_label(image: &mut GrayImage, text: &str, x: u32, y: u32, scale: u32) {
    let advance = (GLYPH_WIDTH + GLYPH_SPACING) * scale;
    for (n, digit) in text.chars().filter_map(|c| c.to_digit(10)).enumerate() {
        let gx = x + n as u32 * advance;
        for (row, bits) in DIGITS[digit as usize].iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if *bits & (1u8 << (GLYPH_WIDTH - 1 - col)) != 0 {
                    fill_rect(image, gx + col * scale, y + row as u32 * scale, scale, scale);
                }
            }
        }
    }
}

/// Paint a black rectangle, clipped to the image.
fn fill_rect(image: &mut GrayImage, x: u32, y: u32, w: u32, h: u32) {
    let x_end = (x + w).min(image.width());
    let y_end = (y + h).min(image.height());
    for py in y..y_end {
        for px in x..x_end {
            image.put_pixel(px, py, BLACK);
        }
    }
}
