//! QR label rendering: text and filename formats plus PNG encoding.
//!
//! The text format is load-bearing — scanners in the field parse it —
//! so it is covered by exact-match tests and must not drift:
//! `"<part> - <vendor>-<year>-<serial>-<location>"`.

use std::io::Cursor;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};
use serde::Serialize;
use thiserror::Error;

use crate::serial::format_serial;

/// Pixels per QR module
const MODULE_SIZE: u32 = 10;

#[derive(Debug, Error)]
pub enum LabelError {
    #[error("QR encoding error: {0}")]
    Qr(#[from] qrcode::types::QrError),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),
}

/// One rendered label, as returned in the batch response.
#[derive(Debug, Clone, Serialize)]
pub struct QrLabel {
    pub qr_text: String,
    pub image_base64: String,
    pub serial_number: String,
    pub filename: String,
}

/// Scannable label text.
pub fn label_text(part: &str, vendor: &str, year: &str, serial: u64, location: &str) -> String {
    format!(
        "{} - {}-{}-{}-{}",
        part,
        vendor,
        year,
        format_serial(serial),
        location
    )
}

/// Download filename, with every literal space replaced by an
/// underscore.
pub fn label_filename(part: &str, vendor: &str, year: &str, serial: u64, location: &str) -> String {
    format!(
        "{}_{}_{}_{}_{}.png",
        part,
        vendor,
        year,
        format_serial(serial),
        location
    )
    .replace(' ', "_")
}

/// Render one serial into a QR label: text, base64 PNG, filename.
pub fn render_label(
    part: &str,
    vendor: &str,
    year: &str,
    serial: u64,
    location: &str,
) -> Result<QrLabel, LabelError> {
    let qr_text = label_text(part, vendor, year, serial, location);

    let code = QrCode::with_error_correction_level(qr_text.as_bytes(), EcLevel::L)?;
    let qr_image = code
        .render::<Luma<u8>>()
        .module_dimensions(MODULE_SIZE, MODULE_SIZE)
        .quiet_zone(true)
        .build();

    let mut png = Vec::new();
    DynamicImage::ImageLuma8(qr_image).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

    Ok(QrLabel {
        image_base64: STANDARD.encode(&png),
        serial_number: format_serial(serial),
        filename: label_filename(part, vendor, year, serial, location),
        qr_text,
    })
}
