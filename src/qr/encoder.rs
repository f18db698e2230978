//! QR code encoder with colored rendering and logo overlay

use crate::error::{Error, Result};
use crate::qr::{GenerateRequest, Warning, payload_url};
use bytes::Bytes;
use image::imageops::FilterType;
use image::{ImageFormat, Rgba, RgbaImage, imageops};
use qrcode::QrCode;
use std::io::Cursor;
use std::path::Path;

/// Fixed rendering geometry applied to every generated symbol.
#[derive(Debug, Clone, Copy)]
pub struct QrRenderOptions {
    /// Side length of one QR module in pixels
    pub module_size: u32,
    /// Whether to surround the symbol with a quiet zone border
    pub quiet_zone: bool,
    /// Error correction level
    pub ec_level: qrcode::EcLevel,
}

impl Default for QrRenderOptions {
    fn default() -> Self {
        Self {
            module_size: 10,
            quiet_zone: true,
            ec_level: qrcode::EcLevel::M,
        }
    }
}

/// QR code encoder
///
/// Symbol construction is delegated to the `qrcode` crate in fit mode: the
/// smallest version that holds the payload is chosen automatically.
pub struct QrImageEncoder {
    options: QrRenderOptions,
    base_url: String,
}

impl QrImageEncoder {
    /// Create an encoder embedding payloads under the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            options: QrRenderOptions::default(),
            base_url: base_url.into(),
        }
    }

    /// Create an encoder with explicit rendering options.
    pub fn with_options(base_url: impl Into<String>, options: QrRenderOptions) -> Self {
        Self {
            options,
            base_url: base_url.into(),
        }
    }

    /// The payload string a request will embed.
    pub fn payload_for(&self, text: &str) -> String {
        payload_url(&self.base_url, text)
    }

    /// Render a request into an RGBA bitmap.
    ///
    /// Empty input is rejected one level up, before this is invoked. The
    /// logo overlay is skipped with a [`Warning::LogoMissing`] when the
    /// asset is absent; generation itself still succeeds.
    pub fn generate(
        &self,
        request: &GenerateRequest,
        logo_path: &Path,
    ) -> Result<(RgbaImage, Vec<Warning>)> {
        let payload = self.payload_for(&request.text);
        let code = QrCode::with_error_correction_level(payload.as_bytes(), self.options.ec_level)
            .map_err(|e| Error::QrEncode(format!("Failed to create QR code: {}", e)))?;

        let mut image: RgbaImage = code
            .render::<Rgba<u8>>()
            .module_dimensions(self.options.module_size, self.options.module_size)
            .quiet_zone(self.options.quiet_zone)
            .dark_color(request.foreground.to_rgba())
            .light_color(request.background.to_rgba())
            .build();

        let mut warnings = Vec::new();
        if request.add_logo {
            if logo_path.exists() {
                overlay_logo(&mut image, logo_path)?;
            } else {
                warnings.push(Warning::LogoMissing);
            }
        }

        Ok((image, warnings))
    }

    /// Encode a bitmap as PNG bytes in memory.
    pub fn to_png_bytes(image: &RgbaImage) -> Result<Bytes> {
        let mut cursor = Cursor::new(Vec::new());
        image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|e| Error::Image(format!("PNG encoding failed: {}", e)))?;
        Ok(Bytes::from(cursor.into_inner()))
    }
}

/// Composite the logo asset over the center of a rendered symbol.
///
/// The logo is resized to exactly one quarter of the QR image's width
/// (square) and pasted centered using its own alpha channel as the mask.
fn overlay_logo(image: &mut RgbaImage, logo_path: &Path) -> Result<()> {
    let logo = image::open(logo_path)
        .map_err(|e| Error::Image(format!("Failed to open {}: {}", logo_path.display(), e)))?
        .to_rgba8();

    let logo_size = image.width() / 4;
    let logo = imageops::resize(&logo, logo_size, logo_size, FilterType::Lanczos3);

    let x = (image.width() - logo_size) / 2;
    let y = (image.height() - logo_size) / 2;
    imageops::overlay(image, &logo, i64::from(x), i64::from(y));

    Ok(())
}
