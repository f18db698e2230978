//! QR code decoder using rqrr
//!
//! Used by the `--verify` path and the test suite to prove that generated
//! images scan back to exactly the payload they were built from.

use crate::error::{Error, Result};
use image::RgbaImage;

/// QR code decoder
pub struct QrDecoder {
    // Configuration could go here (e.g., detection parameters)
}

impl QrDecoder {
    /// Create a new QR decoder with default settings
    pub fn new() -> Self {
        Self {}
    }

    /// Decode the payload string from a rendered QR image.
    pub fn decode(&self, image: &RgbaImage) -> Result<String> {
        let gray = image::DynamicImage::ImageRgba8(image.clone()).to_luma8();
        let mut prepared = rqrr::PreparedImage::prepare(gray);

        let grids = prepared.detect_grids();
        if grids.is_empty() {
            return Err(Error::NoQrCodeFound);
        }

        // Take the first detected QR code
        match grids[0].decode() {
            Ok((meta, content)) => {
                tracing::debug!(
                    version = ?meta.version,
                    ecc_level = meta.ecc_level,
                    length = content.len(),
                    "Decoded QR image"
                );
                Ok(content)
            }
            Err(e) => Err(Error::QrDecode(format!("Decode failed: {:?}", e))),
        }
    }
}

impl Default for QrDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::RgbColor;
    use crate::qr::{GenerateRequest, QrImageEncoder};
    use std::path::Path;

    fn generate(text: &str, fg: RgbColor, bg: RgbColor) -> RgbaImage {
        let encoder = QrImageEncoder::new("https://your-app-name.streamlit.app");
        let request = GenerateRequest {
            text: text.to_string(),
            foreground: fg,
            background: bg,
            add_logo: false,
        };
        encoder
            .generate(&request, Path::new("no-logo.png"))
            .unwrap()
            .0
    }

    #[test]
    fn decodes_generated_payload_exactly() {
        let image = generate(
            "hello",
            RgbColor::default_foreground(),
            RgbColor::default_background(),
        );
        let decoded = QrDecoder::new().decode(&image).unwrap();
        assert_eq!(decoded, "https://your-app-name.streamlit.app?data=hello");
    }

    #[test]
    fn special_characters_survive_the_round_trip() {
        let image = generate(
            "a b&c=d#e",
            RgbColor::new(0, 0, 0),
            RgbColor::new(255, 255, 255),
        );
        let decoded = QrDecoder::new().decode(&image).unwrap();
        assert_eq!(decoded, "https://your-app-name.streamlit.app?data=a b&c=d#e");
    }

    #[test]
    fn blank_image_reports_no_qr_code() {
        let blank = RgbaImage::from_pixel(64, 64, image::Rgba([255, 255, 255, 255]));
        match QrDecoder::new().decode(&blank) {
            Err(Error::NoQrCodeFound) => {}
            other => panic!("expected NoQrCodeFound, got {:?}", other.map(|_| ())),
        }
    }
}
