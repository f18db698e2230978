//! QR image generation and verification
//!
//! This module turns a validated form submission into a colored QR bitmap,
//! optionally composited with a logo overlay, and provides the matching
//! decoder used to verify that generated images scan back to their payload.

mod decoder;
mod encoder;

pub use decoder::QrDecoder;
pub use encoder::{QrImageEncoder, QrRenderOptions};

use crate::color::RgbColor;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Build the payload string embedded in every generated QR code.
///
/// The user's text is carried verbatim in the `data` query parameter; no
/// percent-encoding is applied, special characters pass straight through
/// into the QR payload.
pub fn payload_url(base_url: &str, text: &str) -> String {
    format!("{base_url}?data={text}")
}

/// A validated generation request, parsed from the form boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Raw text or URL to embed (non-empty once it reaches the generator)
    pub text: String,
    /// Module (dark) color
    pub foreground: RgbColor,
    /// Background (light) color
    pub background: RgbColor,
    /// Whether to composite the logo asset over the center
    pub add_logo: bool,
}

/// Non-fatal conditions surfaced to the user as warning banners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Submitted with nothing to encode
    EmptyInput,
    /// Overlay requested but the logo asset is not on disk
    LogoMissing,
    /// A color field failed to parse and fell back to its default
    InvalidColor(String),
    /// The underlying encoder rejected the payload
    GenerationFailed(String),
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::EmptyInput => {
                write!(f, "Please enter some text or a URL!")
            }
            Warning::LogoMissing => {
                write!(f, "Logo file not found! Add 'logo.png' to the project directory.")
            }
            Warning::InvalidColor(value) => {
                write!(f, "Ignoring invalid color value '{value}'.")
            }
            Warning::GenerationFailed(reason) => {
                write!(f, "Could not generate a QR code: {reason}")
            }
        }
    }
}

/// An in-memory PNG produced by one generation, held only until rendered
/// or downloaded. Never written to disk by the server.
#[derive(Debug, Clone)]
pub struct PngArtifact {
    /// Encoded PNG bytes
    pub bytes: Bytes,
    /// Freshly generated download filename, `qrcode_<32 hex>.png`
    pub filename: String,
}

impl PngArtifact {
    /// Wrap PNG bytes with a collision-resistant download filename.
    pub fn new(bytes: Bytes) -> Self {
        Self {
            bytes,
            filename: format!("qrcode_{}.png", Uuid::new_v4().simple()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_concatenates_without_escaping() {
        let url = payload_url("https://your-app-name.streamlit.app", "hello world & more");
        assert_eq!(
            url,
            "https://your-app-name.streamlit.app?data=hello world & more"
        );
    }

    #[test]
    fn artifact_filenames_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            let artifact = PngArtifact::new(Bytes::from_static(b"png"));
            assert!(artifact.filename.starts_with("qrcode_"));
            assert!(artifact.filename.ends_with(".png"));
            assert_eq!(artifact.filename.len(), "qrcode_".len() + 32 + ".png".len());
            assert!(seen.insert(artifact.filename));
        }
    }
}
