//! Optional local assets and data-URI helpers
//!
//! The studio reads two optional files from configured paths: a logo image
//! composited over generated codes and a welcome audio clip embedded into
//! the page as a base64 data URI. A missing logo warns only when an overlay
//! is requested; a missing audio clip is tolerated with a log line.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::fs;
use std::path::{Path, PathBuf};

/// Resolved asset locations for one server instance.
#[derive(Debug, Clone)]
pub struct AssetCatalog {
    logo_path: PathBuf,
    audio_path: PathBuf,
}

impl AssetCatalog {
    /// Build a catalog from configured paths.
    pub fn new(logo_path: PathBuf, audio_path: PathBuf) -> Self {
        Self {
            logo_path,
            audio_path,
        }
    }

    /// Location of the logo overlay asset (may not exist).
    pub fn logo_path(&self) -> &Path {
        &self.logo_path
    }

    /// Read the welcome clip and encode it as an autoplay-ready data URI.
    ///
    /// Returns `None` when the file is absent or unreadable; the page then
    /// simply omits the audio element.
    pub fn audio_data_uri(&self) -> Option<String> {
        match fs::read(&self.audio_path) {
            Ok(bytes) => Some(format!("data:audio/mp3;base64,{}", BASE64.encode(bytes))),
            Err(err) => {
                tracing::debug!(
                    path = %self.audio_path.display(),
                    error = %err,
                    "Welcome audio asset unavailable"
                );
                None
            }
        }
    }
}

/// Encode PNG bytes as an inline `<img>`/download data URI.
pub fn png_data_uri(bytes: &[u8]) -> String {
    format!("data:image/png;base64,{}", BASE64.encode(bytes))
}
