//! qrforge - a self-hosted single-page QR code studio
//!
//! This library backs the `qrforge` binary: a one-page web form where a
//! user types text, picks two colors, optionally requests a logo overlay,
//! and receives a generated QR PNG plus a bar-chart history of everything
//! submitted in their session.
//!
//! # Features
//!
//! - **Colored rendering**: QR modules and background in any RGB pair
//! - **Logo overlay**: centered composite at a quarter of the symbol width
//! - **Session history**: append-only, per-session, chart-rendered
//! - **Verification**: generated images decode back to their exact payload
//!
//! # Example
//!
//! ```no_run
//! use qrforge::{GenerateRequest, QrImageEncoder, RgbColor};
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let encoder = QrImageEncoder::new("https://your-app-name.streamlit.app");
//!     let request = GenerateRequest {
//!         text: "hello".to_string(),
//!         foreground: RgbColor::default_foreground(),
//!         background: RgbColor::default_background(),
//!         add_logo: false,
//!     };
//!     let (image, _warnings) = encoder.generate(&request, Path::new("logo.png"))?;
//!     image.save("qr_output.png")?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs, rust_2024_compatibility)]

pub mod assets;
pub mod color;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod qr;
pub mod server;
pub mod session;
pub mod speech;

// Re-exports for convenience
pub use color::RgbColor;
pub use config::{AppOptions, ForgeConfig, LogRotation, LoggingOptions, ServerOptions};
pub use error::{Error, Result};
pub use qr::{GenerateRequest, PngArtifact, QrDecoder, QrImageEncoder, QrRenderOptions, Warning};
pub use server::{StudioServer, StudioState};
pub use session::{SessionId, SessionState, SessionStore};
