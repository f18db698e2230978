//! Strictly-typed color values parsed at the form boundary

use crate::error::{Error, Result};
use image::Rgba;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An opaque RGB color as picked in the form's color widgets.
///
/// Widget values arrive as loosely-typed `#RRGGBB` strings; they are parsed
/// into this type before any of them reach generation logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RgbColor {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl RgbColor {
    /// Construct from explicit channel values.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// The studio's signature orange, used as the default foreground.
    pub const fn default_foreground() -> Self {
        Self::new(0xFF, 0x8A, 0x00)
    }

    /// Plain white, used as the default background.
    pub const fn default_background() -> Self {
        Self::new(0xFF, 0xFF, 0xFF)
    }

    /// Parse a `#RRGGBB` hex string (leading `#` optional).
    pub fn parse(value: &str) -> Result<Self> {
        let digits = value.trim().strip_prefix('#').unwrap_or(value.trim());
        if digits.len() != 6 {
            return Err(Error::Color(format!(
                "Expected #RRGGBB, got '{}'",
                value.trim()
            )));
        }
        let bytes = hex::decode(digits)?;
        Ok(Self::new(bytes[0], bytes[1], bytes[2]))
    }

    /// Fully opaque RGBA pixel for image rendering.
    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, 0xFF])
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for RgbColor {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

impl TryFrom<String> for RgbColor {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<RgbColor> for String {
    fn from(color: RgbColor) -> Self {
        color.to_string()
    }
}
