//! Parameter types for the transform pipeline and the exporter.
//!
//! These structs describe *what* to do, not *how* to do it. They are the whole
//! contract between the host (CLI, config files, presets) and the pixel work in
//! [`pipeline`](super::pipeline) and [`export`](super::export).
//!
//! ## Types
//!
//! - [`BackgroundMode`]: How background pixels are recognised (black, white, custom key color).
//! - [`Rgb`]: An opaque color, written as `#RRGGBB` in config files.
//! - [`ProcessingOptions`]: Every pipeline stage switch and its parameters.
//! - [`Quality`]: Lossy encoding quality (1–100, default 95). Clamped on construction.
//! - [`SaveParameters`]: Quality + optimize flag handed to the exporter.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("invalid color '{0}': expected #RRGGBB")]
    InvalidColor(String),
    #[error("unknown background mode '{0}': expected black, white or custom")]
    UnknownMode(String),
}

/// Strategy for deciding which pixels are background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundMode {
    /// Near-black pixels are background; tolerance is an 8-bit channel ceiling.
    #[default]
    Black,
    /// Near-white pixels are background; tolerance is subtracted from 255.
    White,
    /// Pixels close to `custom_color` are background; tolerance is a percentage.
    Custom,
}

impl BackgroundMode {
    pub fn as_str(self) -> &'static str {
        match self {
            BackgroundMode::Black => "black",
            BackgroundMode::White => "white",
            BackgroundMode::Custom => "custom",
        }
    }
}

impl fmt::Display for BackgroundMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackgroundMode {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "black" => Ok(BackgroundMode::Black),
            "white" => Ok(BackgroundMode::White),
            "custom" => Ok(BackgroundMode::Custom),
            _ => Err(ParamError::UnknownMode(s.to_string())),
        }
    }
}

/// An opaque RGB color.
///
/// Serialized as a `#RRGGBB` hex string so config files stay readable.
/// Parsing is case-insensitive and the leading `#` is optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const BLACK: Rgb = Rgb([0, 0, 0]);
    pub const WHITE: Rgb = Rgb([255, 255, 255]);

    pub fn to_hex(self) -> String {
        let [r, g, b] = self.0;
        format!("#{r:02X}{g:02X}{b:02X}")
    }
}

impl FromStr for Rgb {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(ParamError::InvalidColor(s.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| ParamError::InvalidColor(s.to_string()))
        };
        Ok(Rgb([channel(0)?, channel(2)?, channel(4)?]))
    }
}

impl TryFrom<String> for Rgb {
    type Error = ParamError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_hex()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Configuration for one pass of the transform pipeline.
///
/// Field defaults match a fresh session: black background mode at tolerance 15
/// with inversion on, every optional stage off, crop rectangle `0,0 → 100,100`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingOptions {
    pub background_mode: BackgroundMode,
    /// Key color, only consulted in [`BackgroundMode::Custom`].
    pub custom_color: Rgb,
    /// Percentage (0–100) in custom mode, 8-bit channel threshold otherwise.
    pub tolerance: u8,

    pub resize: bool,
    pub width: u32,
    pub height: u32,

    /// Crop rectangle in absolute pixels of the (possibly resized) image.
    pub crop: bool,
    pub crop_left: u32,
    pub crop_top: u32,
    pub crop_right: u32,
    pub crop_bottom: u32,

    pub invert_colors: bool,

    pub adjust_alpha: bool,
    /// Alpha ceiling applied to every non-transparent pixel.
    pub alpha_value: u8,

    pub replace_background: bool,
    /// Opaque backdrop composited under the result.
    pub replacement_color: Rgb,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            background_mode: BackgroundMode::Black,
            custom_color: Rgb::BLACK,
            tolerance: 15,
            resize: false,
            width: 0,
            height: 0,
            crop: false,
            crop_left: 0,
            crop_top: 0,
            crop_right: 100,
            crop_bottom: 100,
            invert_colors: true,
            adjust_alpha: false,
            alpha_value: 255,
            replace_background: false,
            replacement_color: Rgb::WHITE,
        }
    }
}

impl ProcessingOptions {
    /// Target dimensions when the resize stage is active.
    pub fn resize_target(&self) -> Option<(u32, u32)> {
        (self.resize && self.width > 0 && self.height > 0).then_some((self.width, self.height))
    }

    /// Alpha ceiling when the alpha clamp stage is active.
    pub fn alpha_ceiling(&self) -> Option<u8> {
        (self.adjust_alpha && self.alpha_value < 255).then_some(self.alpha_value)
    }
}

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(95)
    }
}

/// Encoder settings for a single save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveParameters {
    /// Used by JPEG and WebP.
    pub quality: Quality,
    /// Used by PNG (compression effort) and JPEG.
    pub optimize: bool,
}

impl SaveParameters {
    pub fn new(quality: u32, optimize: bool) -> Self {
        Self {
            quality: Quality::new(quality),
            optimize,
        }
    }

    /// WebP switches to lossless encoding above quality 90.
    pub fn lossless(&self) -> bool {
        self.quality.value() > 90
    }
}

impl Default for SaveParameters {
    fn default() -> Self {
        Self {
            quality: Quality::default(),
            optimize: true,
        }
    }
}
