//! Shared test utilities for the backdrop test suite.
//!
//! Synthetic images and option sets used across the imaging, batch and CLI
//! output tests.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let img = gradient_image(8, 8);
//! let out = process(&img, &identity_options()).unwrap();
//! assert_eq!(out, img);
//! ```

use std::path::Path;

use crate::imaging::{BackgroundMode, Image, ProcessingOptions};

// =========================================================================
// Images
// =========================================================================

/// A deterministic RGBA gradient.
///
/// Every channel varies across the image and alpha stays within `128..=255`,
/// so lossless codecs must reproduce each pixel exactly.
pub fn gradient_image(width: u32, height: u32) -> Image {
    Image::from_fn(width, height, |x, y| {
        image::Rgba([
            ((x * 255) / width.max(1)) as u8,
            ((y * 255) / height.max(1)) as u8,
            ((x + y) * 37 % 256) as u8,
            (128 + (x * 7 + y * 13) % 128) as u8,
        ])
    })
}

/// Encode `image` as PNG at `path`, creating parent directories.
pub fn write_png(path: &Path, image: &Image) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    image.save_with_format(path, image::ImageFormat::Png).unwrap();
}

// =========================================================================
// Options
// =========================================================================

/// Options under which [`process`](crate::imaging::process) leaves every pixel
/// untouched: custom mode with zero tolerance matches nothing, and every
/// optional stage is off.
pub fn identity_options() -> ProcessingOptions {
    ProcessingOptions {
        background_mode: BackgroundMode::Custom,
        tolerance: 0,
        invert_colors: false,
        ..ProcessingOptions::default()
    }
}
