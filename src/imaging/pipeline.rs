//! The transform pipeline: Resize → Crop → Background → Alpha → Backdrop.
//!
//! [`process`] is a pure function of `(Image, ProcessingOptions)`. Each stage
//! has its own switch in [`ProcessingOptions`] but the order is fixed. Every
//! stage returns a fresh [`Image`]; the caller's input is never touched, and a
//! failing stage aborts the whole run with nothing persisted.
//!
//! Stages three to five are pointwise and delegate to [`pixel`](super::pixel).

use super::buffer::Image;
use super::params::{ProcessingOptions, Rgb};
use super::pixel::{self, Classifier};
use image::Rgba;
use image::imageops::{self, FilterType};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error(
        "invalid crop region ({left}, {top}) → ({right}, {bottom}) for a {width}x{height} image"
    )]
    InvalidRegion {
        left: u32,
        top: u32,
        right: u32,
        bottom: u32,
        width: u32,
        height: u32,
    },
}

/// A crop rectangle, right/bottom exclusive, in absolute pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropRegion {
    pub fn from_options(options: &ProcessingOptions) -> Self {
        Self {
            left: options.crop_left,
            top: options.crop_top,
            right: options.crop_right,
            bottom: options.crop_bottom,
        }
    }

    /// Clamp to a `width` × `height` image, as `(x, y, w, h)`.
    ///
    /// Returns `None` when nothing of positive area remains.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let left = self.left.min(width);
        let top = self.top.min(height);
        let right = self.right.min(width);
        let bottom = self.bottom.min(height);
        (right > left && bottom > top).then(|| (left, top, right - left, bottom - top))
    }
}

/// Run every enabled stage in order.
pub fn process(image: &Image, options: &ProcessingOptions) -> Result<Image, PipelineError> {
    let mut current = match options.resize_target() {
        Some((width, height)) => resize(image, width, height),
        None => image.clone(),
    };

    if options.crop {
        current = crop(&current, CropRegion::from_options(options))?;
    }

    current = remove_background(&current, options);

    if let Some(ceiling) = options.alpha_ceiling() {
        current = clamp_alpha(&current, ceiling);
    }

    if options.replace_background {
        current = composite_onto(&current, options.replacement_color);
    }

    Ok(current)
}

/// Resample to exactly `width` × `height` with Lanczos3. Aspect ratio is not kept.
pub fn resize(image: &Image, width: u32, height: u32) -> Image {
    tracing::debug!(
        from = ?image.dimensions(),
        to = ?(width, height),
        "resize"
    );
    imageops::resize(image, width, height, FilterType::Lanczos3)
}

/// Extract `region`, clamped to the image bounds.
pub fn crop(image: &Image, region: CropRegion) -> Result<Image, PipelineError> {
    let (width, height) = image.dimensions();
    let (x, y, w, h) = region
        .clamp_to(width, height)
        .ok_or(PipelineError::InvalidRegion {
            left: region.left,
            top: region.top,
            right: region.right,
            bottom: region.bottom,
            width,
            height,
        })?;
    tracing::debug!(x, y, w, h, "crop");
    Ok(imageops::crop_imm(image, x, y, w, h).to_image())
}

/// Background classification and optional inversion of the foreground.
pub fn remove_background(image: &Image, options: &ProcessingOptions) -> Image {
    let classifier = Classifier::new(
        options.background_mode,
        options.tolerance,
        options.custom_color,
    );
    let invert = options.invert_colors;
    map_pixels(image, |px| pixel::classify(px, &classifier, invert))
}

/// Cap the alpha of every visible pixel at `ceiling`.
pub fn clamp_alpha(image: &Image, ceiling: u8) -> Image {
    map_pixels(image, |px| pixel::clamp_alpha(px, ceiling))
}

/// Composite over an opaque `backdrop`, leaving no transparency.
pub fn composite_onto(image: &Image, backdrop: Rgb) -> Image {
    map_pixels(image, |px| pixel::composite_over(px, backdrop))
}

fn map_pixels(image: &Image, f: impl Fn(Rgba<u8>) -> Rgba<u8>) -> Image {
    let mut out = image.clone();
    for px in out.pixels_mut() {
        *px = f(*px);
    }
    out
}
