//! Pure per-pixel functions.
//!
//! All functions here are pure and testable without any I/O or images. The
//! pipeline maps them over every pixel; nothing here depends on neighbours.

use super::params::{BackgroundMode, Rgb};
use image::Rgba;

/// Output for background pixels.
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Background test resolved from a mode, a tolerance and a key color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Classifier {
    /// Background iff every channel `<= ceiling`.
    Black { ceiling: u8 },
    /// Background iff every channel `>= floor`.
    White { floor: u8 },
    /// Background iff the normalized distance to `key` is `< radius`.
    Custom { key: [u8; 3], radius: f64 },
}

impl Classifier {
    pub fn new(mode: BackgroundMode, tolerance: u8, custom_color: Rgb) -> Self {
        match mode {
            BackgroundMode::Black => Classifier::Black {
                ceiling: tolerance,
            },
            BackgroundMode::White => Classifier::White {
                floor: 255 - tolerance,
            },
            BackgroundMode::Custom => Classifier::Custom {
                key: custom_color.0,
                radius: f64::from(tolerance) / 100.0,
            },
        }
    }

    pub fn is_background(&self, [r, g, b]: [u8; 3]) -> bool {
        match *self {
            Classifier::Black { ceiling } => r <= ceiling && g <= ceiling && b <= ceiling,
            Classifier::White { floor } => r >= floor && g >= floor && b >= floor,
            Classifier::Custom { key, radius } => color_distance([r, g, b], key) < radius,
        }
    }
}

/// Euclidean distance in RGB with every channel scaled to `0.0..=1.0`.
///
/// Ranges from `0.0` (identical) to `sqrt(3)` (black vs. white).
pub fn color_distance(a: [u8; 3], b: [u8; 3]) -> f64 {
    let channel = |i: usize| (f64::from(a[i]) - f64::from(b[i])) / 255.0;
    let (dr, dg, db) = (channel(0), channel(1), channel(2));
    (dr * dr + dg * dg + db * db).sqrt()
}

/// Classify one pixel and optionally invert it.
///
/// Background becomes [`TRANSPARENT`]. Foreground passes through, or is
/// inverted when `invert` is set. In black mode near-white foreground turns
/// opaque black, and in white mode near-black turns opaque white, instead of
/// a plain inversion.
pub fn classify(pixel: Rgba<u8>, classifier: &Classifier, invert: bool) -> Rgba<u8> {
    let Rgba([r, g, b, a]) = pixel;
    if classifier.is_background([r, g, b]) {
        return TRANSPARENT;
    }
    if !invert {
        return pixel;
    }
    match classifier {
        Classifier::Black { .. } if r > 240 && g > 240 && b > 240 => Rgba([0, 0, 0, 255]),
        Classifier::White { .. } if r < 15 && g < 15 && b < 15 => Rgba([255, 255, 255, 255]),
        _ => Rgba([255 - r, 255 - g, 255 - b, a]),
    }
}

/// Cap alpha at `ceiling`, leaving fully transparent pixels alone.
pub fn clamp_alpha(pixel: Rgba<u8>, ceiling: u8) -> Rgba<u8> {
    let Rgba([r, g, b, a]) = pixel;
    if a == 0 {
        return pixel;
    }
    Rgba([r, g, b, a.min(ceiling)])
}

/// Alpha-over onto an opaque backdrop: `src * a + dst * (1 - a)`, rounded.
///
/// The result is always fully opaque.
pub fn composite_over(pixel: Rgba<u8>, backdrop: Rgb) -> Rgba<u8> {
    let Rgba([r, g, b, a]) = pixel;
    let alpha = u32::from(a);
    let blend = |src: u8, dst: u8| {
        ((u32::from(src) * alpha + u32::from(dst) * (255 - alpha) + 127) / 255) as u8
    };
    let [br, bg, bb] = backdrop.0;
    Rgba([blend(r, br), blend(g, bg), blend(b, bb), 255])
}
