//! Exporter: format resolution, per-format encoding policy, and the file write.
//!
//! | Format | Encoder | Alpha | Parameters |
//! |---|---|---|---|
//! | PNG | `image::codecs::png` | kept | `optimize` → best compression |
//! | JPEG | `image::codecs::jpeg` | flattened onto white | `quality` |
//! | WebP | `webp` (libwebp) | kept | `quality`, lossless when quality > 90 |
//! | TIFF | `image::codecs::tiff` | kept | none |
//! | BMP | `image::codecs::bmp` | written, but not reliably read back by other tools | none |
//!
//! Format names are matched case-insensitively; anything unrecognised falls
//! back to PNG. The destination's extension is always rewritten to match the
//! format actually written.

use super::buffer::Image;
use super::params::{Rgb, SaveParameters};
use super::pixel;
use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::codecs::tiff::TiffEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage};
use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{format} encoding failed: {cause}")]
    Codec { format: OutputFormat, cause: String },
}

/// Raster formats the exporter can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Png,
    Jpeg,
    WebP,
    Tiff,
    Bmp,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 5] = [
        OutputFormat::Png,
        OutputFormat::Jpeg,
        OutputFormat::WebP,
        OutputFormat::Tiff,
        OutputFormat::Bmp,
    ];

    /// Exact lookup of a format name, `None` when unrecognised.
    pub fn lookup(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "png" => Some(OutputFormat::Png),
            "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
            "webp" => Some(OutputFormat::WebP),
            "tiff" => Some(OutputFormat::Tiff),
            "bmp" => Some(OutputFormat::Bmp),
            _ => None,
        }
    }

    /// Resolve a format name, falling back to PNG.
    pub fn from_name(name: &str) -> Self {
        Self::lookup(name).unwrap_or(OutputFormat::Png)
    }

    /// Canonical file extension.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::WebP => "webp",
            OutputFormat::Tiff => "tiff",
            OutputFormat::Bmp => "bmp",
        }
    }

    pub fn supports_alpha(self) -> bool {
        !matches!(self, OutputFormat::Jpeg | OutputFormat::Bmp)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Png => "PNG",
            OutputFormat::Jpeg => "JPEG",
            OutputFormat::WebP => "WEBP",
            OutputFormat::Tiff => "TIFF",
            OutputFormat::Bmp => "BMP",
        })
    }
}

/// Extension written for a requested format name.
///
/// A recognised name keeps its own spelling (`jpeg` stays `jpeg`), an
/// unrecognised one gets the extension of the PNG fallback.
pub fn extension_for(format_name: &str) -> String {
    match OutputFormat::lookup(format_name) {
        Some(_) => format_name.trim().to_ascii_lowercase(),
        None => OutputFormat::Png.extension().to_string(),
    }
}

/// Resolve `format_name` and rewrite the extension of `destination` to match.
pub fn resolve_destination(destination: &Path, format_name: &str) -> (OutputFormat, PathBuf) {
    (
        OutputFormat::from_name(format_name),
        destination.with_extension(extension_for(format_name)),
    )
}

/// Encode `image` into an in-memory file of the given format.
pub fn encode(
    image: &Image,
    format: OutputFormat,
    params: &SaveParameters,
) -> Result<Vec<u8>, EncodeError> {
    let (width, height) = image.dimensions();
    let codec = |e: image::ImageError| EncodeError::Codec {
        format,
        cause: e.to_string(),
    };
    let mut bytes = Vec::new();

    match format {
        OutputFormat::Png => {
            let compression = if params.optimize {
                CompressionType::Best
            } else {
                CompressionType::Default
            };
            PngEncoder::new_with_quality(&mut bytes, compression, PngFilter::Adaptive)
                .write_image(image.as_raw(), width, height, ExtendedColorType::Rgba8)
                .map_err(codec)?;
        }
        OutputFormat::Jpeg => {
            let flat = flatten(image, Rgb::WHITE);
            JpegEncoder::new_with_quality(&mut bytes, params.quality.value() as u8)
                .write_image(flat.as_raw(), width, height, ExtendedColorType::Rgb8)
                .map_err(codec)?;
        }
        OutputFormat::WebP => {
            let lossless = params.lossless();
            let encoded = webp::Encoder::from_rgba(image.as_raw(), width, height)
                .encode_simple(lossless, params.quality.value() as f32)
                .map_err(|e| EncodeError::Codec {
                    format,
                    cause: format!("{e:?}"),
                })?;
            bytes.extend_from_slice(&encoded);
        }
        OutputFormat::Tiff => {
            TiffEncoder::new(Cursor::new(&mut bytes))
                .write_image(image.as_raw(), width, height, ExtendedColorType::Rgba8)
                .map_err(codec)?;
        }
        OutputFormat::Bmp => {
            BmpEncoder::new(&mut bytes)
                .write_image(image.as_raw(), width, height, ExtendedColorType::Rgba8)
                .map_err(codec)?;
        }
    }

    tracing::debug!(%format, width, height, bytes = bytes.len(), "encoded image");
    Ok(bytes)
}

/// Encode and write `image` next to `destination`, returning the final path.
///
/// The returned path carries the extension of the resolved format, whatever
/// extension `destination` had.
pub fn save(
    image: &Image,
    destination: &Path,
    format_name: &str,
    params: &SaveParameters,
) -> Result<PathBuf, EncodeError> {
    let (format, path) = resolve_destination(destination, format_name);
    let bytes = encode(image, format, params)?;
    std::fs::write(&path, bytes).map_err(|source| EncodeError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Drop alpha by compositing onto an opaque backdrop.
fn flatten(image: &Image, backdrop: Rgb) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, _] = pixel::composite_over(*image.get_pixel(x, y), backdrop).0;
        image::Rgb([r, g, b])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::buffer;
    use crate::test_helpers::gradient_image;
    use image::Rgba;

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(OutputFormat::lookup("PNG"), Some(OutputFormat::Png));
        assert_eq!(OutputFormat::lookup("Jpg"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::lookup("jpeg"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::lookup("WebP"), Some(OutputFormat::WebP));
        assert_eq!(OutputFormat::lookup("tiff"), Some(OutputFormat::Tiff));
        assert_eq!(OutputFormat::lookup("BMP"), Some(OutputFormat::Bmp));
    }

    #[test]
    fn unknown_format_falls_back_to_png() {
        assert_eq!(OutputFormat::from_name("gif"), OutputFormat::Png);
        assert_eq!(OutputFormat::from_name(""), OutputFormat::Png);
        assert_eq!(extension_for("gif"), "png");
    }

    #[test]
    fn extension_keeps_requested_jpeg_spelling() {
        assert_eq!(extension_for("JPEG"), "jpeg");
        assert_eq!(extension_for("jpg"), "jpg");
    }

    #[test]
    fn destination_extension_is_rewritten() {
        let (fmt, path) = resolve_destination(Path::new("out/result.png"), "webp");
        assert_eq!(fmt, OutputFormat::WebP);
        assert_eq!(path, Path::new("out/result.webp"));

        let (_, path) = resolve_destination(Path::new("noext"), "bmp");
        assert_eq!(path, Path::new("noext.bmp"));
    }

    #[test]
    fn png_encoding_preserves_pixels() {
        let img = gradient_image(9, 7);
        let bytes = encode(&img, OutputFormat::Png, &SaveParameters::default()).unwrap();
        assert_eq!(buffer::load_from_memory(&bytes).unwrap(), img);
    }

    #[test]
    fn png_optimize_does_not_change_pixels() {
        let img = gradient_image(9, 7);
        let fast = encode(&img, OutputFormat::Png, &SaveParameters::new(95, false)).unwrap();
        assert_eq!(buffer::load_from_memory(&fast).unwrap(), img);
    }

    #[test]
    fn jpeg_flattens_transparency_onto_white() {
        let img = Image::from_pixel(8, 8, Rgba([0, 0, 0, 0]));
        let bytes = encode(&img, OutputFormat::Jpeg, &SaveParameters::new(100, true)).unwrap();
        let decoded = buffer::load_from_memory(&bytes).unwrap();
        for px in decoded.pixels() {
            assert_eq!(px.0[3], 255);
            assert!(px.0[..3].iter().all(|&c| c >= 250), "got {:?}", px.0);
        }
    }

    #[test]
    fn flatten_blends_partial_alpha() {
        let img = Image::from_pixel(1, 1, Rgba([0, 0, 0, 128]));
        let flat = flatten(&img, Rgb::WHITE);
        assert_eq!(flat.get_pixel(0, 0).0, [127, 127, 127]);
    }

    #[test]
    fn webp_lossless_above_90_is_exact() {
        let img = gradient_image(12, 12);
        let bytes = encode(&img, OutputFormat::WebP, &SaveParameters::new(91, true)).unwrap();
        assert_eq!(buffer::load_from_memory(&bytes).unwrap(), img);
    }

    /// Chunk tags of a RIFF/WEBP file, in order.
    fn webp_chunks(bytes: &[u8]) -> Vec<[u8; 4]> {
        assert_eq!(&bytes[..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WEBP");
        let mut chunks = Vec::new();
        let mut at = 12;
        while at + 8 <= bytes.len() {
            let tag: [u8; 4] = bytes[at..at + 4].try_into().unwrap();
            let size = u32::from_le_bytes(bytes[at + 4..at + 8].try_into().unwrap()) as usize;
            chunks.push(tag);
            at += 8 + size + (size & 1);
        }
        chunks
    }

    #[test]
    fn webp_lossy_at_90_decodes() {
        let img = gradient_image(12, 12);
        let bytes = encode(&img, OutputFormat::WebP, &SaveParameters::new(90, true)).unwrap();
        let chunks = webp_chunks(&bytes);
        assert!(chunks.contains(b"VP8 "), "{chunks:?}");
        assert!(!chunks.contains(b"VP8L"), "{chunks:?}");
        assert_eq!(buffer::load_from_memory(&bytes).unwrap().dimensions(), (12, 12));
    }

    #[test]
    fn webp_codec_switches_at_91() {
        let img = gradient_image(12, 12);
        let lossless = encode(&img, OutputFormat::WebP, &SaveParameters::new(91, true)).unwrap();
        let chunks = webp_chunks(&lossless);
        assert!(chunks.contains(b"VP8L"), "{chunks:?}");
        assert!(!chunks.contains(b"VP8 "), "{chunks:?}");
    }

    #[test]
    fn tiff_round_trips() {
        let img = gradient_image(5, 4);
        let bytes = encode(&img, OutputFormat::Tiff, &SaveParameters::default()).unwrap();
        assert_eq!(buffer::load_from_memory(&bytes).unwrap(), img);
    }

    #[test]
    fn bmp_writes_readable_file() {
        let img = Image::from_pixel(3, 3, Rgba([10, 20, 30, 255]));
        let bytes = encode(&img, OutputFormat::Bmp, &SaveParameters::default()).unwrap();
        assert_eq!(&bytes[..2], b"BM");
        let decoded = buffer::load_from_memory(&bytes).unwrap();
        assert!(decoded.pixels().all(|p| p.0[..3] == [10, 20, 30]));
    }

    #[test]
    fn save_returns_rewritten_path() {
        let tmp = tempfile::TempDir::new().unwrap();
        let img = gradient_image(4, 4);
        let saved = save(
            &img,
            &tmp.path().join("out.png"),
            "WEBP",
            &SaveParameters::default(),
        )
        .unwrap();
        assert_eq!(saved, tmp.path().join("out.webp"));
        assert!(saved.exists());
        assert!(!tmp.path().join("out.png").exists());
    }

    #[test]
    fn save_into_missing_directory_is_io_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let img = gradient_image(2, 2);
        let err = save(
            &img,
            &tmp.path().join("missing/dir/out.png"),
            "png",
            &SaveParameters::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EncodeError::Io { .. }));
    }
}
