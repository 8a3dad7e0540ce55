//! The canonical in-memory image and the decoder that produces it.
//!
//! Every pipeline stage reads and writes [`Image`]: a width × height grid of
//! RGBA pixels, 8 bits per channel. Decoding normalizes whatever the source
//! holds (indexed, grayscale, RGB without alpha, 16-bit) to that layout and
//! synthesizes full opacity where the source had no alpha.
//!
//! ## Crate mapping
//!
//! | Format | Decoder |
//! |---|---|
//! | PNG, JPEG, WebP, TIFF, BMP | `image` crate (pure Rust decoders) |
//!
//! The format is sniffed from the file contents first, so a PNG saved with a
//! `.jpg` extension still decodes.

use image::{ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

/// RGBA, 8 bits per channel, row-major.
pub type Image = image::RgbaImage;

/// Source bytes that could not be turned into an [`Image`].
#[derive(Error, Debug)]
#[error("failed to decode {}: {cause}", path.display())]
pub struct DecodeError {
    pub path: PathBuf,
    #[source]
    pub cause: image::ImageError,
}

impl DecodeError {
    fn new(path: &Path, cause: impl Into<image::ImageError>) -> Self {
        Self {
            path: path.to_path_buf(),
            cause: cause.into(),
        }
    }
}

/// Extensions whose decoders are compiled in.
const INPUT_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("png", ImageFormat::Png),
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("webp", ImageFormat::WebP),
    ("tiff", ImageFormat::Tiff),
    ("tif", ImageFormat::Tiff),
    ("bmp", ImageFormat::Bmp),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    INPUT_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Whether `path` has one of the [`supported_input_extensions`] (case-insensitive).
pub fn is_supported_input(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
}

/// Load and decode an image from disk.
pub fn load(path: &Path) -> Result<Image, DecodeError> {
    let reader = ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| DecodeError::new(path, e))?;
    let decoded = reader.decode().map_err(|e| DecodeError::new(path, e))?;
    tracing::debug!(
        path = %path.display(),
        width = decoded.width(),
        height = decoded.height(),
        color = ?decoded.color(),
        "decoded image"
    );
    Ok(decoded.into_rgba8())
}

/// Decode an image held in memory, sniffing the format from its header.
pub fn load_from_memory(bytes: &[u8]) -> Result<Image, DecodeError> {
    let source = Path::new("<memory>");
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::new(source, e))?;
    let decoded = reader.decode().map_err(|e| DecodeError::new(source, e))?;
    Ok(decoded.into_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageEncoder, Luma, RgbImage};

    #[test]
    fn supported_extensions_match_decodable_formats() {
        let exts = supported_input_extensions();
        for expected in &["png", "jpg", "jpeg", "webp", "tiff", "bmp"] {
            assert!(
                exts.contains(expected),
                "expected {expected} in supported extensions"
            );
        }
    }

    #[test]
    fn is_supported_input_ignores_case() {
        assert!(is_supported_input(Path::new("a/B.PNG")));
        assert!(is_supported_input(Path::new("photo.JpEg")));
        assert!(!is_supported_input(Path::new("notes.txt")));
        assert!(!is_supported_input(Path::new("no_extension")));
    }

    #[test]
    fn rgb_source_gains_opaque_alpha() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("rgb.png");
        RgbImage::from_pixel(3, 2, image::Rgb([10, 20, 30]))
            .save(&path)
            .unwrap();

        let img = load(&path).unwrap();
        assert_eq!(img.dimensions(), (3, 2));
        assert!(img.pixels().all(|p| p.0 == [10, 20, 30, 255]));
    }

    #[test]
    fn grayscale_source_expands_to_rgba() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("gray.png");
        GrayImage::from_pixel(2, 2, Luma([77])).save(&path).unwrap();

        let img = load(&path).unwrap();
        assert!(img.pixels().all(|p| p.0 == [77, 77, 77, 255]));
    }

    #[test]
    fn format_is_sniffed_from_contents() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("actually_png.jpg");
        let file = std::fs::File::create(&path).unwrap();
        image::codecs::png::PngEncoder::new(file)
            .write_image(&[1, 2, 3, 4], 1, 1, image::ExtendedColorType::Rgba8)
            .unwrap();

        let img = load(&path).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [1, 2, 3, 4]);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load(Path::new("/nonexistent/image.png")).unwrap_err();
        assert_eq!(err.path, Path::new("/nonexistent/image.png"));
        assert!(matches!(err.cause, image::ImageError::IoError(_)));
    }

    #[test]
    fn truncated_file_is_decode_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("broken.png");
        let mut bytes = Vec::new();
        image::codecs::png::PngEncoder::new(&mut bytes)
            .write_image(&[0; 64 * 4], 8, 8, image::ExtendedColorType::Rgba8)
            .unwrap();
        bytes.truncate(bytes.len() / 2);
        std::fs::write(&path, bytes).unwrap();

        assert!(load(&path).is_err());
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        let err = load_from_memory(b"definitely not an image").unwrap_err();
        assert_eq!(err.path, Path::new("<memory>"));
    }
}
