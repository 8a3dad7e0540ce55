//! Production codec backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (PNG, JPEG, WebP, TIFF, BMP) | `image::ImageReader` with content sniffing |
//! | Encode PNG, JPEG, TIFF, BMP | `image::codecs::*` |
//! | Encode WebP (lossy + lossless) | `webp` (libwebp bindings) |

use super::backend::ImageBackend;
use super::buffer::{self, DecodeError, Image};
use super::export::{self, EncodeError};
use super::params::SaveParameters;
use std::path::{Path, PathBuf};

/// Backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBackend for RustBackend {
    fn load(&self, path: &Path) -> Result<Image, DecodeError> {
        buffer::load(path)
    }

    fn save(
        &self,
        image: &Image,
        destination: &Path,
        format: &str,
        params: &SaveParameters,
    ) -> Result<PathBuf, EncodeError> {
        export::save(image, destination, format, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::gradient_image;
    use image::{ImageEncoder, RgbImage};

    /// Create a small valid JPEG file with the given dimensions.
    fn create_test_jpeg(path: &Path, width: u32, height: u32) {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let file = std::fs::File::create(path).unwrap();
        let writer = std::io::BufWriter::new(file);
        image::codecs::jpeg::JpegEncoder::new(writer)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
    }

    #[test]
    fn load_synthetic_jpeg_as_rgba() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 20, 15);

        let img = RustBackend::new().load(&path).unwrap();
        assert_eq!(img.dimensions(), (20, 15));
        assert!(img.pixels().all(|p| p.0[3] == 255));
    }

    #[test]
    fn load_nonexistent_file_errors() {
        let result = RustBackend::new().load(Path::new("/nonexistent/image.jpg"));
        assert!(result.is_err());
    }

    #[test]
    fn save_every_format() {
        let tmp = tempfile::TempDir::new().unwrap();
        let backend = RustBackend::new();
        let img = gradient_image(16, 16);

        for name in ["png", "jpg", "jpeg", "webp", "tiff", "bmp"] {
            let saved = backend
                .save(
                    &img,
                    &tmp.path().join("out.input"),
                    name,
                    &SaveParameters::default(),
                )
                .unwrap();
            assert_eq!(saved.extension().unwrap(), name);
            assert!(std::fs::metadata(&saved).unwrap().len() > 0);
            assert_eq!(backend.load(&saved).unwrap().dimensions(), (16, 16));
        }
    }

    #[test]
    fn png_round_trip_through_disk() {
        let tmp = tempfile::TempDir::new().unwrap();
        let backend = RustBackend::new();
        let img = gradient_image(10, 6);

        let saved = backend
            .save(
                &img,
                &tmp.path().join("rt"),
                "png",
                &SaveParameters::default(),
            )
            .unwrap();
        assert_eq!(backend.load(&saved).unwrap(), img);
    }
}
