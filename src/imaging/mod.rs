//! Image processing: decode, transform, encode.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` → RGBA8 |
//! | **Resize** | Lanczos3 (`image::imageops::resize`) |
//! | **Background / inversion / alpha / backdrop** | pure per-pixel functions |
//! | **Encode** | `image` codecs + `webp` for lossy WebP |
//!
//! The module is split into:
//! - **Buffer**: the [`Image`] type and the decoder
//! - **Parameters**: Data structures describing a pipeline run and a save
//! - **Pixel**: Pure per-pixel functions (unit testable)
//! - **Pipeline**: The staged transform built on the pixel functions
//! - **Export**: Format resolution and encoding policy
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
pub mod buffer;
pub mod export;
mod params;
pub mod pipeline;
pub mod pixel;
pub mod rust_backend;

pub use backend::ImageBackend;
pub use buffer::{DecodeError, Image, load, load_from_memory, supported_input_extensions};
pub use export::{EncodeError, OutputFormat, save};
pub use params::{BackgroundMode, ParamError, ProcessingOptions, Quality, Rgb, SaveParameters};
pub use pipeline::{PipelineError, process};
pub use rust_backend::RustBackend;
