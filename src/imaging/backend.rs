//! Codec backend trait.
//!
//! The [`ImageBackend`] trait is the seam between batch orchestration and the
//! codecs: everything that touches image files goes through `load` and `save`.
//! The pixel pipeline itself never does I/O and needs no backend.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image` and
//! `webp` crates.

use super::buffer::{DecodeError, Image};
use super::export::EncodeError;
use super::params::SaveParameters;
use std::path::{Path, PathBuf};

/// Trait for image codec backends.
///
/// `Sync` so a single backend can serve every worker of a rayon pool.
pub trait ImageBackend: Sync {
    /// Decode a file into an RGBA8 [`Image`].
    fn load(&self, path: &Path) -> Result<Image, DecodeError>;

    /// Encode `image` as `format` at `destination` (extension rewritten),
    /// returning the path actually written.
    fn save(
        &self,
        image: &Image,
        destination: &Path,
        format: &str,
        params: &SaveParameters,
    ) -> Result<PathBuf, EncodeError>;
}
