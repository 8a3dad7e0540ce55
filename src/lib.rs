//! # Backdrop
//!
//! A raster image cleaner for logos, icons and product shots: strip a flat
//! background to transparency, invert what remains, cap its opacity and put
//! it back on a solid color, then write it as PNG, JPEG, WebP, TIFF or BMP.
//!
//! # Architecture: Fixed Stage Pipeline
//!
//! Every image goes through the same stages in the same order. Each stage is
//! switched on by [`ProcessingOptions`](imaging::ProcessingOptions) and is a
//! pure function from image to image:
//!
//! ```text
//! decode → resize → crop → background / invert → alpha cap → backdrop → encode
//! ```
//!
//! Decoding and encoding sit behind the [`ImageBackend`](imaging::ImageBackend)
//! trait; the pipeline in between never touches the filesystem, so tests run
//! it on in-memory buffers and batch tests swap in a recording mock backend.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Image buffer, decoder, per-pixel functions, the pipeline and the exporter |
//! | [`config`] | Layered TOML job configuration, validation, documented stock config |
//! | [`presets`] | Built-in and user-saved option sets |
//! | [`settings`] | JSON settings file: recent files, user presets, output defaults |
//! | [`naming`] | Output file names from `{filename}`/`{date}`/`{time}`/`{counter}` patterns |
//! | [`batch`] | Input collection, collision-free planning, parallel conversion with progress events |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Straight RGBA8 Everywhere
//!
//! Every decoded image is converted to 8-bit RGBA with straight (not
//! premultiplied) alpha before any stage runs. Classification, inversion and
//! compositing are then simple per-pixel functions with integer arithmetic,
//! and every codec accepts the result directly.
//!
//! ## Formats Without Alpha
//!
//! JPEG has no alpha channel, so images are flattened onto white before JPEG
//! encoding. BMP is written as-is; most readers ignore its alpha channel, so
//! transparency should not be expected to survive a BMP round trip.
//!
//! ## Output Names Never Collide
//!
//! Without `--overwrite`, a converted file never replaces an existing one and
//! two inputs of one batch never share an output name. Batch planning is
//! sequential so this holds before any parallel work starts.

pub mod batch;
pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod presets;
pub mod settings;

#[cfg(test)]
pub(crate) mod test_helpers;
