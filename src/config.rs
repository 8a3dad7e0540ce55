//! Job configuration.
//!
//! A job is everything one conversion run needs: the pipeline switches, how to
//! encode and name the output, and how wide to fan out in batch mode. It is
//! loaded from TOML and layered:
//!
//! ```text
//! stock defaults
//!   ← settings (naming pattern, overwrite, default format, output directory)
//!   ← preset (processing + format/quality/optimize)
//!   ← config file (--config)
//!   ← command-line flags
//! ```
//!
//! Each layer is a sparse TOML table merged onto the previous one with
//! [`merge_toml`]; the result is deserialized and validated once.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [processing]
//! background_mode = "black"   # black | white | custom
//! custom_color = "#000000"    # key color for custom mode
//! tolerance = 15              # 0-255 for black/white, 0-100 (%) for custom
//! invert_colors = true
//! resize = false
//! width = 0
//! height = 0
//! crop = false
//! crop_left = 0
//! crop_top = 0
//! crop_right = 100
//! crop_bottom = 100
//! adjust_alpha = false
//! alpha_value = 255
//! replace_background = false
//! replacement_color = "#FFFFFF"
//!
//! [output]
//! format = "png"              # png | jpg | jpeg | webp | tiff | bmp
//! quality = 95                # 1-100, JPEG and WebP (WebP is lossless above 90)
//! optimize = true             # PNG compression effort
//! naming_pattern = "{filename}_converted"
//! overwrite = false
//! # directory = "out"         # default: "converted/" next to each input
//!
//! [batch]
//! # max_processes = 4         # default: number of CPU cores
//! recursive = false
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{BackgroundMode, ProcessingOptions, SaveParameters, export};
use crate::naming::{self, NamingRule};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Complete configuration for a conversion run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JobConfig {
    /// Pipeline stage switches and parameters.
    pub processing: ProcessingOptions,
    /// Encoding and file naming.
    pub output: OutputConfig,
    /// Batch fan-out.
    pub batch: BatchConfig,
}

impl JobConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.output.quality) {
            return Err(ConfigError::Validation(
                "output.quality must be 1-100".into(),
            ));
        }
        let p = &self.processing;
        if p.background_mode == BackgroundMode::Custom && p.tolerance > 100 {
            return Err(ConfigError::Validation(
                "processing.tolerance must be 0-100 in custom mode".into(),
            ));
        }
        if p.resize && (p.width == 0 || p.height == 0) {
            return Err(ConfigError::Validation(
                "processing.width and processing.height must be non-zero when resize is on"
                    .into(),
            ));
        }
        if self.output.naming_pattern.trim().is_empty() {
            return Err(ConfigError::Validation(
                "output.naming_pattern must not be empty".into(),
            ));
        }
        if self.output.naming_pattern.contains(['/', '\\']) {
            return Err(ConfigError::Validation(
                "output.naming_pattern must not contain path separators".into(),
            ));
        }
        if self.batch.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "batch.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Encoding and naming of converted files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Target format name. Unrecognised names are written as PNG.
    pub format: String,
    /// JPEG/WebP quality (1 = worst, 100 = best).
    pub quality: u32,
    /// Spend more effort on PNG compression.
    pub optimize: bool,
    /// Output file name pattern, see [`naming`].
    pub naming_pattern: String,
    /// Replace existing files instead of picking a free name.
    pub overwrite: bool,
    /// Output directory. Absent → `converted/` next to each input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "png".to_string(),
            quality: 95,
            optimize: true,
            naming_pattern: naming::DEFAULT_PATTERN.to_string(),
            overwrite: false,
            directory: None,
        }
    }
}

impl OutputConfig {
    pub fn save_parameters(&self) -> SaveParameters {
        SaveParameters::new(self.quality, self.optimize)
    }

    pub fn naming_rule(&self) -> NamingRule {
        NamingRule {
            pattern: self.naming_pattern.clone(),
            directory: self.directory.clone(),
            extension: export::extension_for(&self.format),
            overwrite: self.overwrite,
        }
    }
}

/// Batch settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Maximum number of parallel conversion workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<usize>,
    /// Descend into subdirectories of input folders.
    pub recursive: bool,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &BatchConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(JobConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Err` if the file is missing or contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(value)
}

/// Merge `layers` in order onto the stock defaults, then deserialize and validate.
pub fn resolve_layers(
    layers: impl IntoIterator<Item = toml::Value>,
) -> Result<JobConfig, ConfigError> {
    let merged = layers
        .into_iter()
        .fold(stock_defaults_value(), merge_toml);
    let config: JobConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load a config file merged over stock defaults.
pub fn load_config(path: &Path) -> Result<JobConfig, ConfigError> {
    resolve_layers([load_raw_config(path)?])
}

/// Returns a fully-commented stock config file with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Backdrop Configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Pass the file with `backdrop --config <file> ...`. A preset chosen with
# --preset is applied first, this file on top of it, and command-line flags
# on top of both. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Pixel pipeline. Stages run in a fixed order:
#   resize -> crop -> background removal / inversion -> alpha -> backdrop
# ---------------------------------------------------------------------------
[processing]
# How background pixels are detected: "black", "white" or "custom".
background_mode = "black"

# Key color for custom mode.
custom_color = "#000000"

# Black mode: every channel <= tolerance is background.
# White mode: every channel >= 255 - tolerance is background.
# Custom mode: color distance below tolerance percent (0-100) is background.
tolerance = 15

# Invert the colors of everything that is not background.
invert_colors = true

# Resample to exactly width x height (Lanczos3). Aspect ratio is not kept.
resize = false
width = 0
height = 0

# Crop rectangle in pixels of the resized image, clamped to its bounds.
crop = false
crop_left = 0
crop_top = 0
crop_right = 100
crop_bottom = 100

# Cap the opacity of every visible pixel at alpha_value (0-255).
adjust_alpha = false
alpha_value = 255

# Composite the result over an opaque backdrop color.
replace_background = false
replacement_color = "#FFFFFF"

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# png, jpg/jpeg, webp, tiff or bmp. Anything else is written as png.
format = "png"

# JPEG and WebP quality (1-100). WebP is lossless above 90.
quality = 95

# Spend more effort on PNG compression.
optimize = true

# File name pattern. Variables: {filename}, {date}, {time}, {counter}
naming_pattern = "{filename}_converted"

# Replace existing files instead of picking a free name.
overwrite = false

# Output directory. Omit to write into "converted/" next to each input.
# directory = "out"

# ---------------------------------------------------------------------------
# Batch
# ---------------------------------------------------------------------------
[batch]
# Maximum parallel conversion workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# Descend into subdirectories of input folders.
recursive = false
"##
}
