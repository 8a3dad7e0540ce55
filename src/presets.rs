//! Named presets.
//!
//! A preset is a complete set of pipeline options plus the encoding choices
//! (format, quality, optimize) that go with them. Three presets are built in:
//!
//! | Name | Background | Tolerance | Invert | Extra |
//! |---|---|---|---|---|
//! | `logo_black` | black | 15 | yes | |
//! | `logo_white` | white | 15 | yes | |
//! | `product` | white | 25 | no | resize 800×800, white backdrop, quality 90 |
//!
//! User presets live in [`Settings`] and shadow built-ins of the same name.
//! A resolved preset becomes a TOML layer in [`config::resolve_layers`](crate::config::resolve_layers).

use crate::config::JobConfig;
use crate::imaging::{BackgroundMode, ProcessingOptions, Rgb};
use crate::settings::Settings;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PresetError {
    #[error("preset '{0}' not found")]
    NotFound(String),
    #[error("built-in preset '{0}' cannot be deleted")]
    BuiltIn(String),
}

pub const BUILT_IN: [&str; 3] = ["logo_black", "logo_white", "product"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Preset {
    pub format: String,
    pub quality: u32,
    pub optimize: bool,
    pub processing: ProcessingOptions,
}

impl Default for Preset {
    fn default() -> Self {
        Self {
            format: "png".to_string(),
            quality: 95,
            optimize: true,
            processing: ProcessingOptions::default(),
        }
    }
}

impl Preset {
    /// Capture the preset-relevant parts of an effective job config.
    pub fn from_config(config: &JobConfig) -> Self {
        Self {
            format: config.output.format.clone(),
            quality: config.output.quality,
            optimize: config.output.optimize,
            processing: config.processing.clone(),
        }
    }

    /// The preset as a sparse config layer.
    ///
    /// Only `[processing]` and the encoding keys of `[output]` are set, so
    /// naming and directory choices from other layers survive.
    pub fn to_overlay(&self) -> toml::Value {
        let mut output = toml::map::Map::new();
        output.insert("format".into(), toml::Value::String(self.format.clone()));
        output.insert("quality".into(), toml::Value::Integer(i64::from(self.quality)));
        output.insert("optimize".into(), toml::Value::Boolean(self.optimize));

        let processing =
            toml::Value::try_from(&self.processing).expect("processing options must serialize");
        let mut table = toml::map::Map::new();
        table.insert("processing".into(), processing);
        table.insert("output".into(), toml::Value::Table(output));
        toml::Value::Table(table)
    }
}

/// A built-in preset by name.
pub fn built_in(name: &str) -> Option<Preset> {
    let base = ProcessingOptions::default();
    match name {
        "logo_black" => Some(Preset {
            processing: ProcessingOptions {
                background_mode: BackgroundMode::Black,
                tolerance: 15,
                invert_colors: true,
                ..base
            },
            ..Preset::default()
        }),
        "logo_white" => Some(Preset {
            processing: ProcessingOptions {
                background_mode: BackgroundMode::White,
                tolerance: 15,
                invert_colors: true,
                ..base
            },
            ..Preset::default()
        }),
        "product" => Some(Preset {
            processing: ProcessingOptions {
                background_mode: BackgroundMode::White,
                tolerance: 25,
                invert_colors: false,
                resize: true,
                width: 800,
                height: 800,
                replace_background: true,
                replacement_color: Rgb::WHITE,
                ..base
            },
            quality: 90,
            ..Preset::default()
        }),
        _ => None,
    }
}

/// Look a preset up, user presets first.
pub fn resolve(name: &str, settings: &Settings) -> Result<Preset, PresetError> {
    settings
        .presets
        .get(name)
        .cloned()
        .or_else(|| built_in(name))
        .ok_or_else(|| PresetError::NotFound(name.to_string()))
}

/// Every preset name with whether it is user-defined, built-ins first.
///
/// A user preset shadowing a built-in is listed once, as user-defined.
pub fn list(settings: &Settings) -> Vec<(String, bool)> {
    let mut names: Vec<(String, bool)> = BUILT_IN
        .iter()
        .filter(|name| !settings.presets.contains_key(**name))
        .map(|name| (name.to_string(), false))
        .collect();
    names.extend(settings.presets.keys().map(|name| (name.clone(), true)));
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;

    #[test]
    fn every_built_in_resolves() {
        for name in BUILT_IN {
            assert!(built_in(name).is_some(), "{name}");
        }
        assert!(built_in("nope").is_none());
    }

    #[test]
    fn product_preset_values() {
        let p = built_in("product").unwrap();
        assert_eq!(p.processing.background_mode, BackgroundMode::White);
        assert_eq!(p.processing.tolerance, 25);
        assert!(!p.processing.invert_colors);
        assert_eq!(p.processing.resize_target(), Some((800, 800)));
        assert!(p.processing.replace_background);
        assert_eq!(p.quality, 90);
        assert_eq!(p.format, "png");
    }

    #[test]
    fn user_preset_shadows_built_in() {
        let mut settings = Settings::default();
        let custom = Preset {
            quality: 10,
            ..built_in("logo_black").unwrap()
        };
        settings.presets.insert("logo_black".into(), custom.clone());
        assert_eq!(resolve("logo_black", &settings).unwrap(), custom);
        assert_eq!(
            resolve("logo_white", &settings).unwrap(),
            built_in("logo_white").unwrap()
        );
    }

    #[test]
    fn unknown_preset_is_not_found() {
        let err = resolve("missing", &Settings::default()).unwrap_err();
        assert!(matches!(err, PresetError::NotFound(name) if name == "missing"));
    }

    #[test]
    fn list_marks_user_presets() {
        let mut settings = Settings::default();
        settings.presets.insert("mine".into(), Preset::default());
        settings.presets.insert("product".into(), Preset::default());
        let listed = list(&settings);
        assert_eq!(
            listed,
            vec![
                ("logo_black".to_string(), false),
                ("logo_white".to_string(), false),
                ("mine".to_string(), true),
                ("product".to_string(), true),
            ]
        );
    }

    #[test]
    fn overlay_keeps_naming_from_lower_layers() {
        let lower: toml::Value =
            toml::from_str("[output]\nnaming_pattern = \"{filename}-x\"").unwrap();
        let preset = built_in("product").unwrap();
        let config = config::resolve_layers([lower, preset.to_overlay()]).unwrap();
        assert_eq!(config.output.naming_pattern, "{filename}-x");
        assert_eq!(config.output.quality, 90);
        assert_eq!(config.processing, preset.processing);
    }

    #[test]
    fn from_config_round_trips_through_overlay() {
        let mut config = JobConfig::default();
        config.processing.tolerance = 42;
        config.output.format = "webp".into();
        let preset = Preset::from_config(&config);
        let resolved = config::resolve_layers([preset.to_overlay()]).unwrap();
        assert_eq!(resolved.processing.tolerance, 42);
        assert_eq!(resolved.output.format, "webp");
    }

    #[test]
    fn overlay_always_carries_processing_section() {
        for name in BUILT_IN {
            let overlay = built_in(name).unwrap().to_overlay();
            let processing = overlay.get("processing").and_then(|v| v.as_table());
            assert!(processing.is_some_and(|t| t.contains_key("background_mode")), "{name}");
        }
    }
}
