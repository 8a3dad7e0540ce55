//! Persisted application settings.
//!
//! A small JSON document in the user's home directory
//! (`~/.backdrop-settings.json`) holding host state that outlives a single
//! run: recently converted files and folders, user presets, and the output
//! defaults used when no preset is chosen.
//!
//! Loading and saving are explicit. A missing file loads as defaults; a
//! corrupt one is an error so the caller decides whether to discard it.

use crate::naming;
use crate::presets::Preset;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the settings file within the home directory.
const SETTINGS_FILENAME: &str = ".backdrop-settings.json";

/// Maximum entries kept in each recent list.
pub const MAX_RECENT: usize = 10;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Most recent first.
    pub recent_files: Vec<PathBuf>,
    /// Most recent first.
    pub recent_folders: Vec<PathBuf>,
    pub presets: BTreeMap<String, Preset>,
    pub last_output_dir: Option<PathBuf>,
    pub overwrite_existing: bool,
    pub custom_naming: String,
    pub default_format: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            recent_files: Vec::new(),
            recent_folders: Vec::new(),
            presets: BTreeMap::new(),
            last_output_dir: None,
            overwrite_existing: false,
            custom_naming: naming::DEFAULT_PATTERN.to_string(),
            default_format: "png".to_string(),
        }
    }
}

impl Settings {
    /// `~/.backdrop-settings.json`, or a file in the working directory when
    /// no home directory is known.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(SETTINGS_FILENAME)
    }

    /// Load from `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&content)?)
    }

    /// Write to `path` as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn add_recent_file(&mut self, path: &Path) {
        push_recent(&mut self.recent_files, path);
    }

    pub fn add_recent_folder(&mut self, path: &Path) {
        push_recent(&mut self.recent_folders, path);
    }

    pub fn clear_recent(&mut self) {
        self.recent_files.clear();
        self.recent_folders.clear();
    }

    /// Store a user preset, replacing any preset of the same name.
    pub fn save_preset(&mut self, name: &str, preset: Preset) {
        self.presets.insert(name.to_string(), preset);
    }

    /// Remove a user preset. Returns whether it existed.
    pub fn remove_preset(&mut self, name: &str) -> bool {
        self.presets.remove(name).is_some()
    }

    /// `[output]` defaults contributed by these settings, as a config layer.
    pub fn output_overlay(&self) -> toml::Value {
        let mut output = toml::map::Map::new();
        output.insert(
            "format".into(),
            toml::Value::String(self.default_format.clone()),
        );
        output.insert(
            "naming_pattern".into(),
            toml::Value::String(self.custom_naming.clone()),
        );
        output.insert(
            "overwrite".into(),
            toml::Value::Boolean(self.overwrite_existing),
        );
        if let Some(dir) = &self.last_output_dir {
            output.insert(
                "directory".into(),
                toml::Value::String(dir.to_string_lossy().into_owned()),
            );
        }
        let mut table = toml::map::Map::new();
        table.insert("output".into(), toml::Value::Table(output));
        toml::Value::Table(table)
    }
}

/// Move `path` to the front of `list`, dropping duplicates and the oldest
/// entries past [`MAX_RECENT`].
fn push_recent(list: &mut Vec<PathBuf>, path: &Path) {
    list.retain(|p| p != path);
    list.insert(0, path.to_path_buf());
    list.truncate(MAX_RECENT);
}
