//! Session settings: dialog defaults and last-used values, persisted as TOML.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::buffer::Interpolation;
use crate::document::{AddMaskType, FillType};
use crate::geometry::Unit;
use crate::undo::DEFAULT_MAX_UNDO_LEVELS;

/// Failure to read or write the settings file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Defaults offered by the layer dialogs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogConfig {
    pub layer_new_name: String,
    pub layer_new_fill_type: FillType,
    pub layer_add_mask_type: AddMaskType,
    pub layer_add_mask_invert: bool,
    /// Interpolation used when nothing was chosen yet.
    pub interpolation: Interpolation,
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            layer_new_name: "Layer".to_string(),
            layer_new_fill_type: FillType::Transparent,
            layer_add_mask_type: AddMaskType::White,
            layer_add_mask_invert: false,
            interpolation: Interpolation::Cubic,
        }
    }
}

/// Values remembered from the last committed resize and scale dialogs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LastUsedSettings {
    pub resize_unit: Unit,
    pub scale_unit: Unit,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_interpolation: Option<Interpolation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub max_undo_levels: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_undo_levels: DEFAULT_MAX_UNDO_LEVELS,
        }
    }
}

/// Everything a session remembers between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub dialogs: DialogConfig,
    pub last_used: LastUsedSettings,
    pub history: HistoryConfig,
}

impl SessionConfig {
    /// Interpolation the scale dialog opens with.
    pub fn scale_interpolation(&self) -> Interpolation {
        self.last_used
            .scale_interpolation
            .unwrap_or(self.dialogs.interpolation)
    }

    /// Read settings from a TOML file.
    ///
    /// Missing keys take their defaults.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Write settings as TOML, creating parent directories as needed.
    pub fn save_to_path(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Read settings, falling back to defaults.
    ///
    /// A missing file is not an error. An unreadable or invalid file yields
    /// defaults plus a warning for the user.
    pub fn load_or_default(path: &Path) -> (Self, Option<String>) {
        if !path.exists() {
            return (Self::default(), None);
        }
        match Self::load_from_path(path) {
            Ok(config) => (config, None),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "using default settings");
                (
                    Self::default(),
                    Some(format!("Settings could not be loaded, using defaults. {err}")),
                )
            }
        }
    }
}
