//! User configuration file handling
//!
//! Manages settings from ~/.config/bezy-marks/settings.json

use crate::positioning::PositioningSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// User configuration from ~/.config/bezy-marks/settings.json
///
/// These settings override built-in defaults but are overridden by CLI arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    /// Stroke width used when measuring glyph bounding boxes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_thickness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autosave: Option<bool>,
    /// Drag inactivity before an autosave, in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autosave_debounce_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_to_file: Option<bool>,
    /// Let x-height and baseline adjust base anchors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_metrics_for_anchors: Option<bool>,
}

impl ConfigFile {
    /// Every setting spelled out with its built-in default
    pub fn with_defaults() -> Self {
        let settings = PositioningSettings::default();
        Self {
            stroke_thickness: Some(settings.stroke_thickness),
            autosave: Some(settings.autosave),
            autosave_debounce_ms: Some((settings.autosave_debounce_secs * 1000.0).round() as u64),
            log_to_file: Some(false),
            use_metrics_for_anchors: Some(settings.use_metrics),
        }
    }

    /// Get the path to the bezy-marks config directory
    pub fn config_dir() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")));
        config_dir.join("bezy-marks")
    }

    /// Get the path to the user config file
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("settings.json")
    }

    /// Get the path to the logs directory
    pub fn logs_dir() -> PathBuf {
        Self::config_dir().join("logs")
    }

    /// Load configuration from the user config file
    pub fn load() -> Option<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`; `None` when missing or unreadable
    pub fn load_from(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    debug!("Loaded user settings from {:?}", path);
                    Some(config)
                }
                Err(e) => {
                    warn!("Failed to parse settings.json: {}", e);
                    None
                }
            },
            Err(e) => {
                warn!("Failed to read settings.json: {}", e);
                None
            }
        }
    }

    /// Save configuration to the user config file
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;

        debug!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Positioning settings with unset values taken from the defaults
    pub fn to_settings(&self) -> PositioningSettings {
        let defaults = PositioningSettings::default();
        PositioningSettings {
            stroke_thickness: self.stroke_thickness.unwrap_or(defaults.stroke_thickness),
            use_metrics: self.use_metrics_for_anchors.unwrap_or(defaults.use_metrics),
            autosave: self.autosave.unwrap_or(defaults.autosave),
            autosave_debounce_secs: self
                .autosave_debounce_ms
                .map(|ms| ms as f64 / 1000.0)
                .unwrap_or(defaults.autosave_debounce_secs),
        }
    }

    /// Initialize the user configuration directory
    ///
    /// This creates:
    /// 1. The ~/.config/bezy-marks directory structure
    /// 2. A settings.json file with default values
    /// 3. A logs/ directory for file logging
    pub fn initialize_config_directory() -> anyhow::Result<()> {
        let config_dir = Self::config_dir();

        fs::create_dir_all(&config_dir)?;
        println!("Created config directory: {:?}", config_dir);

        let logs_dir = Self::logs_dir();
        fs::create_dir_all(&logs_dir)?;
        println!("Created logs directory: {:?}", logs_dir);

        let settings_path = Self::config_path();
        if !settings_path.exists() {
            Self::with_defaults().save_to(&settings_path)?;
            println!("Created settings file: {:?}", settings_path);
        } else {
            println!("Settings file already exists: {:?}", settings_path);
        }

        println!("\nConfiguration initialized successfully!");
        println!("You can now:");
        println!("  - Edit settings at: {:?}", settings_path);
        println!("  - View application logs in: {:?}", logs_dir);

        Ok(())
    }
}
