//! TOML-based engine settings.
//!
//! Example configuration (`dataview.toml`):
//! ```toml
//! [transform]
//! concatenation_separator = " "
//! regression_combine_series = true
//!
//! [analysis]
//! trim_to_supported_row_count = true
//!
//! [objects]
//! null_color = "#000000"
//! ```
//!
//! Every field is optional; missing fields take the defaults below.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// File name searched for by [`Settings::find_and_load`].
pub const SETTINGS_FILE_NAME: &str = "dataview.toml";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Transform pipeline settings.
    pub transform: TransformSettings,

    /// Mapping validation settings.
    pub analysis: AnalysisSettings,

    /// Object evaluation settings.
    pub objects: ObjectSettings,
}

/// Transform pipeline settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TransformSettings {
    /// Joins the formatted values of concatenated category columns.
    pub concatenation_separator: String,

    /// Default for regression mappings that do not say whether to combine
    /// series.
    pub regression_combine_series: bool,
}

impl Default for TransformSettings {
    fn default() -> Self {
        Self {
            concatenation_separator: " ".to_string(),
            regression_combine_series: true,
        }
    }
}

/// Mapping validation settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Trim categorical and table rows down to a mapping's supported row
    /// count before declaring the DataView invalid.
    pub trim_to_supported_row_count: bool,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            trim_to_supported_row_count: true,
        }
    }
}

/// Object evaluation settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObjectSettings {
    /// Color used by `specificColor` null-coloring strategies that carry no
    /// color of their own.
    pub null_color: String,
}

impl Default for ObjectSettings {
    fn default() -> Self {
        Self {
            null_color: "#000000".to_string(),
        }
    }
}

impl FromStr for Settings {
    type Err = SettingsError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        content.parse()
    }

    /// Load `dataview.toml` from `dir` or the nearest ancestor holding one.
    ///
    /// Returns defaults when no file is found.
    pub fn find_and_load<P: AsRef<Path>>(dir: P) -> Result<Self, SettingsError> {
        let mut current = Some(dir.as_ref());
        while let Some(candidate_dir) = current {
            let candidate = candidate_dir.join(SETTINGS_FILE_NAME);
            if candidate.is_file() {
                tracing::debug!(path = %candidate.display(), "loading settings");
                return Self::load(&candidate);
            }
            current = candidate_dir.parent();
        }
        Ok(Settings::default())
    }

    fn validate(&self) -> Result<(), SettingsError> {
        let color = &self.objects.null_color;
        let is_hex = color.len() > 1
            && color.starts_with('#')
            && color[1..].chars().all(|c| c.is_ascii_hexdigit());
        if !is_hex {
            return Err(SettingsError::InvalidConfig(format!(
                "objects.null_color must be a hex color, got '{}'",
                color
            )));
        }
        Ok(())
    }
}
