//! Configuration module.
//!
//! Engine settings loaded from `dataview.toml`.

mod settings;

pub use settings::{
    AnalysisSettings, ObjectSettings, Settings, SettingsError, TransformSettings,
    SETTINGS_FILE_NAME,
};
