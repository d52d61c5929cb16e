//! Crate error type.
//!
//! Shape mismatches inside the transform pipeline are not errors; they
//! degrade to best-effort output. `EngineError` only covers host-facing
//! fallible operations: loading settings, decoding wire JSON, and resolving
//! query contracts.

use thiserror::Error;

use crate::config::SettingsError;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Settings could not be loaded.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// Wire JSON could not be decoded or encoded.
    #[error("invalid {context} JSON: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// An expression in source-reference form names a variable that is not
    /// declared in the contract's `from`.
    #[error("unknown source variable '{0}'")]
    UnknownSourceVariable(String),

    /// An expression in source-reference form has no variable on one of its
    /// entities.
    #[error("entity '{entity}' has no source variable")]
    MissingSourceVariable { entity: String },
}

impl EngineError {
    pub fn json(context: &'static str, source: serde_json::Error) -> Self {
        EngineError::Json { context, source }
    }
}
