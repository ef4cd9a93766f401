//! Configuration errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("State file error: {0}")]
    State(#[from] serde_json::Error),
}

impl From<commitgrab_extract::PatternError> for ConfigError {
    fn from(e: commitgrab_extract::PatternError) -> Self {
        ConfigError::InvalidValue {
            field: e.pattern.clone(),
            message: e.message,
        }
    }
}
