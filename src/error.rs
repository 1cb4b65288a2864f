//! Typed errors for the revision pipeline.

use thiserror::Error;

/// A transcript line that does not follow the `speaker: content` layout.
///
/// Any occurrence aborts normalization of the whole transcript before a
/// single backend call is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Malformed transcript line {line_number}: missing \": \" separator in {line:?}")]
pub struct FormatError {
    /// 1-based position of the line among the non-blank input lines
    pub line_number: usize,
    /// The offending line after timestamp removal
    pub line: String,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found at {path}")]
    FileNotFound { path: String },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Missing required configuration key: {key}")]
    MissingKey { key: &'static str },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}
