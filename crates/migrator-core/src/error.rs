//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("archive format error: {message}")]
    Format { message: String },

    #[error("archive path does not match the expected layout: {path}")]
    InvalidPath { path: String },

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing required field: {field}")]
    MissingField { field: String },

    #[error("sanitize failed: field {field} could not be removed from {kind}/{name}")]
    SanitizeFailed {
        field: String,
        kind: String,
        name: String,
    },
}

pub type Result<T> = std::result::Result<T, CoreError>;
