//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("invalid tag pattern {value:?} for {container}: {reason}")]
    InvalidTagPattern {
        container: String,
        value: String,
        reason: String,
    },

    #[error("invalid resource id {input:?}: {reason}")]
    InvalidResourceId { input: String, reason: String },

    #[error("unknown policy {name:?}")]
    UnknownPolicy { name: String },

    #[error("invalid configuration: {message}")]
    Config { message: String },

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
