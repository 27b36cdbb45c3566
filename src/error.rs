use fedadmin_server::AdminError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FedAdminError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to read {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    ParseFailed { path: PathBuf, message: String },

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Admin(#[from] AdminError),
}

pub type Result<T> = std::result::Result<T, FedAdminError>;
