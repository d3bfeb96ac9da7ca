//! Error types for ccweb.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CcwebError {
    #[error("Config error: {0}")]
    ConfigError(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Parse error on line {line}: {source}")]
    ParseError {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}
