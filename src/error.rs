use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn input documents into a [`crate::model::Compilation`].
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid declaration snapshot in {origin}: {message}")]
    Snapshot { origin: String, message: String },
    #[error("JSON pointer {pointer} selects nothing in {path}")]
    Pointer { pointer: String, path: PathBuf },
    #[error("failed to apply jq expression to {path}: {message}")]
    Jq { path: PathBuf, message: String },
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),
    #[error(transparent)]
    Glob(#[from] glob::GlobError),
    #[error("glob pattern matched no files: {0}")]
    NoMatch(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {message}")]
    Invalid { path: PathBuf, message: String },
}
