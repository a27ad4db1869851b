//! Error types for lazy_include

use std::path::PathBuf;

use dom::DomException;
use thiserror::Error;

use crate::fetch::RequestMode;

/// Result type alias for include operations
pub type Result<T> = std::result::Result<T, IncludeError>;

/// Errors raised while retrieving a fragment or one of its scripts.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FetchError {
    /// The server answered with a status outside 200-299.
    #[error("html-include fetch failed: {status_text}")]
    Status {
        url: String,
        status: u16,
        status_text: String,
    },

    /// The request never produced a response.
    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },

    /// The request mode forbids fetching this URL.
    #[error("{mode} request to {url} is not allowed")]
    ModeViolation { url: String, mode: RequestMode },

    /// HTTP client error
    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Errors reported by a [`ScriptExecutor`](crate::script::ScriptExecutor).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("script execution is disabled")]
    Refused,

    #[error("script failed: {message}")]
    Failed { message: String },
}

/// Errors loading an [`IncludeConfig`](crate::config::IncludeConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{0:?} is not a valid custom element name")]
    InvalidTagName(String),
}

/// Errors that end an include run or prevent the element from being created.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum IncludeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error("DOM error: {0}")]
    Dom(#[from] DomException),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
