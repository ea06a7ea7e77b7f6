//! Error types for the bootstrap.
//!
//! Every failure here is recoverable from the bootstrap's point of view: the
//! orchestrator records it against the catalog entry and moves on.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration lookups that were asked to be strict.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing configuration value: {key}")]
    Missing { key: String },

    #[error("Invalid configuration at {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },

    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failures while getting an artifact into the local cache.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Download failed for {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("Filesystem error: {context}")]
    Filesystem {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    pub fn filesystem(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Filesystem {
            context: context.into(),
            source,
        }
    }
}

/// Failures while appending a source to a loading context.
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("Loading context refused extension with {}", path.display())]
    AccessDenied { path: PathBuf },

    #[error("Cannot link {}: {reason}", path.display())]
    Unsupported { path: PathBuf, reason: String },

    #[error("IO error while linking {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LinkError {
    /// Whether the context itself said no, as opposed to the file being bad.
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied { .. })
    }
}
