//! Cache error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reconciling the cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Verification was requested but is not enabled in the configuration.
    #[error("verifyCache is not set in config, refusing to verify the cache")]
    VerificationDisabled,

    /// The bundle was fully scanned without finding a manifest entry.
    #[error("No manifest entry found in bundle {}", .0.display())]
    ManifestNotFound(PathBuf),

    /// The bundle could not be read.
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Scanning the bundle failed or the bundle was already closed.
    #[error("Failed to read bundle: {0}")]
    BundleRead(String),

    /// A manifest file or entry could not be decoded.
    #[error("Corrupted manifest: {0}")]
    Corrupted(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A background task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Task(String),
}

impl CacheError {
    /// Creates a corrupted manifest error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted(message.into())
    }

    /// Creates a bundle read error.
    pub fn bundle_read(message: impl Into<String>) -> Self {
        Self::BundleRead(message.into())
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a background task error.
    pub fn task(message: impl Into<String>) -> Self {
        Self::Task(message.into())
    }
}

impl From<tokio::task::JoinError> for CacheError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::task(err.to_string())
    }
}
