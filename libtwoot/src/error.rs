//! Error types for twoot-sync

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TwootError>;

#[derive(Error, Debug)]
pub enum TwootError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

impl TwootError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            TwootError::Platform(PlatformError::Authentication(_)) => 2,
            TwootError::Platform(_) => 1,
            TwootError::Config(_) => 1,
            TwootError::Storage(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Errors from the persisted marker/mapping store.
///
/// A corrupt or unreadable data file is fatal for the run: without the
/// markers there is no safe way to decide what has already been mirrored.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to access data file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Data file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Failed to acquire run lock: {0}")]
    Lock(String),
}

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Posting failed: {0}")]
    Posting(String),

    #[error("Media upload failed: {0}")]
    Upload(String),

    #[error("Network error: {0}")]
    Network(String),
}
