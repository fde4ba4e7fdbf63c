use thiserror::Error;

/// Top-level error type for the HeartMap system.
///
/// Subsystem crates map their library errors (rusqlite, csv, axum) into one of
/// these variants so that `?` works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HeartMapError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Ingest error: {0}")]
    Ingest(String),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for HeartMapError {
    fn from(err: toml::de::Error) -> Self {
        HeartMapError::Config(err.to_string())
    }
}

/// A specialized `Result` type for HeartMap operations.
pub type Result<T> = std::result::Result<T, HeartMapError>;
