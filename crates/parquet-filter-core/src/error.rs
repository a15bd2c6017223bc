use thiserror::Error;

/// Core error type for conversion operations
#[derive(Error, Debug)]
pub enum ConvertError {
    /// IO errors from file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow errors from record batch construction
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    /// Parquet format errors
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Schema inference failures (unreadable or empty source)
    #[error("schema inference error: {0}")]
    SchemaInference(String),

    /// Row filtering failures (pattern compile, read/write during filtering)
    #[error("filter error: {0}")]
    Filter(String),

    /// Encoding failures (malformed values, record/schema mismatch,
    /// unknown column type in a schema description)
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Run-level coordination failures
    #[error("conversion run error: {0}")]
    Run(String),

    /// The run's cancellation token fired
    #[error("conversion cancelled")]
    Cancelled,
}

/// Result type alias for conversion operations
pub type Result<T> = std::result::Result<T, ConvertError>;

impl ConvertError {
    /// Create a new schema inference error
    pub fn schema_inference<S: Into<String>>(msg: S) -> Self {
        ConvertError::SchemaInference(msg.into())
    }

    /// Create a new filter error
    pub fn filter<S: Into<String>>(msg: S) -> Self {
        ConvertError::Filter(msg.into())
    }

    /// Create a new encoding error
    pub fn encoding<S: Into<String>>(msg: S) -> Self {
        ConvertError::Encoding(msg.into())
    }

    /// Create a new run-level error
    pub fn run<S: Into<String>>(msg: S) -> Self {
        ConvertError::Run(msg.into())
    }
}
