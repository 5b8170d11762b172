//! Error types for recordwire

use thiserror::Error;

/// Main error type for recordwire operations
#[derive(Error, Debug)]
pub enum Error {
    /// Error reading from or writing to a stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A frame ended before the declared number of bytes arrived
    #[error("truncated frame: expected {expected} bytes, got {got}")]
    Truncated { expected: usize, got: usize },

    /// A frame length prefix exceeded the configured limit
    #[error("frame length {len} exceeds the limit of {max} bytes")]
    FrameTooLarge { len: u64, max: u64 },

    /// Record bytes failed structural verification against the schema
    #[error("record failed verification against the schema")]
    Verification,

    /// Typed access through a root view that is not bound to verified bytes
    #[error("root view is not bound to verified record bytes")]
    InvalidRoot,

    /// Attempt to read past the end of a record
    #[error("attempt to read past end of record")]
    OutOfData,

    /// Record data does not match the schema
    #[error("invalid record data: {0}")]
    InvalidData(String),

    /// Malformed schema definition
    #[error("invalid schema: {0}")]
    Schema(String),

    /// Text record is not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
