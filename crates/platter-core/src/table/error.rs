//! Table loading error types

use thiserror::Error;

/// Errors that can occur while reading a binary table
///
/// All of these are fatal to the table being loaded: no partially decoded
/// table is ever handed out.
#[derive(Error, Debug)]
pub enum TableError {
    /// Buffer ended before the header or payload was complete
    #[error("table truncated: needed {needed} more bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    /// Header fields are present but invalid
    #[error("malformed header: {0}")]
    MalformedHeader(String),

    /// Version discriminator selects no known layout
    #[error("unsupported table version: {0}")]
    UnsupportedVersion(i32),

    /// Underlying IO failure while fetching the bytes
    #[error("table IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for table operations
pub type TableResult<T> = Result<T, TableError>;
