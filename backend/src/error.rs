//! Error types for the payroll ingestion backend.
//!
//! Only genuine I/O and decoding failures are errors here:
//!
//! - [`IngestError`] - File reading and workbook/CSV decoding errors
//! - [`ExportError`] - CSV report writing errors
//! - [`StoreError`] - Session key-value store errors
//! - [`ServerError`] - Top-level HTTP server errors
//!
//! Content problems in an uploaded sheet (bad numbers, missing names,
//! duplicate keys) are reported as [`crate::models::RowError`] data and
//! never surface through these types.

use thiserror::Error;

// =============================================================================
// Ingestion Errors
// =============================================================================

/// Errors while reading or decoding an uploaded file.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Extension is not one the decoder knows.
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Corrupt or unreadable workbook.
    #[error("Failed to parse Excel file: {0}")]
    Workbook(#[from] calamine::Error),

    /// Malformed delimited text.
    #[error("Failed to parse CSV file: {0}")]
    Csv(#[from] csv::Error),

    /// Bytes could not be decoded to text.
    #[error("Failed to decode file contents: {0}")]
    Encoding(String),
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while writing a CSV report.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization failed.
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error.
    #[error("Export IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Store Errors
// =============================================================================

/// Errors from a session key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("Store JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Key contains characters that cannot be used as a file name.
    #[error("Invalid store key: {0}")]
    InvalidKey(String),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Ingestion error.
    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    /// Session store error.
    #[error("Session error: {0}")]
    Store(#[from] StoreError),

    /// Failed to bind or serve.
    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for ingestion operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // io::Error -> IngestError -> ServerError
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "salary.xlsx");
        let ingest_err: IngestError = io_err.into();
        let server_err: ServerError = ingest_err.into();
        assert!(server_err.to_string().contains("salary.xlsx"));

        // StoreError -> ServerError
        let store_err = StoreError::InvalidKey("../etc".into());
        let server_err: ServerError = store_err.into();
        assert!(server_err.to_string().contains("../etc"));
    }

    #[test]
    fn test_unsupported_format_message() {
        let err = IngestError::UnsupportedFormat("payroll.pdf".into());
        let msg = err.to_string();
        assert!(msg.contains("Unsupported"));
        assert!(msg.contains("payroll.pdf"));
    }
}
