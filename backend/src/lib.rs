//! # Payroll - salary spreadsheet ingestion and Preeti conversion
//!
//! Reads monthly salary sheets (Excel or CSV) whose headers are written in
//! the Preeti legacy font, validates every row, flags duplicate employees
//! and optionally transliterates Preeti text to Unicode Devanagari.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ xlsx / csv  │────▶│   Parser    │────▶│   Ingest    │────▶│ UploadResult│
//! │  (upload)   │     │ (sheets/enc)│     │ (rows/dups) │     │ (+ errors)  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use payroll::{parse, IngestOptions, UploadFile};
//!
//! #[tokio::main]
//! async fn main() {
//!     let file = UploadFile::open("salary.xlsx").await.unwrap();
//!     let result = parse(file, &IngestOptions::default()).await.unwrap();
//!     println!("{}", result.summary());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types
//! - [`models`] - Employee records and upload results
//! - [`parser`] - Workbook and CSV decoding
//! - [`ingest`] - Column mapping, row validation, pipeline
//! - [`preeti`] - Preeti → Unicode transliteration
//! - [`export`] - CSV report export
//! - [`session`] - Session and theme persistence
//! - [`config`] - Environment configuration
//! - [`api`] - HTTP API server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Decoding
pub mod parser;

// Ingestion
pub mod ingest;

// Transliteration
pub mod preeti;

// Reports
pub mod export;

// Session state
pub mod session;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ExportError,
    IngestError,
    ServerError,
    StoreError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    Employee,
    Field,
    MultiSheetUploadResult,
    RowError,
    SheetResult,
    StructureCheck,
    UploadResult,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_content,
    decode_sheets,
    detect_delimiter,
    detect_encoding,
    RawRow,
    RawSheet,
};

// =============================================================================
// Re-exports - Ingestion
// =============================================================================

pub use ingest::{
    parse,
    parse_all_sheets,
    parse_bytes,
    parse_bytes_all_sheets,
    process_rows,
    validate_structure,
    IngestOptions,
    UploadFile,
};

// =============================================================================
// Re-exports - Preeti
// =============================================================================

pub use preeti::{convert, convert_employee, convert_fields, looks_like_legacy};

// =============================================================================
// Re-exports - Export / Session / Config
// =============================================================================

pub use config::AppConfig;
pub use export::{employees_to_csv, write_employees, write_errors, HeaderStyle};
pub use session::{FileStore, KeyValueStore, MemoryStore, SessionContext, Theme, User};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
