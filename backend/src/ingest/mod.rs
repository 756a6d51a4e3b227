//! Salary spreadsheet ingestion.
//!
//! This module turns an uploaded sheet into an [`UploadResult`](crate::models::UploadResult):
//! - Columns: Preeti header → canonical field map
//! - Rows: coercion, required-name check, duplicate detection
//! - Pipeline: structure check, file read, decode, per-sheet processing

pub mod columns;
pub mod pipeline;
pub mod rows;

pub use columns::{expected_headers, header_for, lookup, COLUMN_MAP};
pub use pipeline::*;
pub use rows::{process_rows, DUPLICATE_FIELD};
