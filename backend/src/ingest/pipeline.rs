//! High-level ingestion API: structure check, file read, decode, row processing.
//!
//! # Example
//!
//! ```rust,ignore
//! use payroll::ingest::{parse, validate_structure, IngestOptions, UploadFile};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let file = UploadFile::open("salary.xlsx").await?;
//!     let check = validate_structure(&file);
//!     if !check.valid {
//!         eprintln!("{}", check.message);
//!         return Ok(());
//!     }
//!
//!     let result = parse(file, &IngestOptions::default()).await?;
//!     println!("{} valid rows", result.valid_rows);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::rows::process_rows;
use crate::api::logs::{log_error, log_info, log_success, log_warning};
use crate::error::IngestResult;
use crate::models::{Field, MultiSheetUploadResult, SheetResult, StructureCheck, UploadResult};
use crate::parser::{decode_first_sheet, decode_sheets, RawSheet};
use crate::preeti::convert_employee;

/// Extensions accepted for upload.
pub const ALLOWED_EXTENSIONS: [&str; 3] = [".xlsx", ".xls", ".csv"];

/// Upload size ceiling (10 MiB), inclusive.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Text fields converted from Preeti when [`IngestOptions::convert_legacy`] is set.
pub const LEGACY_TEXT_FIELDS: [Field; 3] = [Field::Name, Field::Designation, Field::Department];

/// Options for the ingestion pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestOptions {
    /// Convert Preeti-typed name, designation and department to Unicode
    pub convert_legacy: bool,
}

enum FileSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// An uploaded file: a name, a size, and contents that are read once.
pub struct UploadFile {
    name: String,
    size: u64,
    source: FileSource,
}

impl UploadFile {
    /// Describe a file on disk without reading it.
    pub async fn open(path: impl AsRef<Path>) -> IngestResult<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            name,
            size: metadata.len(),
            source: FileSource::Path(path.to_path_buf()),
        })
    }

    /// Wrap bytes already in memory (e.g. a multipart field).
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            source: FileSource::Bytes(bytes),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Read the whole file into memory, consuming the handle.
    pub async fn read(self) -> IngestResult<Vec<u8>> {
        match self.source {
            FileSource::Path(path) => Ok(tokio::fs::read(path).await?),
            FileSource::Bytes(bytes) => Ok(bytes),
        }
    }
}

/// Check a file's extension, then its size.
///
/// The first failing check decides the message. Never fails.
pub fn validate_structure(file: &UploadFile) -> StructureCheck {
    check_name_and_size(file.name(), file.size())
}

/// [`validate_structure`] over a bare name and size.
pub fn check_name_and_size(name: &str, size: u64) -> StructureCheck {
    let lower = name.to_lowercase();
    if !ALLOWED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        return StructureCheck::rejected(
            "Invalid file type. Please upload an Excel file (.xlsx, .xls) or CSV file.",
        );
    }

    if size > MAX_FILE_SIZE {
        return StructureCheck::rejected("File size exceeds 10MB limit.");
    }

    StructureCheck::ok("File structure is valid.")
}

/// Ingest the first sheet of a file.
///
/// Only I/O and decode failures are errors; everything about the sheet's
/// contents is reported inside the returned [`UploadResult`].
pub async fn parse(file: UploadFile, options: &IngestOptions) -> IngestResult<UploadResult> {
    let name = file.name().to_string();
    log_info(format!("📖 Reading {} ({} bytes)...", name, file.size()));
    let bytes = file.read().await?;
    parse_bytes(&name, &bytes, options)
}

/// Ingest every sheet of a file.
pub async fn parse_all_sheets(
    file: UploadFile,
    options: &IngestOptions,
) -> IngestResult<MultiSheetUploadResult> {
    let name = file.name().to_string();
    log_info(format!("📖 Reading {} ({} bytes)...", name, file.size()));
    let bytes = file.read().await?;
    parse_bytes_all_sheets(&name, &bytes, options)
}

/// Ingest the first sheet of in-memory file contents. Other sheets are
/// not decoded.
pub fn parse_bytes(
    file_name: &str,
    bytes: &[u8],
    options: &IngestOptions,
) -> IngestResult<UploadResult> {
    let result = match decode_first_sheet(file_name, bytes)? {
        Some(sheet) => ingest_sheet(&sheet, options),
        None => {
            log_error("Workbook has no sheets");
            UploadResult::empty_file()
        }
    };

    Ok(result)
}

/// Ingest every sheet of in-memory file contents.
pub fn parse_bytes_all_sheets(
    file_name: &str,
    bytes: &[u8],
    options: &IngestOptions,
) -> IngestResult<MultiSheetUploadResult> {
    let sheets = decode_sheets(file_name, bytes)?;
    Ok(ingest_sheets(&sheets, options))
}

/// Run row processing independently on each decoded sheet.
pub fn ingest_sheets(sheets: &[RawSheet], options: &IngestOptions) -> MultiSheetUploadResult {
    let results: Vec<SheetResult> = sheets
        .iter()
        .map(|sheet| SheetResult {
            sheet_name: sheet.name.clone(),
            result: ingest_sheet(sheet, options),
        })
        .collect();

    let multi = MultiSheetUploadResult::from_sheets(results);
    if multi.success {
        log_success(format!("All {} sheet(s) ingested", multi.total_sheets));
    } else {
        log_warning(format!(
            "{} of {} sheet(s) have errors",
            multi.sheets.iter().filter(|s| !s.result.success).count(),
            multi.total_sheets
        ));
    }
    multi
}

/// Process one decoded sheet.
///
/// A sheet with no data rows gets the structural empty-file result, in the
/// single-sheet and the multi-sheet path alike.
pub fn ingest_sheet(sheet: &RawSheet, options: &IngestOptions) -> UploadResult {
    if sheet.rows.is_empty() {
        log_error(format!("Sheet \"{}\" is empty", sheet.name));
        return UploadResult::empty_file();
    }

    log_info(format!("⚙️  Processing {} rows of \"{}\"...", sheet.rows.len(), sheet.name));
    let mut result = process_rows(&sheet.rows);

    if options.convert_legacy {
        result.data = result
            .data
            .iter()
            .map(|employee| convert_employee(employee, &LEGACY_TEXT_FIELDS))
            .collect();
    }

    print_result(&result);
    result
}

fn print_result(result: &UploadResult) {
    if result.success {
        log_success(result.summary());
    } else {
        log_warning(result.summary());
    }
    for err in result.errors.iter().filter(|e| !e.is_duplicate()).take(3) {
        log_error(err.to_string());
    }
}
