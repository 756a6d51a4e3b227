//! Domain models for the payroll ingestion pipeline.
//!
//! - [`Field`] - Closed set of canonical employee fields
//! - [`Employee`] - One accepted salary row
//! - [`RowError`] - A row-level validation problem
//! - [`UploadResult`] - Outcome of ingesting one sheet
//! - [`MultiSheetUploadResult`] - Outcome of ingesting every sheet of a workbook
//! - [`StructureCheck`] - Outcome of the pre-upload file check

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Canonical Fields
// =============================================================================

/// Canonical employee field identifiers.
///
/// Spreadsheet headers are mapped onto these at the ingestion boundary,
/// so nothing past the column map sees a dynamically-keyed row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    /// Serial number.
    Sn,
    EmployeeId,
    Name,
    Designation,
    Department,
    /// PAN, the natural key.
    PanNumber,
    /// Bank account number, the fallback key.
    AccountNumber,
    SalaryPeriod,
    Allowance,
    /// Supplemental allowance.
    Bhadi,
    Total,
    Rate,
    GrossAmount,
    Tax,
    NetPayable,
}

impl Field {
    /// Every field, in record order.
    pub const ALL: [Field; 15] = [
        Field::Sn,
        Field::EmployeeId,
        Field::Name,
        Field::Designation,
        Field::Department,
        Field::PanNumber,
        Field::AccountNumber,
        Field::SalaryPeriod,
        Field::Allowance,
        Field::Bhadi,
        Field::Total,
        Field::Rate,
        Field::GrossAmount,
        Field::Tax,
        Field::NetPayable,
    ];

    /// Wire name (camelCase), used in error reports and exports.
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Sn => "sn",
            Field::EmployeeId => "employeeId",
            Field::Name => "name",
            Field::Designation => "designation",
            Field::Department => "department",
            Field::PanNumber => "panNumber",
            Field::AccountNumber => "accountNumber",
            Field::SalaryPeriod => "salaryPeriod",
            Field::Allowance => "allowance",
            Field::Bhadi => "bhadi",
            Field::Total => "total",
            Field::Rate => "rate",
            Field::GrossAmount => "grossAmount",
            Field::Tax => "tax",
            Field::NetPayable => "netPayable",
        }
    }

    /// Parse a wire name back into a field.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }

    /// Whether cells for this field are coerced to numbers.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Field::Sn
                | Field::Allowance
                | Field::Bhadi
                | Field::Total
                | Field::Rate
                | Field::GrossAmount
                | Field::Tax
                | Field::NetPayable
        )
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Employee
// =============================================================================

/// A canonical employee salary record.
///
/// Absent text fields are empty strings and absent amounts are zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub sn: f64,
    pub employee_id: String,
    pub name: String,
    pub designation: String,
    pub department: String,
    pub pan_number: String,
    pub account_number: String,
    pub salary_period: String,
    pub allowance: f64,
    pub bhadi: f64,
    pub total: f64,
    pub rate: f64,
    pub gross_amount: f64,
    pub tax: f64,
    pub net_payable: f64,
}

impl Employee {
    /// Text value of a non-numeric field.
    pub fn text(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::EmployeeId => &self.employee_id,
            Field::Name => &self.name,
            Field::Designation => &self.designation,
            Field::Department => &self.department,
            Field::PanNumber => &self.pan_number,
            Field::AccountNumber => &self.account_number,
            Field::SalaryPeriod => &self.salary_period,
            _ => return None,
        };
        Some(value)
    }

    /// Mutable text slot of a non-numeric field.
    pub fn text_mut(&mut self, field: Field) -> Option<&mut String> {
        let slot = match field {
            Field::EmployeeId => &mut self.employee_id,
            Field::Name => &mut self.name,
            Field::Designation => &mut self.designation,
            Field::Department => &mut self.department,
            Field::PanNumber => &mut self.pan_number,
            Field::AccountNumber => &mut self.account_number,
            Field::SalaryPeriod => &mut self.salary_period,
            _ => return None,
        };
        Some(slot)
    }

    /// Numeric value of an amount field.
    pub fn number(&self, field: Field) -> Option<f64> {
        let value = match field {
            Field::Sn => self.sn,
            Field::Allowance => self.allowance,
            Field::Bhadi => self.bhadi,
            Field::Total => self.total,
            Field::Rate => self.rate,
            Field::GrossAmount => self.gross_amount,
            Field::Tax => self.tax,
            Field::NetPayable => self.net_payable,
            _ => return None,
        };
        Some(value)
    }

    /// Mutable numeric slot of an amount field.
    pub fn number_mut(&mut self, field: Field) -> Option<&mut f64> {
        let slot = match field {
            Field::Sn => &mut self.sn,
            Field::Allowance => &mut self.allowance,
            Field::Bhadi => &mut self.bhadi,
            Field::Total => &mut self.total,
            Field::Rate => &mut self.rate,
            Field::GrossAmount => &mut self.gross_amount,
            Field::Tax => &mut self.tax,
            Field::NetPayable => &mut self.net_payable,
            _ => return None,
        };
        Some(slot)
    }

    /// Natural key used for duplicate detection: PAN, else account number.
    pub fn natural_key(&self) -> &str {
        if self.pan_number.is_empty() {
            &self.account_number
        } else {
            &self.pan_number
        }
    }

    /// Fill row-dependent defaults for fields the sheet left blank.
    ///
    /// `sn` falls back to the data row's ordinal and `employee_id` to
    /// `EMP-<row>`.
    pub fn with_row_defaults(mut self, row_number: usize) -> Self {
        if self.sn == 0.0 {
            self.sn = (row_number - 1) as f64;
        }
        if self.employee_id.is_empty() {
            self.employee_id = format!("EMP-{}", row_number);
        }
        self
    }
}

// =============================================================================
// Row Errors
// =============================================================================

/// A validation problem on one row. Never aborts processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowError {
    /// 1-based row in the source file, header included (first data row is 2).
    pub row: usize,
    /// Field that failed, or the triggering condition.
    pub field: String,
    pub message: String,
    /// Raw offending cell value.
    pub value: Value,
}

impl RowError {
    pub fn new(
        row: usize,
        field: impl Into<String>,
        message: impl Into<String>,
        value: Value,
    ) -> Self {
        Self {
            row,
            field: field.into(),
            message: message.into(),
            value,
        }
    }

    /// Whether this error only reports a duplicate key.
    pub fn is_duplicate(&self) -> bool {
        self.message.contains("Duplicate")
    }
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.field.is_empty() {
            write!(f, "Row {}: {}", self.row, self.message)
        } else {
            write!(f, "Row {}, field '{}': {} ({})", self.row, self.field, self.message, self.value)
        }
    }
}

// =============================================================================
// Upload Results
// =============================================================================

/// Outcome of ingesting one sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    /// False iff some error is not a duplicate report.
    pub success: bool,
    pub total_rows: usize,
    pub valid_rows: usize,
    pub duplicates: usize,
    pub errors: Vec<RowError>,
    pub data: Vec<Employee>,
}

impl UploadResult {
    /// Result for a sheet that decoded to zero data rows.
    pub fn empty_file() -> Self {
        Self::structural_failure("Excel file is empty")
    }

    /// Result for a file rejected before row processing.
    pub fn structural_failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            total_rows: 0,
            valid_rows: 0,
            duplicates: 0,
            errors: vec![RowError::new(0, "", message, Value::Null)],
            data: Vec::new(),
        }
    }

    /// Rows dropped because they had no name.
    pub fn missing_name_rows(&self) -> usize {
        self.errors
            .iter()
            .filter(|e| e.field == Field::Name.as_str())
            .count()
    }

    /// One-line summary for logs and the CLI.
    pub fn summary(&self) -> String {
        format!(
            "{} rows read, {} valid, {} duplicates, {} errors",
            self.total_rows,
            self.valid_rows,
            self.duplicates,
            self.errors.len()
        )
    }
}

/// Per-sheet outcome in a multi-sheet upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetResult {
    pub sheet_name: String,
    pub result: UploadResult,
}

/// Outcome of ingesting every sheet in a workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiSheetUploadResult {
    /// Logical AND of every sheet's `success`.
    pub success: bool,
    pub total_sheets: usize,
    pub sheets: Vec<SheetResult>,
}

impl MultiSheetUploadResult {
    pub fn from_sheets(sheets: Vec<SheetResult>) -> Self {
        Self {
            success: sheets.iter().all(|s| s.result.success),
            total_sheets: sheets.len(),
            sheets,
        }
    }
}

// =============================================================================
// Structure Check
// =============================================================================

/// Outcome of the pre-upload extension and size check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureCheck {
    pub valid: bool,
    pub message: String,
}

impl StructureCheck {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { valid: true, message: message.into() }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self { valid: false, message: message.into() }
    }
}

// =============================================================================
// Tests
// =============================================================================
