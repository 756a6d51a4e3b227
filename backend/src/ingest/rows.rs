//! Row processing: column mapping, type coercion, required-name check and
//! duplicate detection over one sheet's decoded rows.
//!
//! Nothing in here fails. Every content problem becomes a [`RowError`]
//! and the whole sheet is always processed.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;

use super::columns;
use crate::models::{Employee, Field, RowError, UploadResult};
use crate::parser::{display_number, RawRow};

/// Field label used for duplicate-key errors.
pub const DUPLICATE_FIELD: &str = "panNumber/accountNumber";

/// Longest leading decimal literal, as a spreadsheet's loose number parse reads it.
static DECIMAL_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:Infinity|(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)").expect("static pattern")
});

/// Process every row of a sheet into an [`UploadResult`].
///
/// Rows are numbered from 2 (row 1 is the header). A row without a name is
/// dropped with a `name` error; a row whose natural key was already seen is
/// dropped with a duplicate error and the first occurrence is kept.
pub fn process_rows(rows: &[RawRow]) -> UploadResult {
    let mut errors = Vec::new();
    let mut data = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut duplicates = 0;

    for (index, row) in rows.iter().enumerate() {
        let row_number = index + 2;

        let Some(employee) = map_row(row, row_number, &mut errors) else {
            continue;
        };

        let key = employee.natural_key();
        if !key.is_empty() && seen.contains(key) {
            duplicates += 1;
            errors.push(RowError::new(
                row_number,
                DUPLICATE_FIELD,
                "Duplicate entry detected",
                Value::from(key),
            ));
            continue;
        }

        if !key.is_empty() {
            seen.insert(key.to_string());
        }
        data.push(employee);
    }

    UploadResult {
        success: errors.iter().all(RowError::is_duplicate),
        total_rows: rows.len(),
        valid_rows: data.len(),
        duplicates,
        errors,
        data,
    }
}

/// Map one row onto an [`Employee`], or `None` if it has no name.
///
/// When two columns map to the same field, only the leftmost is read.
fn map_row(row: &RawRow, row_number: usize, errors: &mut Vec<RowError>) -> Option<Employee> {
    let mut employee = Employee::default();
    let mut mapped: HashSet<Field> = HashSet::new();

    for (header, value) in &row.cells {
        // the first column for a field wins; later columns whose header
        // trims to the same name are ignored
        let Some(field) = columns::lookup(header).filter(|f| mapped.insert(*f)) else {
            continue;
        };

        if let Some(slot) = employee.number_mut(field) {
            *slot = match coerce_number(value) {
                Some(n) => n,
                None => {
                    if !is_absent(value) {
                        errors.push(RowError::new(
                            row_number,
                            field.as_str(),
                            "Invalid number format",
                            value.clone(),
                        ));
                    }
                    0.0
                }
            };
        } else if let Some(slot) = employee.text_mut(field) {
            *slot = cell_text(value);
        }
    }

    if employee.name.is_empty() {
        errors.push(RowError::new(
            row_number,
            Field::Name.as_str(),
            "Name is required",
            Value::from(""),
        ));
        return None;
    }

    Some(employee.with_row_defaults(row_number))
}

fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Read a cell as a number.
///
/// Strings parse their longest leading decimal literal, so `"12abc"` is 12
/// and `"abc"` is `None`.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_decimal_prefix(s),
        _ => None,
    }
}

fn parse_decimal_prefix(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let literal = DECIMAL_PREFIX.find(text)?.as_str();

    match literal.strip_prefix(['+', '-']).unwrap_or(literal) {
        "Infinity" if literal.starts_with('-') => Some(f64::NEG_INFINITY),
        "Infinity" => Some(f64::INFINITY),
        _ => literal.parse().ok(),
    }
}

/// Read a cell as trimmed text. Empty, zero, `false` and null cells read
/// as the empty string.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f != 0.0 => display_number(f),
            _ => String::new(),
        },
        Value::Bool(true) => "true".to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, Value)]) -> RawRow {
        RawRow::from_pairs(pairs.iter().cloned())
    }

    fn full_row(name: &str, pan: &str, rate: Value) -> RawRow {
        row(&[
            ("l;=g++", json!(1)),
            ("gfdy/", json!(name)),
            ("kb", json!("Officer")),
            ("sfo{/t ljefu", json!("Admin")),
            ("kfg g+=", json!(pan)),
            ("vftf g+=", json!("0012001")),
            (">fj)f", json!(1500)),
            ("efb|", json!("200")),
            ("hDdf", json!(1700)),
            ("b/", rate),
            ("kfpg] /sd", json!(25000.5)),
            ("kfl/>lds s/", json!(250)),
            ("s'n kfpg]", json!(24750.5)),
        ])
    }

    #[test]
    fn test_single_valid_row() {
        let result = process_rows(&[full_row("Ram Bahadur", "301234567", json!(15))]);

        assert!(result.success);
        assert_eq!(result.total_rows, 1);
        assert_eq!(result.valid_rows, 1);
        assert_eq!(result.duplicates, 0);
        assert!(result.errors.is_empty());

        let employee = &result.data[0];
        assert_eq!(employee.name, "Ram Bahadur");
        assert_eq!(employee.pan_number, "301234567");
        assert_eq!(employee.bhadi, 200.0);
        assert_eq!(employee.rate, 15.0);
        assert_eq!(employee.gross_amount, 25000.5);
        assert_eq!(employee.employee_id, "EMP-2");
    }

    #[test]
    fn test_duplicate_pan_keeps_first() {
        let result = process_rows(&[
            full_row("Ram", "301234567", json!(15)),
            full_row("Shyam", "301234567", json!(15)),
        ]);

        assert_eq!(result.duplicates, 1);
        assert_eq!(result.data.len(), 1);
        assert_eq!(result.data[0].name, "Ram");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].row, 3);
        assert_eq!(result.errors[0].field, DUPLICATE_FIELD);
        assert_eq!(result.errors[0].message, "Duplicate entry detected");
        assert_eq!(result.errors[0].value, json!("301234567"));
        // duplicates alone do not fail the batch
        assert!(result.success);
    }

    #[test]
    fn test_account_number_is_fallback_key() {
        let result = process_rows(&[
            row(&[("gfdy/", json!("Ram")), ("vftf g+=", json!("AC-1"))]),
            row(&[("gfdy/", json!("Hari")), ("vftf g+=", json!("AC-1"))]),
            row(&[("gfdy/", json!("Gita")), ("kfg g+=", json!("AC-1"))]),
        ]);

        // PAN "AC-1" collides with the account-number key of the first row
        assert_eq!(result.duplicates, 2);
        assert_eq!(result.valid_rows, 1);
    }

    #[test]
    fn test_rows_without_key_never_collide() {
        let result = process_rows(&[
            row(&[("gfdy/", json!("Ram"))]),
            row(&[("gfdy/", json!("Ram"))]),
        ]);
        assert_eq!(result.duplicates, 0);
        assert_eq!(result.valid_rows, 2);
    }

    #[test]
    fn test_missing_name_dropped() {
        let result = process_rows(&[row(&[("kfg g+=", json!("301234567")), ("b/", json!(10))])]);

        assert_eq!(result.total_rows, 1);
        assert_eq!(result.valid_rows, 0);
        assert!(result.data.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].field, "name");
        assert_eq!(result.errors[0].message, "Name is required");
        assert!(!result.success);
    }

    #[test]
    fn test_nameless_row_is_not_a_duplicate() {
        let result = process_rows(&[
            full_row("Ram", "301234567", json!(15)),
            full_row("   ", "301234567", json!(15)),
        ]);

        assert_eq!(result.duplicates, 0);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].field, "name");
    }

    #[test]
    fn test_invalid_number_keeps_row() {
        let result = process_rows(&[full_row("Ram", "301234567", json!("abc"))]);

        assert!(!result.success);
        assert_eq!(result.valid_rows, 1);
        assert_eq!(result.data[0].rate, 0.0);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].field, "rate");
        assert_eq!(result.errors[0].message, "Invalid number format");
        assert_eq!(result.errors[0].value, json!("abc"));
    }

    #[test]
    fn test_blank_number_is_zero_without_error() {
        let result = process_rows(&[full_row("Ram", "301234567", json!(""))]);
        assert!(result.success);
        assert_eq!(result.data[0].rate, 0.0);
    }

    #[test]
    fn test_unknown_and_padded_headers() {
        let result = process_rows(&[row(&[
            (" gfdy/ ", json!("  Sita  ")),
            ("Remarks", json!("transferred")),
        ])]);

        assert!(result.success);
        assert_eq!(result.data[0].name, "Sita");
    }

    #[test]
    fn test_first_of_repeated_headers_wins() {
        let result = process_rows(&[row(&[
            ("gfdy/", json!("Ram")),
            ("b/", json!(15)),
            (" gfdy/", json!("Shyam")),
            ("b/ ", json!("abc")),
        ])]);

        assert!(result.success);
        assert_eq!(result.data[0].name, "Ram");
        assert_eq!(result.data[0].rate, 15.0);
    }

    #[test]
    fn test_numeric_pan_cell_is_text() {
        let result = process_rows(&[row(&[
            ("gfdy/", json!("Ram")),
            ("kfg g+=", json!(301234567)),
        ])]);
        assert_eq!(result.data[0].pan_number, "301234567");
    }

    #[test]
    fn test_serial_number_defaults_to_row_ordinal() {
        let result = process_rows(&[
            row(&[("gfdy/", json!("Ram"))]),
            row(&[("gfdy/", json!("Sita")), ("l;=g++", json!(9))]),
        ]);
        assert_eq!(result.data[0].sn, 1.0);
        assert_eq!(result.data[1].sn, 9.0);
    }

    #[test]
    fn test_totals_invariant() {
        let rows = vec![
            full_row("Ram", "1", json!(1)),
            full_row("", "2", json!(1)),
            full_row("Hari", "1", json!("x")),
            full_row("Gita", "3", json!(1)),
            full_row("Sita", "3", json!(1)),
            row(&[("Remarks", json!("only"))]),
        ];
        let result = process_rows(&rows);

        assert_eq!(
            result.valid_rows + result.duplicates + result.missing_name_rows(),
            result.total_rows
        );
        assert_eq!(result.data.len(), result.valid_rows);
        assert_eq!(result.total_rows, 6);
        assert_eq!(result.duplicates, 2);
        assert_eq!(result.missing_name_rows(), 2);
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_number(&json!(12.5)), Some(12.5));
        assert_eq!(coerce_number(&json!("42")), Some(42.0));
        assert_eq!(coerce_number(&json!("  -3.5e2")), Some(-350.0));
        assert_eq!(coerce_number(&json!("12abc")), Some(12.0));
        assert_eq!(coerce_number(&json!(".5")), Some(0.5));
        assert_eq!(coerce_number(&json!("1,200")), Some(1.0));
        assert_eq!(coerce_number(&json!("abc")), None);
        assert_eq!(coerce_number(&json!("")), None);
        assert_eq!(coerce_number(&json!(true)), None);
        assert_eq!(coerce_number(&Value::Null), None);
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&json!("  Admin ")), "Admin");
        assert_eq!(cell_text(&json!(0)), "");
        assert_eq!(cell_text(&json!(false)), "");
        assert_eq!(cell_text(&Value::Null), "");
        assert_eq!(cell_text(&json!(7.0)), "7");
    }
}
