//! CSV report export for ingested payroll data.
//!
//! Writes accepted employee records, or the row error list, through the
//! `csv` crate. Headers are either canonical field names or the Preeti
//! template headers, so an export can be fed back into an upload.

use std::io::Write;

use crate::error::{ExportError, ExportResult};
use crate::ingest::columns;
use crate::models::{Employee, Field, RowError};
use crate::parser::display_number;

/// Header style for an employee export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HeaderStyle {
    /// camelCase field names, every field.
    #[default]
    Canonical,
    /// Preeti template headers, template columns only.
    Template,
}

/// Write employee records as CSV.
pub fn write_employees<W: Write>(
    writer: W,
    employees: &[Employee],
    style: HeaderStyle,
) -> ExportResult<()> {
    let columns: Vec<(Field, &str)> = match style {
        HeaderStyle::Canonical => Field::ALL.iter().map(|f| (*f, f.as_str())).collect(),
        HeaderStyle::Template => columns::COLUMN_MAP.iter().map(|(h, f)| (*f, *h)).collect(),
    };

    let mut out = csv::Writer::from_writer(writer);
    out.write_record(columns.iter().map(|(_, header)| *header))?;

    for employee in employees {
        out.write_record(columns.iter().map(|(field, _)| field_text(employee, *field)))?;
    }

    out.flush()?;
    Ok(())
}

/// Write row errors as CSV (`row,field,message,value`).
pub fn write_errors<W: Write>(writer: W, errors: &[RowError]) -> ExportResult<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(["row", "field", "message", "value"])?;

    for err in errors {
        let value = match &err.value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        };
        out.write_record([err.row.to_string(), err.field.clone(), err.message.clone(), value])?;
    }

    out.flush()?;
    Ok(())
}

/// Render employees to an in-memory CSV string.
pub fn employees_to_csv(employees: &[Employee], style: HeaderStyle) -> ExportResult<String> {
    let mut buf = Vec::new();
    write_employees(&mut buf, employees, style)?;
    String::from_utf8(buf)
        .map_err(|e| ExportError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

fn field_text(employee: &Employee, field: Field) -> String {
    match employee.number(field) {
        Some(n) => display_number(n),
        None => employee.text(field).unwrap_or_default().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{parse_bytes, IngestOptions};

    fn ram() -> Employee {
        Employee {
            sn: 1.0,
            employee_id: "EMP-2".into(),
            name: "Ram, Bahadur".into(),
            pan_number: "301234567".into(),
            rate: 15.0,
            gross_amount: 25000.5,
            ..Default::default()
        }
    }

    #[test]
    fn test_canonical_export() {
        let csv = employees_to_csv(&[ram()], HeaderStyle::Canonical).unwrap();
        let mut lines = csv.lines();

        let header = lines.next().unwrap();
        assert!(header.starts_with("sn,employeeId,name,"));
        assert!(header.ends_with("netPayable"));

        let row = lines.next().unwrap();
        assert!(row.starts_with("1,EMP-2,\"Ram, Bahadur\","));
        assert!(row.contains("25000.5"));
    }

    #[test]
    fn test_template_export_reingests() {
        let csv = employees_to_csv(&[ram()], HeaderStyle::Template).unwrap();
        assert!(csv.starts_with("l;=g++,gfdy/"));

        let result = parse_bytes("export.csv", csv.as_bytes(), &IngestOptions::default()).unwrap();
        assert!(result.success);
        assert_eq!(result.data[0].name, "Ram, Bahadur");
        assert_eq!(result.data[0].rate, 15.0);
        assert_eq!(result.data[0].gross_amount, 25000.5);
    }

    #[test]
    fn test_error_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("errors.csv");
        let errors = vec![
            RowError::new(3, "rate", "Invalid number format", serde_json::json!("abc")),
            RowError::new(0, "", "Excel file is empty", serde_json::Value::Null),
        ];

        let file = std::fs::File::create(&path).unwrap();
        write_errors(file, &errors).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "row,field,message,value");
        assert_eq!(lines[1], "3,rate,Invalid number format,abc");
        assert_eq!(lines[2], "0,,Excel file is empty,");
    }
}
