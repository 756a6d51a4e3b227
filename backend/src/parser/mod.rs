//! Spreadsheet decoding: workbooks via calamine, delimited text via csv.
//!
//! Turns raw upload bytes into [`RawSheet`]s: the first row of each sheet
//! becomes the header list, every later row a [`RawRow`] of header/cell
//! pairs. No payroll-specific logic here.

use calamine::{open_workbook_auto_from_rs, Data, Reader, Sheets};
use serde_json::{Number, Value};
use std::io::Cursor;

use crate::api::logs::{log_info, log_info_indent, log_success};
use crate::error::{IngestError, IngestResult};

/// Sheet name given to delimited-text uploads.
pub const DELIMITED_SHEET_NAME: &str = "Sheet1";

/// How an upload's bytes are decoded, chosen from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// `.xlsx` / `.xls`
    Workbook,
    /// `.csv`
    Delimited,
}

impl SourceFormat {
    /// Detect the format from a file name (case-insensitive suffix).
    pub fn from_file_name(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        if lower.ends_with(".xlsx") || lower.ends_with(".xls") {
            Some(Self::Workbook)
        } else if lower.ends_with(".csv") {
            Some(Self::Delimited)
        } else {
            None
        }
    }
}

/// One data row, cells keyed by their (untrimmed) header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    pub cells: Vec<(String, Value)>,
}

impl RawRow {
    /// Build a row from header/value pairs.
    pub fn from_pairs<H, V>(pairs: impl IntoIterator<Item = (H, V)>) -> Self
    where
        H: Into<String>,
        V: Into<Value>,
    {
        Self {
            cells: pairs
                .into_iter()
                .map(|(h, v)| (h.into(), v.into()))
                .collect(),
        }
    }

    /// Cell under an exact header.
    pub fn get(&self, header: &str) -> Option<&Value> {
        self.cells.iter().find(|(h, _)| h == header).map(|(_, v)| v)
    }
}

/// A decoded sheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawSheet {
    /// Build a sheet from a header row and cell rows, the way both decoders do.
    ///
    /// Missing trailing cells become `""`, cells under blank headers are
    /// dropped, and rows with no non-empty cell are skipped.
    pub fn from_grid(name: impl Into<String>, headers: Vec<String>, grid: Vec<Vec<Value>>) -> Self {
        let rows = grid
            .into_iter()
            .filter(|cells| cells.iter().any(|v| !is_blank(v)))
            .map(|cells| {
                let mut cells = cells.into_iter();
                RawRow {
                    cells: headers
                        .iter()
                        .map(|h| (h.clone(), cells.next().unwrap_or_else(|| Value::from(""))))
                        .filter(|(h, _)| !h.trim().is_empty())
                        .collect(),
                }
            })
            .collect();

        Self {
            name: name.into(),
            headers,
            rows,
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Decode every sheet of an upload, picking the decoder from the file name.
pub fn decode_sheets(file_name: &str, bytes: &[u8]) -> IngestResult<Vec<RawSheet>> {
    match SourceFormat::from_file_name(file_name) {
        Some(SourceFormat::Workbook) => parse_workbook(bytes),
        Some(SourceFormat::Delimited) => Ok(vec![parse_delimited(bytes)?]),
        None => Err(IngestError::UnsupportedFormat(file_name.to_string())),
    }
}

/// Decode only the first sheet of an upload. Later workbook sheets are
/// never read, so damage there does not affect the result.
pub fn decode_first_sheet(file_name: &str, bytes: &[u8]) -> IngestResult<Option<RawSheet>> {
    match SourceFormat::from_file_name(file_name) {
        Some(SourceFormat::Workbook) => parse_first_worksheet(bytes),
        Some(SourceFormat::Delimited) => Ok(Some(parse_delimited(bytes)?)),
        None => Err(IngestError::UnsupportedFormat(file_name.to_string())),
    }
}

// =============================================================================
// Workbooks
// =============================================================================

type Workbook = Sheets<Cursor<Vec<u8>>>;

fn open_workbook(bytes: &[u8]) -> IngestResult<Workbook> {
    let workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    log_info(format!("Workbook has {} sheet(s)", workbook.sheet_names().len()));
    Ok(workbook)
}

/// Decode all sheets of an `.xlsx` / `.xls` workbook, in workbook order.
pub fn parse_workbook(bytes: &[u8]) -> IngestResult<Vec<RawSheet>> {
    let mut workbook = open_workbook(bytes)?;
    workbook
        .sheet_names()
        .into_iter()
        .map(|name| read_worksheet(&mut workbook, name))
        .collect()
}

/// Decode the first sheet of a workbook, if it has any.
pub fn parse_first_worksheet(bytes: &[u8]) -> IngestResult<Option<RawSheet>> {
    let mut workbook = open_workbook(bytes)?;
    match workbook.sheet_names().into_iter().next() {
        Some(name) => Ok(Some(read_worksheet(&mut workbook, name)?)),
        None => Ok(None),
    }
}

fn read_worksheet(workbook: &mut Workbook, name: String) -> IngestResult<RawSheet> {
    let range = workbook.worksheet_range(&name)?;
    let mut rows = range.rows();

    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.iter().map(header_text).collect(),
        None => Vec::new(),
    };
    let grid: Vec<Vec<Value>> = rows
        .map(|row| row.iter().map(cell_value).collect())
        .collect();

    let sheet = RawSheet::from_grid(name, headers, grid);
    log_info_indent(format!("Sheet \"{}\": {} data rows", sheet.name, sheet.rows.len()), 1);
    Ok(sheet)
}

fn header_text(cell: &Data) -> String {
    match cell_value(cell) {
        Value::String(s) => s,
        Value::Number(n) => n.as_f64().map(display_number).unwrap_or_default(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::from(""),
        Data::String(s) => Value::from(s.as_str()),
        Data::Int(i) => Value::from(*i),
        Data::Float(f) => number_value(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => number_value(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::from(s.as_str()),
        Data::Error(e) => Value::from(e.to_string()),
    }
}

fn number_value(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

/// Render a number the way a spreadsheet user expects to see it typed:
/// integral values without a fractional part.
pub fn display_number(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e21 {
        format!("{}", f as i128)
    } else {
        f.to_string()
    }
}

// =============================================================================
// Delimited text
// =============================================================================

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" | "utf-8-sig" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to a string using the named encoding.
///
/// Unknown labels fall back to lossy UTF-8. Text containing NUL is
/// rejected as binary.
pub fn decode_content(bytes: &[u8], encoding: &str) -> IngestResult<String> {
    let text = match encoding_rs::Encoding::for_label(encoding.as_bytes()) {
        Some(enc) => enc.decode(bytes).0.into_owned(),
        None => String::from_utf8_lossy(bytes).into_owned(),
    };

    if text.contains('\u{0}') {
        return Err(IngestError::Encoding(format!(
            "binary content is not {} text",
            encoding
        )));
    }

    Ok(text.trim_start_matches('\u{feff}').to_string())
}

/// Candidate separators in tie-break order.
///
/// `;` is the Preeti glyph for स and shows up inside headers such as
/// `l;=g++`, so it only wins with a strictly higher count than `,`.
const SEPARATORS: [char; 4] = [',', '\t', ';', '|'];

/// Detect the delimiter by counting separators in the first line.
///
/// Characters inside double-quoted fields are not counted. Ties go to the
/// earlier entry of [`SEPARATORS`]; a line with no separator reads as `,`.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let mut counts = [0usize; SEPARATORS.len()];
    let mut in_quotes = false;
    for c in first_line.chars() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if !in_quotes {
            if let Some(i) = SEPARATORS.iter().position(|&sep| sep == c) {
                counts[i] += 1;
            }
        }
    }

    let mut best = 0;
    for i in 1..SEPARATORS.len() {
        if counts[i] > counts[best] {
            best = i;
        }
    }
    SEPARATORS[best]
}

/// Decode a delimited-text upload into a single sheet.
pub fn parse_delimited(bytes: &[u8]) -> IngestResult<RawSheet> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);
    log_success(format!("Detected encoding: {}", encoding));
    log_success(format!("Detected separator: '{}'", format_delimiter(delimiter)));

    parse_delimited_str(&content, delimiter)
}

/// Parse already-decoded delimited text with an explicit delimiter.
pub fn parse_delimited_str(content: &str, delimiter: char) -> IngestResult<RawSheet> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record?;
        grid.push(record.iter().map(Value::from).collect());
    }

    Ok(RawSheet::from_grid(DELIMITED_SHEET_NAME, headers, grid))
}

fn format_delimiter(d: char) -> &'static str {
    match d {
        ';' => ";",
        ',' => ",",
        '\t' => "TAB",
        '|' => "|",
        _ => "?",
    }
}
