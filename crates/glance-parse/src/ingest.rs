//! Ingestion of CSV, JSON and spreadsheet uploads.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use glance_core::Record;
use serde_json::Value;
use std::io::Cursor;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid JSON dataset: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JSON dataset must be a top-level array")]
    NotAnArray,

    #[error("JSON row {0} is not an object")]
    NonObjectRow(usize),

    #[error("No worksheet found")]
    NoWorksheet,

    #[error("Failed to read spreadsheet: {0}")]
    Spreadsheet(String),

    #[error("Failed to write spreadsheet: {0}")]
    SpreadsheetWrite(String),

    #[error("Failed to write CSV: {0}")]
    CsvWrite(String),
}

/// Parse CSV text: first line is the header row (comma-split, trimmed),
/// every following line is comma-split positionally. Each value becomes a
/// number when it parses as one (an empty cell coerces to 0), otherwise the
/// trimmed string is kept. Lines shorter than the header leave the trailing
/// fields absent.
///
/// The split is NOT quote-aware: a comma inside a quoted field shifts the
/// remaining columns. This is a documented limitation of the upload format,
/// kept as-is rather than silently changing the accepted input.
pub fn parse_csv(text: &str) -> Vec<Record> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let mut lines = trimmed.split('\n');
    let headers: Vec<String> = match lines.next() {
        Some(line) => line.split(',').map(|h| h.trim().to_string()).collect(),
        None => return Vec::new(),
    };

    lines
        .map(|line| {
            let values: Vec<&str> = line.split(',').map(|v| v.trim()).collect();
            let mut record = Record::new();
            for (i, header) in headers.iter().enumerate() {
                if let Some(value) = values.get(i) {
                    record.insert(header.clone(), coerce_cell(value));
                }
            }
            record
        })
        .collect()
}

/// Numeric-if-possible cell coercion used by the CSV path. Integral numbers
/// stay integers so they serialize without a trailing `.0`.
fn coerce_cell(value: &str) -> Value {
    if value.is_empty() {
        return Value::from(0);
    }
    match value.parse::<f64>() {
        Ok(n) if n == n.trunc() && n.abs() < 1e15 => Value::from(n as i64),
        Ok(n) => serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(value.to_string())),
        Err(_) => Value::String(value.to_string()),
    }
}

/// Parse a JSON upload: a top-level array of flat objects.
pub fn parse_json(text: &str) -> Result<Vec<Record>, ParseError> {
    let value: Value = serde_json::from_str(text)?;
    let items = match value {
        Value::Array(items) => items,
        _ => return Err(ParseError::NotAnArray),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(map) => Ok(map),
            _ => Err(ParseError::NonObjectRow(i)),
        })
        .collect()
}

/// Parse an Excel workbook (`.xlsx`/`.xls`) from its raw bytes.
///
/// Only the first worksheet is read. Row 1 supplies the headers; a blank
/// header cell becomes `Column<N>` with its 1-based position. Numeric cells
/// pass through as numbers, every other non-empty cell is stringified.
/// Rows that produce zero keys are dropped.
pub fn parse_excel(bytes: &[u8]) -> Result<Vec<Record>, ParseError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| ParseError::Spreadsheet(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ParseError::NoWorksheet)?
        .map_err(|e| ParseError::Spreadsheet(e.to_string()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let title = header_cell_to_string(cell);
                if title.is_empty() {
                    format!("Column{}", i + 1)
                } else {
                    title
                }
            })
            .collect(),
        None => return Err(ParseError::NoWorksheet),
    };

    let mut records = Vec::new();
    for row in rows {
        let mut record = Record::new();
        for (i, cell) in row.iter().enumerate() {
            let Some(header) = headers.get(i) else { break };
            if let Some(value) = cell_to_value(cell) {
                record.insert(header.clone(), value);
            }
        }
        if !record.is_empty() {
            records.push(record);
        }
    }

    debug!(
        rows = records.len(),
        columns = headers.len(),
        "spreadsheet parsed"
    );
    Ok(records)
}

fn header_cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    }
}

/// Cell → scalar. Empty cells leave the key absent entirely, mirroring a
/// sparse upload.
fn cell_to_value(cell: &Data) -> Option<Value> {
    match cell {
        Data::Empty => None,
        Data::Int(i) => Some(Value::from(*i)),
        Data::Float(f) if *f == f.trunc() && f.abs() < 1e15 => Some(Value::from(*f as i64)),
        Data::Float(f) => serde_json::Number::from_f64(*f).map(Value::Number),
        Data::String(s) => Some(Value::String(s.clone())),
        Data::Bool(b) => Some(Value::String(if *b {
            "true".to_string()
        } else {
            String::new()
        })),
        other => Some(Value::String(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_csv_mixed_column() {
        let rows = parse_csv("a,b\n1,2\n3,x\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("a"), Some(&json!(1)));
        assert_eq!(rows[0].get("b"), Some(&json!(2)));
        assert_eq!(rows[1].get("a"), Some(&json!(3)));
        // The b column is mixed-typed per cell, not per field.
        assert_eq!(rows[1].get("b"), Some(&json!("x")));
    }

    #[test]
    fn test_parse_csv_short_line_leaves_fields_absent() {
        let rows = parse_csv("a,b,c\n1,2\n");
        assert_eq!(rows[0].len(), 2);
        assert!(rows[0].get("c").is_none());
    }

    #[test]
    fn test_parse_csv_empty_cell_coerces_to_zero() {
        let rows = parse_csv("a,b\n1,\n");
        assert_eq!(rows[0].get("b"), Some(&json!(0)));
    }

    #[test]
    fn test_parse_csv_not_quote_aware() {
        // Known limitation: a quoted comma still splits the line.
        let rows = parse_csv("name,city\n\"Doe, Jane\",Berlin\n");
        assert_eq!(rows[0].get("name"), Some(&json!("\"Doe")));
        assert_eq!(rows[0].get("city"), Some(&json!("Jane\"")));
    }

    #[test]
    fn test_parse_csv_empty_input() {
        assert!(parse_csv("").is_empty());
        assert!(parse_csv("   \n  ").len() <= 1);
    }

    #[test]
    fn test_parse_json_array_of_objects() {
        let rows = parse_json(r#"[{"a":1},{"a":2}]"#).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("a"), Some(&json!(2)));
    }

    #[test]
    fn test_parse_json_rejects_non_array() {
        assert!(matches!(
            parse_json(r#"{"a":1}"#),
            Err(ParseError::NotAnArray)
        ));
        assert!(matches!(
            parse_json(r#"[{"a":1}, 5]"#),
            Err(ParseError::NonObjectRow(1))
        ));
    }

    #[test]
    fn test_parse_excel_rejects_garbage() {
        assert!(matches!(
            parse_excel(b"this is not a workbook"),
            Err(ParseError::Spreadsheet(_))
        ));
    }
}
