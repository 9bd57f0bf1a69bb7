//! One-way export of a dataset to CSV text or XLSX bytes.

use crate::ingest::ParseError;
use glance_core::{display_string, Record};
use rust_xlsxwriter::Workbook;
use serde_json::Value;

/// Render a dataset as CSV text. Headers come from the first row's field
/// order; missing cells become empty fields. Quoting is handled by the
/// writer, so embedded commas survive a round trip through a real CSV
/// reader (unlike the upload parser, which is deliberately naive).
pub fn to_csv_string(rows: &[Record]) -> Result<String, ParseError> {
    let Some(first) = rows.first() else {
        return Ok(String::new());
    };
    let headers: Vec<&String> = first.keys().collect();

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(&headers)
        .map_err(|e| ParseError::CsvWrite(e.to_string()))?;

    for row in rows {
        let cells: Vec<String> = headers
            .iter()
            .map(|h| match row.get(*h) {
                None | Some(Value::Null) => String::new(),
                cell => display_string(cell),
            })
            .collect();
        writer
            .write_record(&cells)
            .map_err(|e| ParseError::CsvWrite(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ParseError::CsvWrite(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ParseError::CsvWrite(e.to_string()))
}

/// Render a dataset as a single-worksheet XLSX workbook. Numeric cells are
/// written as numbers, everything else as display strings.
pub fn to_xlsx_bytes(rows: &[Record]) -> Result<Vec<u8>, ParseError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    if let Some(first) = rows.first() {
        let headers: Vec<&String> = first.keys().collect();
        for (col, header) in headers.iter().enumerate() {
            worksheet
                .write_string(0, col as u16, *header)
                .map_err(|e| ParseError::SpreadsheetWrite(e.to_string()))?;
        }

        for (i, row) in rows.iter().enumerate() {
            let r = (i + 1) as u32;
            for (col, header) in headers.iter().enumerate() {
                let c = col as u16;
                match row.get(*header) {
                    Some(Value::Number(n)) => {
                        worksheet
                            .write_number(r, c, n.as_f64().unwrap_or(0.0))
                            .map_err(|e| ParseError::SpreadsheetWrite(e.to_string()))?;
                    }
                    None | Some(Value::Null) => {}
                    cell => {
                        worksheet
                            .write_string(r, c, display_string(cell))
                            .map_err(|e| ParseError::SpreadsheetWrite(e.to_string()))?;
                    }
                }
            }
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|e| ParseError::SpreadsheetWrite(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glance_core::record_from_pairs;
    use serde_json::json;

    #[test]
    fn test_to_csv_string_quotes_embedded_commas() {
        let rows = vec![record_from_pairs(&[
            ("name", json!("Doe, Jane")),
            ("sales", json!(120)),
        ])];
        let csv = to_csv_string(&rows).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("name,sales"));
        assert_eq!(lines.next(), Some("\"Doe, Jane\",120"));
    }

    #[test]
    fn test_to_csv_string_empty_dataset() {
        assert_eq!(to_csv_string(&[]).unwrap(), "");
    }

    #[test]
    fn test_xlsx_export_parses_back() {
        let rows = vec![
            record_from_pairs(&[("region", json!("EU")), ("sales", json!(10))]),
            record_from_pairs(&[("region", json!("US")), ("sales", json!(20))]),
        ];
        let bytes = to_xlsx_bytes(&rows).unwrap();
        let parsed = crate::parse_excel(&bytes).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].get("region"), Some(&json!("EU")));
        assert_eq!(parsed[1].get("sales"), Some(&json!(20)));
    }
}
