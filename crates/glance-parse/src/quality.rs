//! Data-quality assessment and repair: validation, cleaning, deduplication
//! and size optimization of uploaded record collections.

use glance_core::{identity_key, is_missing, Record};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Outcome of validating a dataset. Fatal problems (empty input, ragged
/// rows) make the dataset invalid; warning-level issues (mostly-null
/// fields) are reported alongside but leave it usable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Validate a record collection.
///
/// Errors: empty input, and any row whose key count differs from row 0's
/// (reported per offending row index). Warnings: any field whose
/// null/empty ratio exceeds 50%.
pub fn validate(rows: &[Record]) -> ValidationReport {
    let mut report = ValidationReport::default();

    if rows.is_empty() {
        report.errors.push("Data is empty".to_string());
        return report;
    }

    let expected = rows[0].len();
    for (i, row) in rows.iter().enumerate() {
        if row.len() != expected {
            report
                .errors
                .push(format!("Row {} has inconsistent columns", i));
        }
    }

    let mut null_counts: HashMap<String, usize> = HashMap::new();
    for row in rows {
        for (key, value) in row {
            if is_missing(Some(value)) {
                *null_counts.entry(key.clone()).or_insert(0) += 1;
            }
        }
    }
    let mut flagged: Vec<(&String, &usize)> = null_counts
        .iter()
        .filter(|(_, &count)| count as f64 > rows.len() as f64 * 0.5)
        .collect();
    flagged.sort();
    for (key, count) in flagged {
        report.warnings.push(format!(
            "Column '{}' has {} null values ({:.1}%)",
            key,
            count,
            *count as f64 / rows.len() as f64 * 100.0
        ));
    }

    report.valid = report.errors.is_empty();
    report
}

/// Replace missing cells (null or empty string) with a zero-value default.
///
/// The replacement is decided per cell from the cell's own runtime type. A
/// missing cell never carries a numeric type at replacement time, so the
/// default is the empty string; numeric cells are by definition present and
/// pass through untouched.
pub fn clean(rows: &[Record]) -> Vec<Record> {
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|(key, value)| {
                    let cleaned = if is_missing(Some(value)) {
                        Value::String(String::new())
                    } else {
                        value.clone()
                    };
                    (key.clone(), cleaned)
                })
                .collect()
        })
        .collect()
}

/// Keep the first-seen record per distinct value of `key`, preserving
/// order. Values are compared with type identity: the number 1 and the
/// string "1" are different keys.
pub fn remove_duplicates(rows: &[Record], key: &str) -> Vec<Record> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter(|row| seen.insert(identity_key(row.get(key))))
        .cloned()
        .collect()
}

/// Drop missing cells and trim string cells, shrinking the in-memory
/// footprint of a dataset before it is stored.
pub fn optimize(rows: &[Record]) -> Vec<Record> {
    rows.iter()
        .map(|row| {
            row.iter()
                .filter(|(_, value)| !is_missing(Some(value)))
                .map(|(key, value)| {
                    let value = match value {
                        Value::String(s) => Value::String(s.trim().to_string()),
                        other => other.clone(),
                    };
                    (key.clone(), value)
                })
                .collect()
        })
        .collect()
}

/// Split a dataset into fixed-size chunks (the last one may be shorter).
pub fn chunk(rows: &[Record], chunk_size: usize) -> Vec<Vec<Record>> {
    if chunk_size == 0 {
        return vec![rows.to_vec()];
    }
    rows.chunks(chunk_size).map(|c| c.to_vec()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glance_core::record_from_pairs;
    use serde_json::json;

    #[test]
    fn test_validate_empty() {
        let report = validate(&[]);
        assert!(!report.valid);
        assert_eq!(report.errors, vec!["Data is empty".to_string()]);
    }

    #[test]
    fn test_validate_inconsistent_columns() {
        let rows = vec![
            record_from_pairs(&[("a", json!(1)), ("b", json!(2))]),
            record_from_pairs(&[("a", json!(1))]),
        ];
        let report = validate(&rows);
        assert!(!report.valid);
        assert!(report.errors[0].contains("Row 1"));
    }

    #[test]
    fn test_validate_mostly_null_column_is_warning() {
        let rows = vec![
            record_from_pairs(&[("a", json!(1)), ("b", json!(null))]),
            record_from_pairs(&[("a", json!(2)), ("b", json!(null))]),
            record_from_pairs(&[("a", json!(3)), ("b", json!("x"))]),
        ];
        let report = validate(&rows);
        assert!(report.valid);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("'b'"));
        assert!(report.warnings[0].contains("66.7%"));
    }

    #[test]
    fn test_clean_replaces_missing_cells() {
        let rows = vec![record_from_pairs(&[
            ("a", json!(null)),
            ("b", json!("")),
            ("c", json!(5)),
        ])];
        let cleaned = clean(&rows);
        assert_eq!(cleaned[0].get("a"), Some(&json!("")));
        assert_eq!(cleaned[0].get("b"), Some(&json!("")));
        assert_eq!(cleaned[0].get("c"), Some(&json!(5)));
    }

    #[test]
    fn test_remove_duplicates_first_seen_wins() {
        let rows = vec![
            record_from_pairs(&[("id", json!(1)), ("v", json!("first"))]),
            record_from_pairs(&[("id", json!(1)), ("v", json!("second"))]),
            record_from_pairs(&[("id", json!(2)), ("v", json!("third"))]),
        ];
        let deduped = remove_duplicates(&rows, "id");
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].get("v"), Some(&json!("first")));
        assert_eq!(deduped[1].get("id"), Some(&json!(2)));
    }

    #[test]
    fn test_remove_duplicates_type_identity() {
        let rows = vec![
            record_from_pairs(&[("id", json!(1))]),
            record_from_pairs(&[("id", json!("1"))]),
        ];
        assert_eq!(remove_duplicates(&rows, "id").len(), 2);
    }

    #[test]
    fn test_optimize_drops_missing_and_trims() {
        let rows = vec![record_from_pairs(&[
            ("a", json!("  padded  ")),
            ("b", json!(null)),
        ])];
        let optimized = optimize(&rows);
        assert_eq!(optimized[0].get("a"), Some(&json!("padded")));
        assert!(optimized[0].get("b").is_none());
    }

    #[test]
    fn test_chunk_sizes() {
        let rows: Vec<Record> = (0..5)
            .map(|i| record_from_pairs(&[("i", json!(i))]))
            .collect();
        let chunks = chunk(&rows, 2);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].len(), 1);
    }
}
