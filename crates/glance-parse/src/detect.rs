//! Field-kind inference by sampling.

use glance_core::{coerce_number, is_missing, FieldKind, FieldTypes, Record};

/// How many leading rows participate in the sample.
const SAMPLE_ROWS: usize = 100;

/// Infer a kind per field by sampling the first 100 rows: a field is
/// numeric when more than 80% of its sampled values parse as finite
/// numbers. The field set is taken from the first row.
///
/// The result is advisory only — a sample proves nothing about later rows,
/// so consumers re-check cells at use time.
pub fn detect_field_types(rows: &[Record]) -> FieldTypes {
    let mut fields = FieldTypes::new();
    let Some(first) = rows.first() else {
        return fields;
    };

    let sample = &rows[..rows.len().min(SAMPLE_ROWS)];
    for key in first.keys() {
        let numeric_count = sample
            .iter()
            .filter(|row| {
                let cell = row.get(key);
                if is_missing(cell) {
                    return false;
                }
                coerce_number(cell).is_finite()
            })
            .count();

        let kind = if numeric_count as f64 > sample.len() as f64 * 0.8 {
            FieldKind::Number
        } else {
            FieldKind::Text
        };
        fields.insert(key.clone(), kind);
    }

    fields
}

/// Numeric vs categorical field split, for config pickers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSuggestions {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
}

pub fn field_suggestions(fields: &FieldTypes) -> FieldSuggestions {
    let mut suggestions = FieldSuggestions::default();
    let mut names: Vec<&String> = fields.keys().collect();
    names.sort();
    for name in names {
        match fields[name] {
            FieldKind::Number => suggestions.numeric.push(name.clone()),
            FieldKind::Text => suggestions.categorical.push(name.clone()),
        }
    }
    suggestions
}
