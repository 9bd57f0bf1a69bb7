//! File-format boundary for uploaded datasets.
//!
//! Converts raw CSV/JSON/spreadsheet content into ordered record
//! collections, infers per-field kinds by sampling, assesses data quality,
//! and exports datasets back out as CSV text or XLSX bytes.

mod detect;
mod export;
mod ingest;
mod quality;

pub use detect::{detect_field_types, field_suggestions, FieldSuggestions};
pub use export::{to_csv_string, to_xlsx_bytes};
pub use ingest::{parse_csv, parse_excel, parse_json, ParseError};
pub use quality::{chunk, clean, optimize, remove_duplicates, validate, ValidationReport};
