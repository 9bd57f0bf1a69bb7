//! Shorthand query parsing.
//!
//! A handful of fixed phrasings map straight to engine operations, so
//! "top 5 products by sales" works without any chart configuration. The
//! patterns are tried in order; anything else is rejected with a usage
//! hint.

use glance_core::{metric_value, Record};
use glance_stats::mean;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Could not understand the query. {0}")]
    Unrecognized(String),
}

/// What a shorthand query produced: either a row subset or a single number.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "result", rename_all = "lowercase")]
pub enum QueryOutcome {
    Table(Vec<Record>),
    Kpi { value: f64, label: String },
}

fn top_n_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)top\s+(\d+)\s+(?:rows|records|\w+)\s+by\s+([\w ]+)")
            .expect("pattern is a checked literal")
    })
}

fn reduce_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(average|avg|total|sum)\s+(?:of\s+)?([\w ]+)")
            .expect("pattern is a checked literal")
    })
}

/// Run a shorthand query against a dataset.
pub fn run_query(query: &str, rows: &[Record]) -> Result<QueryOutcome, QueryError> {
    let trimmed = query.trim();

    if let Some(caps) = top_n_pattern().captures(trimmed) {
        let n: usize = caps[1].parse().unwrap_or(10);
        let field = caps[2].trim().to_string();
        let mut sorted = rows.to_vec();
        sorted.sort_by(|a, b| {
            metric_value(b.get(&field))
                .partial_cmp(&metric_value(a.get(&field)))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        sorted.truncate(n);
        tracing::debug!(n, field = %field, "top-n query");
        return Ok(QueryOutcome::Table(sorted));
    }

    if let Some(caps) = reduce_pattern().captures(trimmed) {
        let op = caps[1].to_lowercase();
        let field = caps[2].trim().to_string();
        let values: Vec<f64> = rows.iter().map(|r| metric_value(r.get(&field))).collect();
        let (value, label) = match op.as_str() {
            "average" | "avg" => (mean(&values), format!("Average {}", field)),
            _ => (values.iter().sum(), format!("Total {}", field)),
        };
        return Ok(QueryOutcome::Kpi { value, label });
    }

    if trimmed.to_lowercase().contains("count") {
        return Ok(QueryOutcome::Kpi {
            value: rows.len() as f64,
            label: "Row count".to_string(),
        });
    }

    Err(QueryError::Unrecognized(
        "Try 'top 5 rows by sales', 'average sales', 'total sales' or 'count'.".to_string(),
    ))
}
