//! Keyword-driven assistant.
//!
//! Rules live in one ordered table; the first rule whose keyword matches
//! the lowercased query wins, so adding a rule never silently reorders the
//! matching behavior. Every reply is computed from the dataset, but the
//! phrasing is canned.

use glance_core::{display_string, format_thousands, metric_value, Aggregation, Record};
use glance_engine::aggregate;
use glance_stats::{mean, std_dev};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
pub struct AssistantReply {
    pub answer: String,
    pub recommendation: String,
}

struct Rule {
    keywords: &'static [&'static str],
    /// Field-name substrings that pick the metric this rule talks about.
    field_hints: &'static [&'static str],
    handler: fn(&[Record], &str) -> String,
    recommendation: &'static str,
}

/// Matching is first-hit in table order.
const RULES: &[Rule] = &[
    Rule {
        keywords: &["salary", "pay", "compensation"],
        field_hints: &["salary", "pay", "compensation"],
        handler: spread_answer,
        recommendation: "A bar chart of this field grouped by team makes the spread obvious.",
    },
    Rule {
        keywords: &["performance", "score", "rating"],
        field_hints: &["performance", "score", "rating"],
        handler: leader_answer,
        recommendation: "Try a boxplot per group to see who drives the average.",
    },
    Rule {
        keywords: &["outlier", "unusual", "anomal"],
        field_hints: &[],
        handler: outlier_answer,
        recommendation: "A scatter chart makes these rows easy to spot.",
    },
    Rule {
        keywords: &["department", "compare", "region", "breakdown"],
        field_hints: &["department", "region", "category", "team"],
        handler: group_answer,
        recommendation: "A pie chart of the group totals shows each share at a glance.",
    },
    Rule {
        keywords: &["top", "best", "highest"],
        field_hints: &[],
        handler: top_answer,
        recommendation: "Sort a table visualization by this column to browse the leaders.",
    },
];

/// Answer a free-text question about a dataset.
pub fn answer(query: &str, rows: &[Record]) -> AssistantReply {
    let lowered = query.to_lowercase();

    for rule in RULES {
        if rule.keywords.iter().any(|k| lowered.contains(k)) {
            let field = pick_field(rows, rule.field_hints);
            tracing::debug!(field = %field, "assistant rule matched");
            return AssistantReply {
                answer: (rule.handler)(rows, &field),
                recommendation: rule.recommendation.to_string(),
            };
        }
    }

    AssistantReply {
        answer: overview_answer(rows),
        recommendation:
            "Ask about a specific field, or about outliers, comparisons or top performers."
                .to_string(),
    }
}

/// First field whose name contains a hint; otherwise the first numeric
/// field of row 0; otherwise the first field at all.
fn pick_field(rows: &[Record], hints: &[&str]) -> String {
    let Some(first) = rows.first() else {
        return String::new();
    };
    for hint in hints {
        if let Some(key) = first.keys().find(|k| k.to_lowercase().contains(hint)) {
            return key.clone();
        }
    }
    first
        .iter()
        .find(|(_, v)| matches!(v, Value::Number(_)))
        .map(|(k, _)| k.clone())
        .or_else(|| first.keys().next().cloned())
        .unwrap_or_default()
}

fn numeric_column(rows: &[Record], field: &str) -> Vec<f64> {
    rows.iter().map(|r| metric_value(r.get(field))).collect()
}

fn first_text_field(rows: &[Record]) -> Option<String> {
    rows.first()?
        .iter()
        .find(|(_, v)| matches!(v, Value::String(_)))
        .map(|(k, _)| k.clone())
}

fn spread_answer(rows: &[Record], field: &str) -> String {
    if rows.is_empty() {
        return "There is no data to analyze yet.".to_string();
    }
    let values = numeric_column(rows, field);
    let avg = mean(&values);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    format!(
        "The average {} is {}. Values range from {} to {} across {} rows.",
        field,
        format_thousands(avg),
        format_thousands(min),
        format_thousands(max),
        rows.len()
    )
}

fn leader_answer(rows: &[Record], field: &str) -> String {
    if rows.is_empty() {
        return "There is no data to analyze yet.".to_string();
    }
    let values = numeric_column(rows, field);
    let avg = mean(&values);
    let (best_idx, best) = values
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, v)| (i, *v))
        .unwrap_or((0, 0.0));

    let who = first_text_field(rows)
        .map(|label| display_string(rows[best_idx].get(&label)))
        .unwrap_or_else(|| format!("row {}", best_idx));
    format!(
        "Average {} is {}. The leader is {} at {}.",
        field,
        format_thousands(avg),
        who,
        format_thousands(best)
    )
}

fn outlier_answer(rows: &[Record], field: &str) -> String {
    if rows.is_empty() {
        return "There is no data to analyze yet.".to_string();
    }
    let values = numeric_column(rows, field);
    let avg = mean(&values);
    let sd = std_dev(&values);
    if sd == 0.0 {
        return format!("Every {} value is identical, so there are no outliers.", field);
    }
    let outliers = values.iter().filter(|v| (**v - avg).abs() > 2.0 * sd).count();
    if outliers == 0 {
        format!(
            "No {} value sits more than two standard deviations from the mean of {}.",
            field,
            format_thousands(avg)
        )
    } else {
        format!(
            "{} of {} {} values sit more than two standard deviations from the mean of {}.",
            outliers,
            values.len(),
            field,
            format_thousands(avg)
        )
    }
}

fn group_answer(rows: &[Record], field: &str) -> String {
    if rows.is_empty() {
        return "There is no data to analyze yet.".to_string();
    }
    let metric = pick_field(rows, &[]);
    let groups = aggregate(rows, field, &metric, Aggregation::Sum);
    let Some(top) = groups
        .iter()
        .max_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(std::cmp::Ordering::Equal))
    else {
        return "There is no data to analyze yet.".to_string();
    };
    format!(
        "Across {} groups of {}, {} leads with a total {} of {}.",
        groups.len(),
        field,
        top.key,
        metric,
        format_thousands(top.value)
    )
}

fn top_answer(rows: &[Record], field: &str) -> String {
    if rows.is_empty() {
        return "There is no data to analyze yet.".to_string();
    }
    let mut indexed: Vec<(usize, f64)> = numeric_column(rows, field)
        .into_iter()
        .enumerate()
        .collect();
    indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let label = first_text_field(rows);
    let leaders: Vec<String> = indexed
        .iter()
        .take(3)
        .map(|(i, v)| {
            let name = label
                .as_ref()
                .map(|l| display_string(rows[*i].get(l)))
                .unwrap_or_else(|| format!("row {}", i));
            format!("{} ({})", name, format_thousands(*v))
        })
        .collect();
    format!("Top {} by {}: {}.", leaders.len(), field, leaders.join(", "))
}

fn overview_answer(rows: &[Record]) -> String {
    let Some(first) = rows.first() else {
        return "The dataset is empty. Upload some data first.".to_string();
    };
    let numeric: Vec<&String> = first
        .iter()
        .filter(|(_, v)| matches!(v, Value::Number(_)))
        .map(|(k, _)| k)
        .collect();
    format!(
        "This dataset has {} rows and {} fields. Numeric fields: {}.",
        rows.len(),
        first.len(),
        if numeric.is_empty() {
            "none".to_string()
        } else {
            numeric
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        }
    )
}
