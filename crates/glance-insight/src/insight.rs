//! Heuristic insight generation.
//!
//! Insights are canned observations computed from the same coerced metric
//! values the charts plot, so an insight never disagrees with the picture
//! next to it.

use glance_core::{
    display_string, format_thousands, is_missing, metric_value, Aggregation, ChartSpec, Record,
};
use glance_engine::aggregate;
use glance_stats::{mean, std_dev};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Success,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Trend,
    Outlier,
    Comparison,
    DataQuality,
}

#[derive(Debug, Clone, Serialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

/// Insights for one configured chart. The set of heuristics applied depends
/// on the chart kind: trend for time-like series, top/bottom comparison for
/// categorical charts, outlier and null checks for everything with a metric.
pub fn chart_insights(rows: &[Record], spec: &ChartSpec) -> Vec<Insight> {
    let mut insights = Vec::new();
    let Some(metric) = spec.value_field() else {
        return insights;
    };

    let values: Vec<f64> = rows.iter().map(|r| metric_value(r.get(metric))).collect();
    if values.is_empty() {
        return insights;
    }

    if matches!(spec, ChartSpec::Line { .. } | ChartSpec::Area { .. }) {
        if let Some(trend) = trend_insight(metric, &values) {
            insights.push(trend);
        }
    }

    if let (Some(label), true) = (
        spec.label_field(),
        matches!(spec, ChartSpec::Bar { .. } | ChartSpec::Pie { .. }),
    ) {
        if let Some(comparison) = comparison_insight(rows, label, metric) {
            insights.push(comparison);
        }
    }

    if let Some(outlier) = outlier_insight(rows, spec.label_field(), metric, &values) {
        insights.push(outlier);
    }

    if let Some(quality) = null_insight(rows, metric) {
        insights.push(quality);
    }

    tracing::debug!(chart = spec.kind(), count = insights.len(), "chart insights");
    insights
}

/// Dataset-level insights: per numeric field (judged from row 0), a trend
/// note and an outlier count. Capped at five so the panel stays scannable.
pub fn dataset_insights(rows: &[Record]) -> Vec<Insight> {
    let mut insights = Vec::new();
    let Some(first) = rows.first() else {
        return insights;
    };

    let numeric_fields: Vec<&String> = first
        .iter()
        .filter(|(_, v)| matches!(v, Value::Number(_)))
        .map(|(k, _)| k)
        .collect();

    for field in numeric_fields {
        if insights.len() >= 5 {
            break;
        }
        let values: Vec<f64> = rows.iter().map(|r| metric_value(r.get(field))).collect();

        if let Some(trend) = trend_insight(field, &values) {
            insights.push(trend);
        }
        if insights.len() >= 5 {
            break;
        }

        let avg = mean(&values);
        let sd = std_dev(&values);
        if sd > 0.0 {
            let outliers = values.iter().filter(|v| (**v - avg).abs() > 2.0 * sd).count();
            if outliers > 0 {
                insights.push(Insight {
                    kind: InsightKind::Outlier,
                    title: format!("Unusual values in {}", field),
                    description: format!(
                        "{} of {} values sit more than two standard deviations from the mean of {}.",
                        outliers,
                        values.len(),
                        format_thousands(avg)
                    ),
                    severity: Severity::Warning,
                });
            }
        }
    }

    insights.truncate(5);
    insights
}

/// Last-versus-first movement. When the series starts at zero a percent
/// change is undefined, so the description falls back to the absolute
/// change.
fn trend_insight(metric: &str, values: &[f64]) -> Option<Insight> {
    if values.len() < 2 {
        return None;
    }
    let first = values[0];
    let last = values[values.len() - 1];
    if last == first {
        return None;
    }

    let rising = last > first;
    let (title, severity) = if rising {
        (format!("{} is trending up", metric), Severity::Success)
    } else {
        (format!("{} is trending down", metric), Severity::Warning)
    };
    let description = if first != 0.0 {
        let percent = (last - first) / first * 100.0;
        format!(
            "{} moved from {} to {} ({:+.1}% over the series).",
            metric,
            format_thousands(first),
            format_thousands(last),
            percent
        )
    } else {
        format!(
            "{} moved from 0 to {} over the series.",
            metric,
            format_thousands(last)
        )
    };

    Some(Insight {
        kind: InsightKind::Trend,
        title,
        description,
        severity,
    })
}

/// Gap between the largest and smallest group totals.
fn comparison_insight(rows: &[Record], label: &str, metric: &str) -> Option<Insight> {
    let groups = aggregate(rows, label, metric, Aggregation::Sum);
    if groups.len() < 2 {
        return None;
    }
    let top = groups
        .iter()
        .max_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(std::cmp::Ordering::Equal))?;
    let bottom = groups
        .iter()
        .min_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(std::cmp::Ordering::Equal))?;

    let description = if bottom.value != 0.0 {
        format!(
            "{} leads with {}, {:.1}x the lowest group {} at {}.",
            top.key,
            format_thousands(top.value),
            top.value / bottom.value,
            bottom.key,
            format_thousands(bottom.value)
        )
    } else {
        format!(
            "{} leads with {}; {} recorded nothing.",
            top.key,
            format_thousands(top.value),
            bottom.key
        )
    };

    Some(Insight {
        kind: InsightKind::Comparison,
        title: format!("{} dominates {}", top.key, label),
        description,
        severity: Severity::Info,
    })
}

/// Rows whose metric is far from the mean (above 1.5x or below 0.5x), with
/// up to three example labels.
fn outlier_insight(
    rows: &[Record],
    label: Option<&str>,
    metric: &str,
    values: &[f64],
) -> Option<Insight> {
    let avg = mean(values);
    if !avg.is_finite() || avg == 0.0 {
        return None;
    }

    let mut examples = Vec::new();
    let mut count = 0usize;
    for (row, value) in rows.iter().zip(values) {
        if *value > avg * 1.5 || *value < avg * 0.5 {
            count += 1;
            if examples.len() < 3 {
                let name = label
                    .map(|l| display_string(row.get(l)))
                    .unwrap_or_else(|| format_thousands(*value));
                examples.push(name);
            }
        }
    }
    if count == 0 {
        return None;
    }

    Some(Insight {
        kind: InsightKind::Outlier,
        title: format!("{} outliers in {}", count, metric),
        description: format!(
            "{} rows deviate strongly from the average of {} (e.g. {}).",
            count,
            format_thousands(avg),
            examples.join(", ")
        ),
        severity: Severity::Warning,
    })
}

fn null_insight(rows: &[Record], metric: &str) -> Option<Insight> {
    let nulls = rows.iter().filter(|r| is_missing(r.get(metric))).count();
    if nulls == 0 {
        return None;
    }
    Some(Insight {
        kind: InsightKind::DataQuality,
        title: format!("Missing values in {}", metric),
        description: format!(
            "{} of {} rows have no value for {}; they plot as 0.",
            nulls,
            rows.len(),
            metric
        ),
        severity: Severity::Warning,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glance_core::record_from_pairs;
    use serde_json::json;

    fn monthly(values: &[i64]) -> Vec<Record> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                record_from_pairs(&[("month", json!(format!("m{}", i))), ("sales", json!(*v))])
            })
            .collect()
    }

    #[test]
    fn test_line_trend_up() {
        let spec = ChartSpec::Line {
            x_axis: "month".into(),
            y_axis: "sales".into(),
            aggregation: None,
        };
        let insights = chart_insights(&monthly(&[100, 120, 150]), &spec);
        let trend = insights
            .iter()
            .find(|i| i.kind == InsightKind::Trend)
            .unwrap();
        assert_eq!(trend.severity, Severity::Success);
        assert!(trend.description.contains("+50.0%"));
    }

    #[test]
    fn test_trend_from_zero_reports_absolute_change() {
        let spec = ChartSpec::Line {
            x_axis: "month".into(),
            y_axis: "sales".into(),
            aggregation: None,
        };
        let insights = chart_insights(&monthly(&[0, 50]), &spec);
        let trend = insights
            .iter()
            .find(|i| i.kind == InsightKind::Trend)
            .unwrap();
        assert!(!trend.description.contains('%'));
        assert!(trend.description.contains("from 0 to 50"));
    }

    #[test]
    fn test_bar_comparison() {
        let rows = vec![
            record_from_pairs(&[("region", json!("EU")), ("sales", json!(100))]),
            record_from_pairs(&[("region", json!("US")), ("sales", json!(25))]),
        ];
        let spec = ChartSpec::Bar {
            x_axis: "region".into(),
            y_axis: "sales".into(),
            aggregation: Some(Aggregation::Sum),
        };
        let insights = chart_insights(&rows, &spec);
        let comparison = insights
            .iter()
            .find(|i| i.kind == InsightKind::Comparison)
            .unwrap();
        assert!(comparison.title.contains("EU"));
        assert!(comparison.description.contains("4.0x"));
    }

    #[test]
    fn test_outlier_examples_capped_at_three() {
        let mut rows = monthly(&[10, 10, 10, 10]);
        rows.extend(monthly(&[500, 600, 700, 800]));
        let spec = ChartSpec::Bar {
            x_axis: "month".into(),
            y_axis: "sales".into(),
            aggregation: None,
        };
        let insights = chart_insights(&rows, &spec);
        let outlier = insights
            .iter()
            .find(|i| i.kind == InsightKind::Outlier)
            .unwrap();
        assert_eq!(outlier.description.matches("m").count() >= 3, true);
        assert!(outlier.title.starts_with(&format!("{} outliers", 8)));
    }

    #[test]
    fn test_null_metric_flagged() {
        let rows = vec![
            record_from_pairs(&[("month", json!("m0")), ("sales", json!(10))]),
            record_from_pairs(&[("month", json!("m1")), ("sales", json!(null))]),
        ];
        let spec = ChartSpec::Kpi {
            metric: "sales".into(),
        };
        let insights = chart_insights(&rows, &spec);
        assert!(insights.iter().any(|i| i.kind == InsightKind::DataQuality));
    }

    #[test]
    fn test_dataset_insights_capped() {
        let rows: Vec<Record> = (0..50)
            .map(|i| {
                record_from_pairs(&[
                    ("a", json!(i)),
                    ("b", json!(i * 2)),
                    ("c", json!(i * 3)),
                    ("d", json!(i * 4)),
                ])
            })
            .collect();
        let insights = dataset_insights(&rows);
        assert!(!insights.is_empty());
        assert!(insights.len() <= 5);
    }

    #[test]
    fn test_empty_dataset_no_insights() {
        assert!(dataset_insights(&[]).is_empty());
        let spec = ChartSpec::Kpi {
            metric: "sales".into(),
        };
        assert!(chart_insights(&[], &spec).is_empty());
    }
}
