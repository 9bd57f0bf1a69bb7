//! Plain-text summary report.
//!
//! Field roles (sales, profit, category, region, product) are auto-detected
//! from field names, with a numeric fallback for the sales column, so a
//! report can be produced from any vaguely commercial dataset without
//! configuration.

use glance_core::{display_string, format_thousands, metric_value, Record};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
pub struct RegionRollup {
    pub name: String,
    pub sales: f64,
    pub profit: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub row_count: usize,
    pub total_sales: f64,
    pub total_profit: f64,
    /// Percent; 0 when total sales is 0.
    pub profit_margin: f64,
    pub by_category: Vec<RegionRollup>,
    pub by_region: Vec<RegionRollup>,
    /// Top five products by sales, descending.
    pub top_products: Vec<(String, f64)>,
}

fn find_field(first: &Record, hints: &[&str]) -> Option<String> {
    for hint in hints {
        if let Some(key) = first.keys().find(|k| k.to_lowercase().contains(hint)) {
            return Some(key.clone());
        }
    }
    None
}

fn first_numeric_field(first: &Record) -> Option<String> {
    first
        .iter()
        .find(|(_, v)| matches!(v, Value::Number(_)))
        .map(|(k, _)| k.clone())
}

fn rollup(rows: &[Record], group_field: &str, sales: &str, profit: Option<&str>) -> Vec<RegionRollup> {
    let mut order: Vec<String> = Vec::new();
    let mut totals: std::collections::HashMap<String, RegionRollup> =
        std::collections::HashMap::new();
    for row in rows {
        let name = display_string(row.get(group_field));
        let entry = totals.entry(name.clone()).or_insert_with(|| {
            order.push(name.clone());
            RegionRollup {
                name,
                sales: 0.0,
                profit: 0.0,
                count: 0,
            }
        });
        entry.sales += metric_value(row.get(sales));
        if let Some(profit_field) = profit {
            entry.profit += metric_value(row.get(profit_field));
        }
        entry.count += 1;
    }
    order
        .into_iter()
        .filter_map(|name| totals.remove(&name))
        .collect()
}

/// Build the summary. Empty input produces an all-zero summary.
pub fn build_report(rows: &[Record]) -> ReportSummary {
    let Some(first) = rows.first() else {
        return ReportSummary {
            row_count: 0,
            total_sales: 0.0,
            total_profit: 0.0,
            profit_margin: 0.0,
            by_category: Vec::new(),
            by_region: Vec::new(),
            top_products: Vec::new(),
        };
    };

    let sales_field = find_field(first, &["sales", "revenue", "amount"])
        .or_else(|| first_numeric_field(first))
        .unwrap_or_else(|| first.keys().next().cloned().unwrap_or_default());
    let profit_field = find_field(first, &["profit", "margin"]);
    let category_field = find_field(first, &["category", "segment"]);
    let region_field = find_field(first, &["region", "state", "city", "country"]);
    let product_field = find_field(first, &["product", "name", "item"]);

    let total_sales: f64 = rows
        .iter()
        .map(|r| metric_value(r.get(&sales_field)))
        .sum();
    let total_profit: f64 = profit_field
        .as_ref()
        .map(|f| rows.iter().map(|r| metric_value(r.get(f))).sum())
        .unwrap_or(0.0);
    let profit_margin = if total_sales != 0.0 {
        total_profit / total_sales * 100.0
    } else {
        0.0
    };

    let by_category = category_field
        .as_ref()
        .map(|f| rollup(rows, f, &sales_field, profit_field.as_deref()))
        .unwrap_or_default();
    let by_region = region_field
        .as_ref()
        .map(|f| rollup(rows, f, &sales_field, profit_field.as_deref()))
        .unwrap_or_default();

    let mut top_products: Vec<(String, f64)> = product_field
        .as_ref()
        .map(|f| {
            rollup(rows, f, &sales_field, None)
                .into_iter()
                .map(|r| (r.name, r.sales))
                .collect()
        })
        .unwrap_or_default();
    top_products.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    top_products.truncate(5);

    ReportSummary {
        row_count: rows.len(),
        total_sales,
        total_profit,
        profit_margin,
        by_category,
        by_region,
        top_products,
    }
}

/// Render the summary as indented plain text.
pub fn render_text(summary: &ReportSummary) -> String {
    let mut out = String::new();
    out.push_str("DATASET SUMMARY\n");
    out.push_str(&format!("  Rows: {}\n", summary.row_count));
    out.push_str(&format!(
        "  Total sales: {}\n",
        format_thousands(summary.total_sales)
    ));
    if summary.total_profit != 0.0 {
        out.push_str(&format!(
            "  Total profit: {} ({:.1}% margin)\n",
            format_thousands(summary.total_profit),
            summary.profit_margin
        ));
    }

    if !summary.by_category.is_empty() {
        out.push_str("\nBY CATEGORY\n");
        for r in &summary.by_category {
            out.push_str(&format!(
                "  {}: sales {}, profit {}, {} rows\n",
                r.name,
                format_thousands(r.sales),
                format_thousands(r.profit),
                r.count
            ));
        }
    }

    if !summary.by_region.is_empty() {
        out.push_str("\nBY REGION\n");
        for r in &summary.by_region {
            out.push_str(&format!(
                "  {}: sales {}, {} rows\n",
                r.name,
                format_thousands(r.sales),
                r.count
            ));
        }
    }

    if !summary.top_products.is_empty() {
        out.push_str("\nTOP PRODUCTS\n");
        for (i, (name, sales)) in summary.top_products.iter().enumerate() {
            out.push_str(&format!(
                "  {}. {}: {}\n",
                i + 1,
                name,
                format_thousands(*sales)
            ));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use glance_core::record_from_pairs;
    use serde_json::json;

    fn orders() -> Vec<Record> {
        vec![
            record_from_pairs(&[
                ("product", json!("Widget")),
                ("category", json!("Hardware")),
                ("region", json!("EU")),
                ("sales", json!(100)),
                ("profit", json!(20)),
            ]),
            record_from_pairs(&[
                ("product", json!("Gadget")),
                ("category", json!("Hardware")),
                ("region", json!("US")),
                ("sales", json!(300)),
                ("profit", json!(60)),
            ]),
            record_from_pairs(&[
                ("product", json!("License")),
                ("category", json!("Software")),
                ("region", json!("EU")),
                ("sales", json!(600)),
                ("profit", json!(300)),
            ]),
        ]
    }

    #[test]
    fn test_build_report_totals() {
        let report = build_report(&orders());
        assert_eq!(report.total_sales, 1000.0);
        assert_eq!(report.total_profit, 380.0);
        assert!((report.profit_margin - 38.0).abs() < 1e-9);
    }

    #[test]
    fn test_build_report_rollups() {
        let report = build_report(&orders());
        assert_eq!(report.by_category.len(), 2);
        let hardware = &report.by_category[0];
        assert_eq!(hardware.name, "Hardware");
        assert_eq!(hardware.sales, 400.0);
        assert_eq!(hardware.count, 2);

        let eu = report.by_region.iter().find(|r| r.name == "EU").unwrap();
        assert_eq!(eu.sales, 700.0);
    }

    #[test]
    fn test_top_products_sorted() {
        let report = build_report(&orders());
        assert_eq!(report.top_products[0], ("License".to_string(), 600.0));
        assert_eq!(report.top_products.len(), 3);
    }

    #[test]
    fn test_sales_field_falls_back_to_first_numeric() {
        let rows = vec![record_from_pairs(&[
            ("label", json!("x")),
            ("score", json!(42)),
        ])];
        let report = build_report(&rows);
        assert_eq!(report.total_sales, 42.0);
    }

    #[test]
    fn test_render_text_sections() {
        let text = render_text(&build_report(&orders()));
        assert!(text.starts_with("DATASET SUMMARY"));
        assert!(text.contains("Total sales: 1,000"));
        assert!(text.contains("BY CATEGORY"));
        assert!(text.contains("1. License: 600"));
    }

    #[test]
    fn test_empty_report() {
        let report = build_report(&[]);
        assert_eq!(report.row_count, 0);
        let text = render_text(&report);
        assert!(text.contains("Rows: 0"));
        assert!(!text.contains("BY CATEGORY"));
    }
}
