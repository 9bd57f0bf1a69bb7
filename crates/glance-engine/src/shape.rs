//! Chart shaping: resolve a chart configuration against a dataset into the
//! exact structure that chart kind renders.
//!
//! Shaping is the single place where sampling, grouping and per-kind
//! restructuring compose. KPI summaries always read the full dataset; every
//! other kind honors the visualization's sample cap.

use crate::aggregate::aggregate;
use crate::slice::{paginate, sample};
use glance_core::{
    coerce_number, display_string, is_missing, metric_value, ChartSpec, GroupedRow, Page, Record,
    Visualization,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShapeError {
    /// Heatmaps render a fixed grid; axes with more than 10 distinct
    /// values each would not fit a legible cell matrix.
    #[error("heatmap axes too dense: {x} x {y} distinct values (limit 10 x 10)")]
    HeatmapTooDense { x: usize, y: usize },
    #[error("bubble chart requires numeric x and y axes")]
    NonNumericAxes,
}

/// One cell of a heatmap grid: mean metric over the matching rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeatCell {
    pub value: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapMatrix {
    pub x_labels: Vec<String>,
    pub y_labels: Vec<String>,
    /// Indexed `cells[y][x]`, aligned with the label vectors.
    pub cells: Vec<Vec<HeatCell>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BubblePoint {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub label: String,
}

/// Five-number summary per category, quartiles by index on the sorted
/// values (no interpolation).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxStats {
    pub category: String,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub iqr: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaterfallStep {
    pub label: String,
    pub value: f64,
    /// Running total before this step.
    pub start: f64,
    /// Running total after this step.
    pub cumulative: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KpiSummary {
    pub total: f64,
    pub average: f64,
    pub count: usize,
}

/// Shaped output, one variant per family of chart kinds. Adjacently
/// tagged, so sequence-valued variants serialize cleanly.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", content = "data", rename_all = "lowercase")]
pub enum ShapedData {
    /// bar, line, area, scatter, radar
    Series(Vec<GroupedRow>),
    /// pie, treemap: sorted descending by value, truncated to the cap
    Slices(Vec<GroupedRow>),
    Matrix(HeatmapMatrix),
    Points(Vec<BubblePoint>),
    Boxes(Vec<BoxStats>),
    Waterfall(Vec<WaterfallStep>),
    Kpi(KpiSummary),
    Table(Page<Record>),
}

/// Shape a stored visualization against its dataset's rows.
pub fn shape(viz: &Visualization, rows: &[Record]) -> Result<ShapedData, ShapeError> {
    shape_spec(&viz.spec, viz.sample_size, rows)
}

/// Shape rows for one chart configuration, sampling down to `sample_size`
/// first when set (KPI excepted, it summarizes the full dataset).
pub fn shape_spec(
    spec: &ChartSpec,
    sample_size: Option<usize>,
    rows: &[Record],
) -> Result<ShapedData, ShapeError> {
    let sampled;
    let working: &[Record] = match sample_size {
        Some(k) if rows.len() > k && !matches!(spec, ChartSpec::Kpi { .. }) => {
            sampled = sample(rows, k);
            tracing::debug!(from = rows.len(), to = sampled.len(), "sampled dataset");
            &sampled
        }
        _ => rows,
    };

    let shaped = match spec {
        ChartSpec::Bar {
            x_axis,
            y_axis,
            aggregation,
        }
        | ChartSpec::Line {
            x_axis,
            y_axis,
            aggregation,
        }
        | ChartSpec::Area {
            x_axis,
            y_axis,
            aggregation,
        } => match aggregation {
            Some(op) => ShapedData::Series(aggregate(working, x_axis, y_axis, *op)),
            None => ShapedData::Series(raw_series(working, x_axis, y_axis)),
        },
        ChartSpec::Scatter { x_axis, y_axis } => {
            ShapedData::Series(raw_series(working, x_axis, y_axis))
        }
        ChartSpec::Radar { category, metric } => {
            ShapedData::Series(raw_series(working, category, metric))
        }
        ChartSpec::Pie {
            label,
            metric,
            aggregation,
            max_entries,
        } => {
            let mut slices = aggregate(working, label, metric, aggregation.unwrap_or_default());
            sort_slices(&mut slices, *max_entries);
            ShapedData::Slices(slices)
        }
        ChartSpec::Treemap {
            category,
            metric,
            max_entries,
        } => {
            let mut slices = treemap_groups(working, category, metric);
            sort_slices(&mut slices, *max_entries);
            ShapedData::Slices(slices)
        }
        ChartSpec::Heatmap {
            x_axis,
            y_axis,
            metric,
        } => ShapedData::Matrix(heatmap_matrix(working, x_axis, y_axis, metric)?),
        ChartSpec::Bubble {
            x_axis,
            y_axis,
            size_field,
        } => ShapedData::Points(bubble_points(working, x_axis, y_axis, size_field)?),
        ChartSpec::Boxplot { category, metric } => {
            ShapedData::Boxes(box_stats(working, category, metric))
        }
        ChartSpec::Waterfall { category, metric } => {
            ShapedData::Waterfall(waterfall_steps(working, category, metric))
        }
        ChartSpec::Kpi { metric } => ShapedData::Kpi(kpi_summary(rows, metric)),
        ChartSpec::Table { page_size } => ShapedData::Table(paginate(working, 1, *page_size)),
    };

    Ok(shaped)
}

/// One point per row, no grouping. Non-numeric metric cells plot as 0.
fn raw_series(rows: &[Record], label: &str, metric: &str) -> Vec<GroupedRow> {
    rows.iter()
        .map(|row| GroupedRow {
            key: display_string(row.get(label)),
            value: metric_value(row.get(metric)),
        })
        .collect()
}

fn sort_slices(slices: &mut Vec<GroupedRow>, max_entries: Option<usize>) {
    slices.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(std::cmp::Ordering::Equal));
    if let Some(cap) = max_entries {
        slices.truncate(cap);
    }
}

/// Treemap grouping sums per category, with missing and empty category
/// cells pooled under "Unknown".
fn treemap_groups(rows: &[Record], category: &str, metric: &str) -> Vec<GroupedRow> {
    let mut order: Vec<String> = Vec::new();
    let mut totals: std::collections::HashMap<String, f64> = std::collections::HashMap::new();
    for row in rows {
        let key = if is_missing(row.get(category)) {
            "Unknown".to_string()
        } else {
            display_string(row.get(category))
        };
        if !totals.contains_key(&key) {
            order.push(key.clone());
        }
        *totals.entry(key).or_insert(0.0) += metric_value(row.get(metric));
    }
    order
        .into_iter()
        .map(|key| {
            let value = totals[&key];
            GroupedRow { key, value }
        })
        .collect()
}

fn heatmap_matrix(
    rows: &[Record],
    x_axis: &str,
    y_axis: &str,
    metric: &str,
) -> Result<HeatmapMatrix, ShapeError> {
    let mut x_labels: Vec<String> = Vec::new();
    let mut y_labels: Vec<String> = Vec::new();
    for row in rows {
        let x = display_string(row.get(x_axis));
        if !x_labels.contains(&x) {
            x_labels.push(x);
        }
        let y = display_string(row.get(y_axis));
        if !y_labels.contains(&y) {
            y_labels.push(y);
        }
    }

    if x_labels.len() > 10 || y_labels.len() > 10 {
        return Err(ShapeError::HeatmapTooDense {
            x: x_labels.len(),
            y: y_labels.len(),
        });
    }
    x_labels.sort();
    y_labels.sort();

    let cells = y_labels
        .iter()
        .map(|y| {
            x_labels
                .iter()
                .map(|x| {
                    let mut sum = 0.0;
                    let mut count = 0usize;
                    for row in rows {
                        if &display_string(row.get(x_axis)) == x
                            && &display_string(row.get(y_axis)) == y
                        {
                            sum += metric_value(row.get(metric));
                            count += 1;
                        }
                    }
                    let value = if count > 0 { sum / count as f64 } else { 0.0 };
                    HeatCell { value, count }
                })
                .collect()
        })
        .collect();

    Ok(HeatmapMatrix {
        x_labels,
        y_labels,
        cells,
    })
}

fn bubble_points(
    rows: &[Record],
    x_axis: &str,
    y_axis: &str,
    size_field: &str,
) -> Result<Vec<BubblePoint>, ShapeError> {
    // Axis numericness is judged from the first row, matching field
    // detection's advisory nature; later non-numeric cells degrade to 0.
    let Some(first) = rows.first() else {
        return Ok(Vec::new());
    };
    if !coerce_number(first.get(x_axis)).is_finite()
        || !coerce_number(first.get(y_axis)).is_finite()
    {
        return Err(ShapeError::NonNumericAxes);
    }
    let size_numeric = coerce_number(first.get(size_field)).is_finite();

    Ok(rows
        .iter()
        .map(|row| {
            let size = if size_numeric {
                let s = metric_value(row.get(size_field));
                if s == 0.0 {
                    10.0
                } else {
                    s
                }
            } else {
                10.0
            };
            BubblePoint {
                x: metric_value(row.get(x_axis)),
                y: metric_value(row.get(y_axis)),
                size,
                label: display_string(row.get(x_axis)),
            }
        })
        .collect())
}

fn box_stats(rows: &[Record], category: &str, metric: &str) -> Vec<BoxStats> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: std::collections::HashMap<String, Vec<f64>> =
        std::collections::HashMap::new();
    for row in rows {
        let key = display_string(row.get(category));
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups
            .entry(key)
            .or_default()
            .push(metric_value(row.get(metric)));
    }

    order
        .into_iter()
        .map(|category| {
            let mut values = groups.remove(&category).unwrap_or_default();
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            let n = values.len();
            let q1 = values[n / 4];
            let median = values[n / 2];
            let q3 = values[n * 3 / 4];
            BoxStats {
                category,
                min: values[0],
                q1,
                median,
                q3,
                max: values[n - 1],
                iqr: q3 - q1,
            }
        })
        .collect()
}

fn waterfall_steps(rows: &[Record], category: &str, metric: &str) -> Vec<WaterfallStep> {
    let mut cumulative = 0.0;
    rows.iter()
        .map(|row| {
            let value = metric_value(row.get(metric));
            let start = cumulative;
            cumulative += value;
            WaterfallStep {
                label: display_string(row.get(category)),
                value,
                start,
                cumulative,
            }
        })
        .collect()
}

fn kpi_summary(rows: &[Record], metric: &str) -> KpiSummary {
    let total: f64 = rows.iter().map(|row| metric_value(row.get(metric))).sum();
    let count = rows.len();
    let average = if count > 0 { total / count as f64 } else { 0.0 };
    KpiSummary {
        total,
        average,
        count,
    }
}
