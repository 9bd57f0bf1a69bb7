//! Chart configuration as a tagged union.
//!
//! Each chart kind carries exactly the fields it needs, so a stored
//! visualization can be validated when it is constructed or loaded instead
//! of being duck-typed at every read site. Shaping still degrades
//! defensively at render time (missing field → 0-valued metric).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Reduction applied to the metric values of one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Sum,
    Avg,
    Count,
    Min,
    Max,
}

impl Aggregation {
    pub fn apply(&self, values: &[f64]) -> f64 {
        match self {
            Aggregation::Sum => values.iter().sum(),
            Aggregation::Avg => values.iter().sum::<f64>() / values.len() as f64,
            Aggregation::Count => values.len() as f64,
            Aggregation::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Aggregation::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

/// Advisory per-field kind, inferred by sampling. Renderers re-check at use
/// time since later rows may violate the sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "string")]
    Text,
}

/// Inferred field-name → kind map for one dataset.
pub type FieldTypes = HashMap<String, FieldKind>;

fn default_page_size() -> usize {
    50
}

/// The closed set of chart kinds and their configuration shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum ChartSpec {
    Bar {
        x_axis: String,
        y_axis: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        aggregation: Option<Aggregation>,
    },
    Line {
        x_axis: String,
        y_axis: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        aggregation: Option<Aggregation>,
    },
    Area {
        x_axis: String,
        y_axis: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        aggregation: Option<Aggregation>,
    },
    Scatter {
        x_axis: String,
        y_axis: String,
    },
    Pie {
        label: String,
        metric: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        aggregation: Option<Aggregation>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_entries: Option<usize>,
    },
    Radar {
        category: String,
        metric: String,
    },
    Heatmap {
        x_axis: String,
        y_axis: String,
        metric: String,
    },
    Treemap {
        category: String,
        metric: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_entries: Option<usize>,
    },
    Kpi {
        metric: String,
    },
    Table {
        #[serde(default = "default_page_size")]
        page_size: usize,
    },
    Bubble {
        x_axis: String,
        y_axis: String,
        size_field: String,
    },
    Boxplot {
        category: String,
        metric: String,
    },
    Waterfall {
        category: String,
        metric: String,
    },
}

#[derive(Debug, Error)]
pub enum SpecError {
    #[error("{chart} chart references unknown field '{field}'")]
    UnknownField { chart: &'static str, field: String },
}

impl ChartSpec {
    /// Tag name, matching the serialized `type` discriminant.
    pub fn kind(&self) -> &'static str {
        match self {
            ChartSpec::Bar { .. } => "bar",
            ChartSpec::Line { .. } => "line",
            ChartSpec::Area { .. } => "area",
            ChartSpec::Scatter { .. } => "scatter",
            ChartSpec::Pie { .. } => "pie",
            ChartSpec::Radar { .. } => "radar",
            ChartSpec::Heatmap { .. } => "heatmap",
            ChartSpec::Treemap { .. } => "treemap",
            ChartSpec::Kpi { .. } => "kpi",
            ChartSpec::Table { .. } => "table",
            ChartSpec::Bubble { .. } => "bubble",
            ChartSpec::Boxplot { .. } => "boxplot",
            ChartSpec::Waterfall { .. } => "waterfall",
        }
    }

    /// The field whose values label the x axis / categories, if any.
    pub fn label_field(&self) -> Option<&str> {
        match self {
            ChartSpec::Bar { x_axis, .. }
            | ChartSpec::Line { x_axis, .. }
            | ChartSpec::Area { x_axis, .. }
            | ChartSpec::Scatter { x_axis, .. }
            | ChartSpec::Heatmap { x_axis, .. }
            | ChartSpec::Bubble { x_axis, .. } => Some(x_axis),
            ChartSpec::Pie { label, .. } => Some(label),
            ChartSpec::Radar { category, .. }
            | ChartSpec::Treemap { category, .. }
            | ChartSpec::Boxplot { category, .. }
            | ChartSpec::Waterfall { category, .. } => Some(category),
            ChartSpec::Kpi { .. } | ChartSpec::Table { .. } => None,
        }
    }

    /// The numeric field the chart plots, if any.
    pub fn value_field(&self) -> Option<&str> {
        match self {
            ChartSpec::Bar { y_axis, .. }
            | ChartSpec::Line { y_axis, .. }
            | ChartSpec::Area { y_axis, .. }
            | ChartSpec::Scatter { y_axis, .. }
            | ChartSpec::Bubble { y_axis, .. } => Some(y_axis),
            ChartSpec::Pie { metric, .. }
            | ChartSpec::Radar { metric, .. }
            | ChartSpec::Heatmap { metric, .. }
            | ChartSpec::Treemap { metric, .. }
            | ChartSpec::Kpi { metric }
            | ChartSpec::Boxplot { metric, .. }
            | ChartSpec::Waterfall { metric, .. } => Some(metric),
            ChartSpec::Table { .. } => None,
        }
    }

    /// Grouping reduction, where the chart kind supports one.
    pub fn aggregation(&self) -> Option<Aggregation> {
        match self {
            ChartSpec::Bar { aggregation, .. }
            | ChartSpec::Line { aggregation, .. }
            | ChartSpec::Area { aggregation, .. }
            | ChartSpec::Pie { aggregation, .. } => *aggregation,
            _ => None,
        }
    }

    /// Construction-time check that every referenced field exists in the
    /// dataset's inferred field map.
    pub fn validate(&self, fields: &FieldTypes) -> Result<(), SpecError> {
        let chart = self.kind();
        let mut referenced: Vec<&str> = Vec::new();
        referenced.extend(self.label_field());
        referenced.extend(self.value_field());
        if let ChartSpec::Bubble { size_field, .. } = self {
            referenced.push(size_field);
        }
        if let ChartSpec::Heatmap { y_axis, .. } = self {
            referenced.push(y_axis);
        }
        for field in referenced {
            if !fields.contains_key(field) {
                return Err(SpecError::UnknownField {
                    chart,
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// One aggregated group: distinct group-by value and its reduced metric.
/// Order in a result vector is first-appearance order unless a chart
/// re-sorts by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedRow {
    pub key: String,
    pub value: f64,
}

impl GroupedRow {
    pub fn new(key: impl Into<String>, value: f64) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// One page of a paginated collection. Computed fresh per call, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: usize,
    pub pages: usize,
    pub current_page: usize,
}
