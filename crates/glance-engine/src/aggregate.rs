//! Grouping, reduction and substring filtering over record collections.

use glance_core::{display_string, metric_value, Aggregation, GroupedRow, Record};
use std::collections::HashMap;

/// Group rows by the display value of `group_by`, collect the coerced
/// metric of each row into its group, and reduce each group with `op`.
///
/// Groups come out in first-appearance order. A row without the group
/// field lands in the "undefined" group; a null cell in the "null" group.
/// Non-numeric metric cells contribute 0.
pub fn aggregate(rows: &[Record], group_by: &str, metric: &str, op: Aggregation) -> Vec<GroupedRow> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<f64>> = HashMap::new();

    for row in rows {
        let key = display_string(row.get(group_by));
        let values = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            Vec::new()
        });
        values.push(metric_value(row.get(metric)));
    }

    tracing::debug!(
        rows = rows.len(),
        groups = order.len(),
        group_by,
        metric,
        "aggregated dataset"
    );

    order
        .into_iter()
        .map(|key| {
            let value = op.apply(&groups[&key]);
            GroupedRow { key, value }
        })
        .collect()
}

/// Keep rows whose display value contains every filter's value,
/// case-insensitively. An empty filter map keeps everything.
pub fn filter_contains(rows: &[Record], filters: &HashMap<String, String>) -> Vec<Record> {
    let needles: Vec<(&String, String)> = filters
        .iter()
        .map(|(field, value)| (field, value.to_lowercase()))
        .collect();

    rows.iter()
        .filter(|row| {
            needles.iter().all(|(field, needle)| {
                display_string(row.get(field.as_str()))
                    .to_lowercase()
                    .contains(needle)
            })
        })
        .cloned()
        .collect()
}
