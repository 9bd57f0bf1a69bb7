//! Glance data model
//!
//! Canonical types shared by the parsing, aggregation and insight crates:
//! loosely-typed records, datasets/dashboards/visualizations, and the
//! tagged chart-configuration union. All types are deterministically
//! serializable for caching and provenance.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

mod chart;
mod record;

pub use chart::*;
pub use record::*;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// An uploaded, in-memory table: an ordered sequence of loosely-typed rows.
///
/// Fields are not declared by schema; their kinds are inferred by sampling
/// (see `glance-parse`). Row order is insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub rows: Vec<Record>,
    pub created_at: DateTime<Utc>,
}

impl Dataset {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>, rows: Vec<Record>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            name: name.into(),
            rows,
            created_at: Utc::now(),
        }
    }

    /// Calculate fingerprint (SHA-256 over canonical JSON) for cache keys.
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(&self.rows).expect("rows should always serialize");
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// A named collection of visualizations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A named, typed, configured view bound to one dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visualization {
    pub id: Uuid,
    pub dashboard_id: Uuid,
    pub dataset_id: Uuid,
    pub name: String,
    pub spec: ChartSpec,

    /// Systematic-sampling cap applied before shaping; `None` disables it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_size: Option<usize>,

    pub created_at: DateTime<Utc>,
}

impl Visualization {
    pub fn new(
        dashboard_id: Uuid,
        dataset_id: Uuid,
        name: impl Into<String>,
        spec: ChartSpec,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            dashboard_id,
            dataset_id,
            name: name.into(),
            spec,
            sample_size: None,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_deterministic() {
        let rows = vec![crate::record::record_from_pairs(&[
            ("a", serde_json::json!(1)),
            ("b", serde_json::json!("x")),
        ])];
        let d1 = Dataset::new("u1", "sales", rows.clone());
        let d2 = Dataset::new("u2", "other name", rows);

        // Identity fields do not participate; only the rows do.
        assert_eq!(d1.fingerprint(), d2.fingerprint());
    }

    #[test]
    fn test_fingerprint_sensitive_to_rows() {
        let d1 = Dataset::new(
            "u",
            "d",
            vec![crate::record::record_from_pairs(&[("a", serde_json::json!(1))])],
        );
        let d2 = Dataset::new(
            "u",
            "d",
            vec![crate::record::record_from_pairs(&[("a", serde_json::json!(2))])],
        );
        assert_ne!(d1.fingerprint(), d2.fingerprint());
    }
}
