//! Dataset and visualization service.
//!
//! Ties the store, the TTL cache and the shaping/insight pipeline
//! together. List reads go through the cache under a per-user key;
//! mutations invalidate that key before touching the store, so a failed
//! write can at worst cause a reload, never a stale read.

use crate::cache::DataCache;
use crate::config::EngineConfig;
use crate::store::{Filter, RecordStore, StoreError};
use glance_core::{Aggregation, Dashboard, Dataset, GroupedRow, Record, Visualization};
use glance_engine::{aggregate, shape_spec, DataWorker, ShapeError, ShapedData, WorkerError};
use glance_insight::{chart_insights, Insight};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

const DATASETS_TABLE: &str = "datasets";
const DASHBOARDS_TABLE: &str = "dashboards";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error("Failed to (de)serialize stored record: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("Dataset {0} not found")]
    DatasetNotFound(Uuid),

    #[error(transparent)]
    Worker(#[from] WorkerError),
}

/// A shaped chart plus the insights computed from the same rows.
#[derive(Debug, Serialize)]
pub struct RenderPayload {
    pub shaped: ShapedData,
    pub insights: Vec<Insight>,
}

pub struct DatasetService {
    store: Arc<dyn RecordStore>,
    cache: DataCache<Vec<Dataset>>,
    engine: EngineConfig,
    worker: DataWorker,
}

impl DatasetService {
    /// Must be called inside a tokio runtime; the background worker is
    /// spawned here.
    pub fn new(store: Arc<dyn RecordStore>, cache_ttl: Duration, engine: EngineConfig) -> Self {
        Self {
            store,
            cache: DataCache::new(cache_ttl),
            engine,
            worker: DataWorker::spawn(),
        }
    }

    fn cache_key(user_id: &str) -> String {
        format!("datasets-{}", user_id)
    }

    /// All datasets of one user, from cache when live.
    pub async fn list_datasets(&self, user_id: &str) -> Result<Vec<Dataset>, ServiceError> {
        let key = Self::cache_key(user_id);
        if let Some(datasets) = self.cache.get(&key) {
            tracing::debug!(user_id, "dataset list served from cache");
            return Ok(datasets);
        }

        let filter = Filter::new("user_id", json!(user_id));
        let rows = self
            .store
            .select(DATASETS_TABLE, Some(&filter), None, None)
            .await?;
        let datasets: Vec<Dataset> = rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<_, _>>()?;

        self.cache.put(key, datasets.clone());
        Ok(datasets)
    }

    pub async fn create_dataset(
        &self,
        user_id: &str,
        name: &str,
        rows: Vec<Record>,
    ) -> Result<Dataset, ServiceError> {
        self.cache.invalidate(&Self::cache_key(user_id));

        let dataset = Dataset::new(user_id, name, rows);
        tracing::info!(
            user_id,
            dataset_id = %dataset.id,
            rows = dataset.rows.len(),
            fingerprint = %dataset.fingerprint(),
            "creating dataset"
        );
        self.store
            .insert(DATASETS_TABLE, serde_json::to_value(&dataset)?)
            .await?;
        Ok(dataset)
    }

    pub async fn delete_dataset(&self, user_id: &str, id: Uuid) -> Result<(), ServiceError> {
        self.cache.invalidate(&Self::cache_key(user_id));

        let removed = self
            .store
            .delete(DATASETS_TABLE, &Filter::new("id", json!(id)))
            .await?;
        if removed == 0 {
            return Err(ServiceError::DatasetNotFound(id));
        }
        Ok(())
    }

    pub async fn get_dataset(&self, user_id: &str, id: Uuid) -> Result<Dataset, ServiceError> {
        self.list_datasets(user_id)
            .await?
            .into_iter()
            .find(|d| d.id == id)
            .ok_or(ServiceError::DatasetNotFound(id))
    }

    pub async fn create_dashboard(
        &self,
        user_id: &str,
        name: &str,
        description: Option<String>,
    ) -> Result<Dashboard, ServiceError> {
        let dashboard = Dashboard {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            description,
            created_at: chrono::Utc::now(),
        };
        self.store
            .insert(DASHBOARDS_TABLE, serde_json::to_value(&dashboard)?)
            .await?;
        Ok(dashboard)
    }

    pub async fn list_dashboards(&self, user_id: &str) -> Result<Vec<Dashboard>, ServiceError> {
        let filter = Filter::new("user_id", json!(user_id));
        let rows = self
            .store
            .select(DASHBOARDS_TABLE, Some(&filter), None, None)
            .await?;
        Ok(rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<_, _>>()?)
    }

    /// Shape a visualization against its dataset and attach chart insights.
    /// Visualizations without their own sample cap inherit the configured
    /// default.
    pub async fn render_visualization(
        &self,
        user_id: &str,
        viz: &Visualization,
    ) -> Result<RenderPayload, ServiceError> {
        let dataset = self.get_dataset(user_id, viz.dataset_id).await?;
        let sample_size = viz.sample_size.or(Some(self.engine.sample_size));
        let shaped = shape_spec(&viz.spec, sample_size, &dataset.rows)?;
        let insights = chart_insights(&dataset.rows, &viz.spec);
        Ok(RenderPayload { shaped, insights })
    }

    /// Ad-hoc grouping over a stored dataset. Datasets above the worker
    /// threshold are reduced on the background worker so the caller's task
    /// stays responsive.
    pub async fn aggregate_dataset(
        &self,
        user_id: &str,
        id: Uuid,
        group_by: &str,
        metric: &str,
        operation: Aggregation,
    ) -> Result<Vec<GroupedRow>, ServiceError> {
        let dataset = self.get_dataset(user_id, id).await?;
        if dataset.rows.len() > self.engine.worker_threshold_rows {
            tracing::debug!(rows = dataset.rows.len(), "offloading aggregation to worker");
            return Ok(self
                .worker
                .aggregate(dataset.rows, group_by, metric, operation)
                .await?);
        }
        Ok(aggregate(&dataset.rows, group_by, metric, operation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use glance_core::{record_from_pairs, Aggregation, ChartSpec, GroupedRow};
    use serde_json::json;

    fn service() -> DatasetService {
        DatasetService::new(
            Arc::new(MemoryStore::new()),
            Duration::from_secs(60),
            EngineConfig::default(),
        )
    }

    fn rows() -> Vec<Record> {
        vec![
            record_from_pairs(&[("region", json!("EU")), ("sales", json!(10))]),
            record_from_pairs(&[("region", json!("US")), ("sales", json!(40))]),
        ]
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let service = service();
        let created = service.create_dataset("u1", "sales", rows()).await.unwrap();

        let listed = service.list_datasets("u1").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.id);
        assert_eq!(listed[0].rows.len(), 2);

        // Second read must come from cache, not deserialize again.
        assert!(!service.cache.is_empty());
        let again = service.list_datasets("u1").await.unwrap();
        assert_eq!(again.len(), 1);
    }

    #[tokio::test]
    async fn test_lists_are_per_user() {
        let service = service();
        service.create_dataset("u1", "a", rows()).await.unwrap();
        service.create_dataset("u2", "b", rows()).await.unwrap();

        assert_eq!(service.list_datasets("u1").await.unwrap().len(), 1);
        assert_eq!(service.list_datasets("u2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_invalidates_cache() {
        let service = service();
        let created = service.create_dataset("u1", "a", rows()).await.unwrap();
        assert_eq!(service.list_datasets("u1").await.unwrap().len(), 1);

        service.delete_dataset("u1", created.id).await.unwrap();
        assert!(service.list_datasets("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_dataset_errors() {
        let service = service();
        let err = service.delete_dataset("u1", Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::DatasetNotFound(_)));
    }

    #[tokio::test]
    async fn test_render_visualization() {
        let service = service();
        let dataset = service.create_dataset("u1", "sales", rows()).await.unwrap();

        let viz = Visualization::new(
            Uuid::new_v4(),
            dataset.id,
            "sales by region",
            ChartSpec::Bar {
                x_axis: "region".into(),
                y_axis: "sales".into(),
                aggregation: Some(Aggregation::Sum),
            },
        );
        let payload = service.render_visualization("u1", &viz).await.unwrap();
        assert_eq!(
            payload.shaped,
            ShapedData::Series(vec![GroupedRow::new("EU", 10.0), GroupedRow::new("US", 40.0)])
        );
    }

    #[tokio::test]
    async fn test_dashboards_round_trip() {
        let service = service();
        let created = service
            .create_dashboard("u1", "quarterly", Some("Q3 numbers".to_string()))
            .await
            .unwrap();

        let dashboards = service.list_dashboards("u1").await.unwrap();
        assert_eq!(dashboards.len(), 1);
        assert_eq!(dashboards[0].id, created.id);
        assert_eq!(dashboards[0].description.as_deref(), Some("Q3 numbers"));
        assert!(service.list_dashboards("u2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_aggregate_dataset_uses_worker_above_threshold() {
        let service = DatasetService::new(
            Arc::new(MemoryStore::new()),
            Duration::from_secs(60),
            EngineConfig {
                sample_size: 1000,
                worker_threshold_rows: 1,
            },
        );
        let dataset = service.create_dataset("u1", "sales", rows()).await.unwrap();

        let groups = service
            .aggregate_dataset("u1", dataset.id, "region", "sales", Aggregation::Sum)
            .await
            .unwrap();
        assert_eq!(
            groups,
            vec![GroupedRow::new("EU", 10.0), GroupedRow::new("US", 40.0)]
        );
    }
}
