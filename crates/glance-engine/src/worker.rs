//! Background offload for heavy dataset jobs.
//!
//! Each submission gets a monotonically increasing request id and a oneshot
//! reply slot in a pending map. A worker task drains the job queue and a
//! dispatcher routes each tagged reply back through the map, so concurrent
//! callers can never receive each other's results even when replies arrive
//! out of order.

use crate::aggregate::{aggregate, filter_contains};
use glance_core::{Aggregation, GroupedRow, Record};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("worker stopped before replying")]
    Stopped,
    #[error("worker sent a mismatched response variant")]
    UnexpectedResponse,
}

#[derive(Debug, Clone)]
pub enum WorkerRequest {
    Aggregate {
        rows: Vec<Record>,
        group_by: String,
        metric: String,
        operation: Aggregation,
    },
    Filter {
        rows: Vec<Record>,
        filters: HashMap<String, String>,
    },
}

#[derive(Debug, Clone)]
pub enum WorkerResponse {
    Groups(Vec<GroupedRow>),
    Rows(Vec<Record>),
}

struct Job {
    id: u64,
    request: WorkerRequest,
}

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<WorkerResponse>>>>;

/// Handle to a background worker. Cheap to clone; all clones share the same
/// queue and pending map. Dropping every handle shuts the worker down.
#[derive(Clone)]
pub struct DataWorker {
    jobs: mpsc::UnboundedSender<Job>,
    pending: PendingMap,
    next_id: Arc<AtomicU64>,
}

impl DataWorker {
    /// Spawn the worker and dispatcher tasks on the current runtime.
    pub fn spawn() -> Self {
        let (job_tx, mut job_rx) = mpsc::unbounded_channel::<Job>();
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<(u64, WorkerResponse)>();

        tokio::spawn(async move {
            while let Some(job) = job_rx.recv().await {
                let response = run_job(job.request);
                if done_tx.send((job.id, response)).is_err() {
                    break;
                }
            }
        });

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let dispatcher_pending = Arc::clone(&pending);
        tokio::spawn(async move {
            while let Some((id, response)) = done_rx.recv().await {
                let slot = dispatcher_pending
                    .lock()
                    .expect("pending map lock poisoned")
                    .remove(&id);
                match slot {
                    Some(reply) => {
                        let _ = reply.send(response);
                    }
                    None => tracing::warn!(id, "reply for unknown request id"),
                }
            }
        });

        Self {
            jobs: job_tx,
            pending,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Submit a request and wait for its correlated reply.
    pub async fn submit(&self, request: WorkerRequest) -> Result<WorkerResponse, WorkerError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .expect("pending map lock poisoned")
            .insert(id, tx);

        if self.jobs.send(Job { id, request }).is_err() {
            self.pending
                .lock()
                .expect("pending map lock poisoned")
                .remove(&id);
            return Err(WorkerError::Stopped);
        }

        rx.await.map_err(|_| WorkerError::Stopped)
    }

    pub async fn aggregate(
        &self,
        rows: Vec<Record>,
        group_by: impl Into<String>,
        metric: impl Into<String>,
        operation: Aggregation,
    ) -> Result<Vec<GroupedRow>, WorkerError> {
        let request = WorkerRequest::Aggregate {
            rows,
            group_by: group_by.into(),
            metric: metric.into(),
            operation,
        };
        match self.submit(request).await? {
            WorkerResponse::Groups(groups) => Ok(groups),
            WorkerResponse::Rows(_) => Err(WorkerError::UnexpectedResponse),
        }
    }

    pub async fn filter(
        &self,
        rows: Vec<Record>,
        filters: HashMap<String, String>,
    ) -> Result<Vec<Record>, WorkerError> {
        match self.submit(WorkerRequest::Filter { rows, filters }).await? {
            WorkerResponse::Rows(rows) => Ok(rows),
            WorkerResponse::Groups(_) => Err(WorkerError::UnexpectedResponse),
        }
    }
}

fn run_job(request: WorkerRequest) -> WorkerResponse {
    match request {
        WorkerRequest::Aggregate {
            rows,
            group_by,
            metric,
            operation,
        } => WorkerResponse::Groups(aggregate(&rows, &group_by, &metric, operation)),
        WorkerRequest::Filter { rows, filters } => {
            WorkerResponse::Rows(filter_contains(&rows, &filters))
        }
    }
}
