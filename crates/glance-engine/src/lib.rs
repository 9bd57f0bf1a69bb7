//! Dataset reshaping engine.
//!
//! Takes an in-memory record collection and re-shapes it for chart
//! consumption: grouping + aggregation, deterministic sampling, pagination,
//! substring filtering, and the per-chart-kind shaping resolver. Large jobs
//! can be offloaded to a background worker task.

mod aggregate;
mod shape;
mod slice;
mod worker;

pub use aggregate::{aggregate, filter_contains};
pub use shape::{
    shape, shape_spec, BoxStats, BubblePoint, HeatCell, HeatmapMatrix, KpiSummary, ShapeError,
    ShapedData, WaterfallStep,
};
pub use slice::{paginate, sample};
pub use worker::{DataWorker, WorkerError, WorkerRequest, WorkerResponse};
