//! Canned analysis over record collections.
//!
//! Heuristic insight generation for charts and whole datasets, a
//! keyword-driven assistant, shorthand query parsing, and a plain-text
//! summary report. Everything here is deterministic string templating over
//! the numeric primitives in `glance-stats`; there is no model behind it.

mod assistant;
mod insight;
mod query;
mod report;

pub use assistant::{answer, AssistantReply};
pub use insight::{chart_insights, dataset_insights, Insight, InsightKind, Severity};
pub use query::{run_query, QueryError, QueryOutcome};
pub use report::{build_report, render_text, RegionRollup, ReportSummary};
