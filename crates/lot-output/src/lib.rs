//! `lot-output`: logs, statistics, and text rendering for lotsim runs.
//!
//! | Item                       | Output                                              |
//! |----------------------------|-----------------------------------------------------|
//! | [`AssignmentLog`]          | append-only CSV of `(run_id, agent_id, row, col, timestamp_ms)` |
//! | [`write_completion_stats`] | one CSV row per completed leg                       |
//! | [`cohort_average`]         | mean elapsed/delay ticks over an admission range    |
//! | [`render`]                 | the grid as text, one character per cell            |
//!
//! # Usage
//!
//! ```rust,ignore
//! use lot_output::{AssignmentLog, write_completion_stats};
//!
//! let log = Arc::new(AssignmentLog::open(Path::new("assignments.csv"), "run-1")?);
//! let sim = SimBuilder::new(config, grid, planner).observer(log.clone()).build()?;
//! // … admit agents, wait …
//! write_completion_stats(Path::new("completion.csv"), &sim.travel_records())?;
//! log.take_error().map(|e| eprintln!("output error: {e}"));
//! ```

pub mod error;
pub mod log;
pub mod render;
pub mod row;
pub mod stats;


pub use error::{OutputError, OutputResult};
pub use log::AssignmentLog;
pub use render::render;
pub use row::{AssignmentRow, CompletionRow};
pub use stats::{CohortMetric, cohort_average, write_completion_stats};
