//! Pipeline execution

pub mod progress_tracker;
mod run;

pub use progress_tracker::{LoggingProgressTracker, ProgressEvent, ProgressTracker};
pub use run::{run_pipeline, RunSummary};

pub(crate) type Result<T> = crate::error::Result<T>;
