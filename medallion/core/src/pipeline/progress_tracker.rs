use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Progress events emitted while a pipeline run walks its task chain
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Run started
    Started {
        /// Pipeline name
        pipeline: String,
    },
    /// The transfer step started
    TransferStarted,
    /// The transfer step finished
    TransferCompleted {
        /// Number of objects copied
        copied: usize,
        /// Number of existing objects left untouched
        skipped: usize,
    },
    /// A stage started executing
    StageStarted {
        /// Group identifier of the stage
        group_id: String,
        /// Position among the plan's stages
        position: usize,
    },
    /// A stage attempt failed and will be retried
    StageRetrying {
        /// Group identifier of the stage
        group_id: String,
        /// Attempt that just failed, 1-based
        attempt: u32,
    },
    /// A stage finished successfully
    StageCompleted {
        /// Group identifier of the stage
        group_id: String,
        /// Position among the plan's stages
        position: usize,
        /// Stage duration
        duration_ms: u64,
    },
    /// A stage exhausted its attempts
    StageFailed {
        /// Group identifier of the stage
        group_id: String,
        /// Attempts made
        attempts: u32,
    },
    /// Run finished
    Completed {
        /// Total run duration
        duration_ms: u64,
    },
}

/// A trait for observing progress events during pipeline execution
pub trait ProgressTracker: Send + Sync {
    /// Called for every progress event of a run
    fn on_progress(&self, event: ProgressEvent);
}

/// Tracker that reports progress through the tracing crate
#[derive(Debug)]
pub struct LoggingProgressTracker;

impl ProgressTracker for LoggingProgressTracker {
    fn on_progress(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Started { pipeline } => {
                info!("🚀 Pipeline run started: {pipeline}");
            }
            ProgressEvent::TransferStarted => {
                info!("📦 Transferring source data ...");
            }
            ProgressEvent::TransferCompleted { copied, skipped } => {
                info!("📦 Transfer complete ({copied} copied, {skipped} skipped)");
            }
            ProgressEvent::StageStarted { group_id, position } => {
                info!("⚙️  Running stage: {group_id} (position: {position})");
            }
            ProgressEvent::StageRetrying { group_id, attempt } => {
                warn!("🔁 Stage {group_id} failed on attempt {attempt}, retrying");
            }
            ProgressEvent::StageCompleted {
                group_id,
                position: _,
                duration_ms,
            } => {
                info!(
                    "✅ Completed stage: {group_id} (took: {:.2}s)",
                    duration_ms as f64 / 1000.0
                );
            }
            ProgressEvent::StageFailed { group_id, attempts } => {
                warn!("❌ Stage {group_id} failed after {attempts} attempt(s)");
            }
            ProgressEvent::Completed { duration_ms } => {
                info!(
                    "🎉 Pipeline run completed (total time: {:.2}s)",
                    duration_ms as f64 / 1000.0
                );
            }
        }
    }
}
