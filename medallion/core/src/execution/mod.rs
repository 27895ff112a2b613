//! Execution seam between the task plan and the external tools
//!
//! The pipeline walker only knows about the [`TaskRunner`] trait; the
//! default implementation delegates stages to the dbt CLI and transfers to
//! `object_store`. Tests substitute a mock runner to assert ordering and
//! retry behavior without touching any external tool.

use async_trait::async_trait;
use miette::Diagnostic;

use crate::model::{Stage, TransferDescriptor, TransferError};

pub mod dbt;
pub mod transfer;

pub use dbt::DbtRunner;
pub use transfer::TransferOutcome;

pub type Result<T> = core::result::Result<T, ExecutionError>;

#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum ExecutionError {
    #[error("Failed to launch the transformation tool for stage '{group_id}'")]
    #[diagnostic(
        code(medallion::execution::stage_command),
        help("Check that the dbt binary is installed and on PATH (or set --dbt-bin)")
    )]
    StageCommand {
        group_id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Stage '{group_id}' exited with status {code:?}")]
    #[diagnostic(code(medallion::execution::stage_exited))]
    StageExited { group_id: String, code: Option<i32> },

    #[error("Stage '{group_id}' failed after {attempts} attempt(s)")]
    #[diagnostic(
        code(medallion::execution::stage_failed),
        help(
            "Later layers only run on successful completion of earlier ones; \
             inspect the stage logs and re-run"
        )
    )]
    StageFailed {
        group_id: String,
        attempts: u32,
        #[source]
        source: Box<ExecutionError>,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Transfer(#[from] TransferError),

    #[error("Pipeline run exceeded the execution timeout of {timeout_seconds}s")]
    #[diagnostic(
        code(medallion::execution::timeout),
        help("Raise `defaults.execution_timeout_seconds` or reduce the work per run")
    )]
    Timeout { timeout_seconds: u64 },
}

/// Runner for the two task kinds a plan can contain.
#[async_trait]
pub trait TaskRunner: Send + Sync {
    /// Execute one transformation stage to completion.
    async fn run_stage(&self, stage: &Stage) -> Result<()>;

    /// Execute the pre-transformation transfer.
    async fn run_transfer(&self, descriptor: &TransferDescriptor) -> Result<TransferOutcome>;
}
