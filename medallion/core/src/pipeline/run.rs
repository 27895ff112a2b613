//! Pipeline execution logic

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, instrument, warn};

use crate::execution::{ExecutionError, TaskRunner};
use crate::model::{FailureMode, Stage};
use crate::pipeline::progress_tracker::{ProgressEvent, ProgressTracker};
use crate::pipeline::Result;
use crate::plan::{TaskNode, TaskPlan};
use crate::PipelineDefinition;

/// Outcome of a completed pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Group identifiers of stages that completed successfully, in order
    pub completed: Vec<String>,
    /// Group identifiers of stages that failed but were suppressed by
    /// [`FailureMode::Continue`]
    pub failed: Vec<String>,
    /// Total run duration
    pub duration: Duration,
}

/// Execute a pipeline definition with optional progress tracking.
///
/// The task chain runs strictly in plan order: the transfer (if any)
/// completes before the first stage, and each stage completes before the
/// next one starts. A stage gets `defaults.retries` re-attempts with
/// `defaults.retry_delay_seconds` between them; once its attempts are
/// exhausted the run aborts, unless the definition explicitly declares
/// `on_failure: continue`, in which case the failure is recorded in the
/// summary and the chain proceeds. The whole run is bounded by
/// `defaults.execution_timeout_seconds`.
#[instrument(skip_all, fields(pipeline = %definition.name), err)]
pub async fn run_pipeline(
    definition: &PipelineDefinition,
    runner: Arc<dyn TaskRunner>,
    tracker: Option<Arc<dyn ProgressTracker>>,
) -> Result<RunSummary> {
    let plan = TaskPlan::build(definition)?;
    let timeout = definition.defaults.execution_timeout();

    match tokio::time::timeout(timeout, execute_plan(&plan, definition, runner, tracker)).await {
        Ok(result) => result,
        Err(_) => Err(ExecutionError::Timeout {
            timeout_seconds: definition.defaults.execution_timeout_seconds,
        }
        .into()),
    }
}

async fn execute_plan(
    plan: &TaskPlan,
    definition: &PipelineDefinition,
    runner: Arc<dyn TaskRunner>,
    tracker: Option<Arc<dyn ProgressTracker>>,
) -> Result<RunSummary> {
    let start_time = Instant::now();
    let mut completed = Vec::new();
    let mut failed = Vec::new();
    let mut position = 0usize;

    emit(
        &tracker,
        ProgressEvent::Started {
            pipeline: plan.pipeline.clone(),
        },
    );

    for node in &plan.nodes {
        match node {
            TaskNode::Start | TaskNode::End => {
                debug!("Passing {} marker", node.task_id());
            }
            TaskNode::Transfer(descriptor) => {
                emit(&tracker, ProgressEvent::TransferStarted);

                let outcome = runner.run_transfer(descriptor).await?;

                emit(
                    &tracker,
                    ProgressEvent::TransferCompleted {
                        copied: outcome.copied,
                        skipped: outcome.skipped,
                    },
                );
            }
            TaskNode::Stage(stage) => {
                match run_stage(stage, position, definition, &runner, &tracker).await {
                    Ok(()) => completed.push(stage.group_id().to_string()),
                    Err(error) => match definition.on_failure {
                        FailureMode::Propagate => return Err(error.into()),
                        FailureMode::Continue => {
                            warn!(
                                "Continuing past failed stage '{}' (on_failure: continue): {error}",
                                stage.group_id()
                            );
                            failed.push(stage.group_id().to_string());
                        }
                    },
                }
                position += 1;
            }
        }
    }

    let duration = start_time.elapsed();
    emit(
        &tracker,
        ProgressEvent::Completed {
            duration_ms: duration.as_millis() as u64,
        },
    );

    Ok(RunSummary {
        completed,
        failed,
        duration,
    })
}

async fn run_stage(
    stage: &Stage,
    position: usize,
    definition: &PipelineDefinition,
    runner: &Arc<dyn TaskRunner>,
    tracker: &Option<Arc<dyn ProgressTracker>>,
) -> core::result::Result<(), ExecutionError> {
    let policy = &definition.defaults;
    let group_id = stage.group_id().to_string();
    let time = Instant::now();

    emit(
        tracker,
        ProgressEvent::StageStarted {
            group_id: group_id.clone(),
            position,
        },
    );

    let mut attempt = 1;
    loop {
        match runner.run_stage(stage).await {
            Ok(()) => {
                emit(
                    tracker,
                    ProgressEvent::StageCompleted {
                        group_id,
                        position,
                        duration_ms: time.elapsed().as_millis() as u64,
                    },
                );
                return Ok(());
            }
            Err(error) if attempt < policy.attempts() => {
                warn!("Stage '{group_id}' attempt {attempt} failed: {error}");
                emit(
                    tracker,
                    ProgressEvent::StageRetrying {
                        group_id: group_id.clone(),
                        attempt,
                    },
                );

                tokio::time::sleep(policy.retry_delay()).await;
                attempt += 1;
            }
            Err(error) => {
                emit(
                    tracker,
                    ProgressEvent::StageFailed {
                        group_id: group_id.clone(),
                        attempts: attempt,
                    },
                );

                return Err(ExecutionError::StageFailed {
                    group_id,
                    attempts: attempt,
                    source: Box::new(error),
                });
            }
        }
    }
}

fn emit(tracker: &Option<Arc<dyn ProgressTracker>>, event: ProgressEvent) {
    if let Some(tracker) = tracker {
        tracker.on_progress(event);
    }
}
