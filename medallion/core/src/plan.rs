//! Task plan construction and lineage validation
//!
//! A pipeline definition is flattened into a linear chain of task nodes:
//! start marker, optional transfer, the transformation stages in lineage
//! order, end marker. Building the plan is where the lineage invariant is
//! enforced; nothing executes at plan time.

use miette::Diagnostic;
use serde::Serialize;

use crate::model::{Layer, Stage, TransferDescriptor, TransferError};
use crate::PipelineDefinition;

pub type Result<T> = core::result::Result<T, PlanError>;

#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum PlanError {
    #[error("Pipeline '{0}' declares no stages")]
    #[diagnostic(
        code(medallion::plan::empty),
        help("Declare at least one stage, e.g. `stages: [{{layer: bronze}}]`")
    )]
    Empty(String),

    #[error("Stage '{found}' cannot run after '{previous}'")]
    #[diagnostic(
        code(medallion::plan::out_of_order),
        help("Layered lineage is fixed: bronze → silver → gold → datamart; reorder the stages to match")
    )]
    OutOfOrder { found: Layer, previous: Layer },

    #[error("Layer '{0}' is declared more than once")]
    #[diagnostic(
        code(medallion::plan::duplicate_layer),
        help("Each layer runs as a single task group; merge the duplicate declarations")
    )]
    DuplicateLayer(Layer),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Transfer(#[from] TransferError),
}

/// A single node in the linear task chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum TaskNode {
    /// Marker guaranteeing a well-defined chain head
    Start,
    /// Pre-transformation data movement
    Transfer(TransferDescriptor),
    /// A transformation stage
    Stage(Stage),
    /// Marker guaranteeing a well-defined chain tail
    End,
}

impl TaskNode {
    pub fn task_id(&self) -> &str {
        match self {
            TaskNode::Start => "start",
            TaskNode::Transfer(_) => "transfer",
            TaskNode::Stage(stage) => stage.group_id(),
            TaskNode::End => "end",
        }
    }
}

/// Ordered task chain for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskPlan {
    /// Name of the pipeline this plan was built from
    pub pipeline: String,

    /// Task nodes in execution order
    pub nodes: Vec<TaskNode>,
}

impl TaskPlan {
    /// Build and validate the task chain for a definition.
    ///
    /// Stages must appear in strictly ascending layer order; a layer may
    /// appear at most once. The chain is always `start → [transfer] →
    /// stages → end`, regardless of any other configuration input.
    pub fn build(definition: &PipelineDefinition) -> Result<Self> {
        if definition.stages.is_empty() {
            return Err(PlanError::Empty(definition.name.clone()));
        }

        let mut previous: Option<Layer> = None;
        for stage in &definition.stages {
            match previous {
                Some(prev) if stage.layer == prev => {
                    return Err(PlanError::DuplicateLayer(stage.layer));
                }
                Some(prev) if stage.layer < prev => {
                    return Err(PlanError::OutOfOrder {
                        found: stage.layer,
                        previous: prev,
                    });
                }
                _ => previous = Some(stage.layer),
            }
        }

        let mut nodes = Vec::with_capacity(definition.stages.len() + 3);
        nodes.push(TaskNode::Start);

        if let Some(transfer) = &definition.transfer {
            nodes.push(TaskNode::Transfer(transfer.resolve()?));
        }

        nodes.extend(definition.stages.iter().cloned().map(TaskNode::Stage));
        nodes.push(TaskNode::End);

        Ok(Self {
            pipeline: definition.name.clone(),
            nodes,
        })
    }

    /// Stages of the plan in execution order.
    pub fn stages(&self) -> impl Iterator<Item = &Stage> {
        self.nodes.iter().filter_map(|node| match node {
            TaskNode::Stage(stage) => Some(stage),
            _ => None,
        })
    }
}

impl std::fmt::Display for TaskPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let chain = self
            .nodes
            .iter()
            .map(TaskNode::task_id)
            .collect::<Vec<_>>()
            .join(" >> ");

        write!(f, "{}: {}", self.pipeline, chain)
    }
}
