//! Medallion - declarative orchestration for layered dbt pipelines
//!
//! A pipeline definition declares a linear chain of tasks: a start marker,
//! an optional object-storage transfer, and a sequence of path-filtered
//! transformation stages following the medallion lineage (bronze → silver →
//! gold → datamart). Scheduling, model compilation and cloud credentials
//! stay with the external systems; this crate owns the definition contract,
//! its validation, and the sequential walk that delegates each task to the
//! configured runner.
//!
//! ```no_run
//! use std::sync::Arc;
//! use medallion_core::prelude::*;
//!
//! # async fn example() -> medallion_core::Result<()> {
//! let definition = PipelineDefinition::builder()
//!     .name("daily_refresh")
//!     .profile(ProfileSettings { name: "analytics".into(), target: "dev".into() })
//!     .start_date(chrono::NaiveDate::from_ymd_opt(2024, 7, 7).unwrap())
//!     .stages(Layer::ALL.into_iter().map(Stage::for_layer).collect())
//!     .build();
//!
//! let config = DbtConfig::resolve(&definition.profile, EnvMode::detect());
//! let summary = run_pipeline(&definition, Arc::new(DbtRunner::new(config)), None).await?;
//! # Ok(())
//! # }
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub mod config;
pub mod error;
pub mod execution;
pub mod model;
pub mod pipeline;
pub mod plan;
pub mod templating;

use config::ProfileSettings;
use model::{FailureMode, RetryPolicy, Stage, TransferStep};

/// Prelude to import all relevant models and functions
pub mod prelude {
    pub use crate::config::{DbtConfig, EnvMode, ProfileSettings};
    pub use crate::execution::{DbtRunner, TaskRunner};
    pub use crate::model::{
        FailureMode, Layer, RetryPolicy, Stage, TransferDescriptor, TransferStep,
    };
    pub use crate::pipeline::{run_pipeline, LoggingProgressTracker, ProgressTracker, RunSummary};
    pub use crate::plan::{TaskNode, TaskPlan};
    pub use crate::templating::{format_from_path, TemplateFormat, TemplateLoader};
    pub use crate::{PipelineDefinition, PipelineDefinitionBuilder};
}

pub type Result<T> = error::Result<T>;

/// Definition of a layered data pipeline.
///
/// One parameterized definition covers everything that varies between runs
/// (dates, buckets, retry counts) through template parameters; the stage
/// order itself is fixed by the medallion lineage and validated when the
/// task plan is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema_gen", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
pub struct PipelineDefinition {
    /// Workflow identifier registered with the external scheduler
    pub name: String,

    /// Schedule expression handed to the external scheduler; absent means
    /// manual triggering only
    #[serde(default)]
    pub schedule: Option<String>,

    /// First date the pipeline is valid for
    pub start_date: NaiveDate,

    /// Free-form tags for the scheduler's catalog
    #[serde(default)]
    pub tags: Vec<String>,

    /// Connection profile for the transformation tool
    pub profile: ProfileSettings,

    /// Retry and timeout policy applied to the whole run
    #[serde(default)]
    pub defaults: RetryPolicy,

    /// Optional data movement executed before the first stage
    #[serde(default)]
    pub transfer: Option<TransferStep>,

    /// Transformation stages in lineage order
    pub stages: Vec<Stage>,

    /// How stage failures affect the rest of the run
    #[serde(default)]
    pub on_failure: FailureMode,
}

impl PipelineDefinition {
    /// Builder for a pipeline definition
    pub fn builder() -> PipelineDefinitionBuilder {
        PipelineDefinitionBuilder::default()
    }
}

/// Builder for a pipeline definition
#[derive(Debug, Clone, Default)]
pub struct PipelineDefinitionBuilder {
    name: String,
    schedule: Option<String>,
    start_date: Option<NaiveDate>,
    tags: Vec<String>,
    profile: ProfileSettings,
    defaults: RetryPolicy,
    transfer: Option<TransferStep>,
    stages: Vec<Stage>,
    on_failure: FailureMode,
}

impl PipelineDefinitionBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn schedule(mut self, schedule: impl Into<String>) -> Self {
        self.schedule = Some(schedule.into());
        self
    }

    pub fn start_date(mut self, start_date: NaiveDate) -> Self {
        self.start_date = Some(start_date);
        self
    }

    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn profile(mut self, profile: ProfileSettings) -> Self {
        self.profile = profile;
        self
    }

    pub fn defaults(mut self, defaults: RetryPolicy) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn transfer(mut self, transfer: TransferStep) -> Self {
        self.transfer = Some(transfer);
        self
    }

    /// Add a stage to the end of the chain
    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Replace the stage chain
    pub fn stages(mut self, stages: Vec<Stage>) -> Self {
        self.stages = stages;
        self
    }

    pub fn on_failure(mut self, on_failure: FailureMode) -> Self {
        self.on_failure = on_failure;
        self
    }

    /// Build the pipeline definition. The start date defaults to the
    /// current date when not set explicitly.
    pub fn build(self) -> PipelineDefinition {
        PipelineDefinition {
            name: self.name,
            schedule: self.schedule,
            start_date: self
                .start_date
                .unwrap_or_else(|| chrono::Utc::now().date_naive()),
            tags: self.tags,
            profile: self.profile,
            defaults: self.defaults,
            transfer: self.transfer,
            stages: self.stages,
            on_failure: self.on_failure,
        }
    }
}
