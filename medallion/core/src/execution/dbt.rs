//! Default task runner delegating to the dbt CLI and `object_store`

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::DbtConfig;
use crate::execution::transfer::{copy_objects, TransferOutcome};
use crate::execution::{ExecutionError, Result, TaskRunner};
use crate::model::{Stage, TransferDescriptor};

/// Runs stages by invoking `dbt build` as an external process and transfers
/// by copying objects between the configured stores.
///
/// Stage output streams through to the parent process, so dbt's own logs
/// remain the failure-reporting surface for model errors.
pub struct DbtRunner {
    dbt_bin: String,
    config: DbtConfig,
    connection_options: HashMap<String, HashMap<String, String>>,
}

impl DbtRunner {
    pub fn new(config: DbtConfig) -> Self {
        Self {
            dbt_bin: "dbt".to_string(),
            config,
            connection_options: HashMap::new(),
        }
    }

    /// Use a dbt binary other than the one on PATH.
    pub fn with_bin(mut self, dbt_bin: impl Into<String>) -> Self {
        self.dbt_bin = dbt_bin.into();
        self
    }

    /// Attach storage options for a connection identifier declared on the
    /// transfer step (credentials overrides and the like).
    pub fn with_connection_options(
        mut self,
        conn_id: impl Into<String>,
        options: HashMap<String, String>,
    ) -> Self {
        self.connection_options.insert(conn_id.into(), options);
        self
    }

    fn options_for(&self, conn_id: &str) -> HashMap<String, String> {
        self.connection_options
            .get(conn_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl TaskRunner for DbtRunner {
    async fn run_stage(&self, stage: &Stage) -> Result<()> {
        let group_id = stage.group_id();
        let profiles_dir = self
            .config
            .profile
            .profiles_path
            .parent()
            .unwrap_or_else(|| Path::new("."));

        let mut command = Command::new(&self.dbt_bin);
        command
            .arg("build")
            .arg("--select")
            .arg(stage.select_filter())
            .arg("--profile")
            .arg(&self.config.profile.profile_name)
            .arg("--target")
            .arg(&self.config.profile.target_name)
            .arg("--profiles-dir")
            .arg(profiles_dir)
            .arg("--project-dir")
            .arg(&self.config.project.project_dir);

        debug!("Invoking {:?}", command.as_std());

        let status = command
            .status()
            .await
            .map_err(|source| ExecutionError::StageCommand {
                group_id: group_id.to_string(),
                source,
            })?;

        if !status.success() {
            return Err(ExecutionError::StageExited {
                group_id: group_id.to_string(),
                code: status.code(),
            });
        }

        Ok(())
    }

    async fn run_transfer(&self, descriptor: &TransferDescriptor) -> Result<TransferOutcome> {
        let source = medallion_storage::create_store(
            &descriptor.source,
            &self.options_for(&descriptor.source_conn_id),
        )
        .map_err(crate::model::transfer::TransferError::Storage)?;

        let destination = medallion_storage::create_store(
            &descriptor.destination,
            &self.options_for(&descriptor.dest_conn_id),
        )
        .map_err(crate::model::transfer::TransferError::Storage)?;

        let outcome = copy_objects(source, destination, descriptor).await?;

        info!(
            "Transfer finished: {} copied, {} skipped",
            outcome.copied, outcome.skipped
        );

        Ok(outcome)
    }
}
