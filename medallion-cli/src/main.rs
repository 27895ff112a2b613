use anyhow::Context;
use clap::{Parser, Subcommand};
use medallion_core::prelude::*;
use std::{collections::HashMap, error::Error, path::PathBuf, sync::Arc};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Medallion CLI for validating and running layered dbt pipelines
#[derive(Debug, Parser)]
#[command(name = "medallion", version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Load a pipeline definition and check its lineage
    Validate {
        /// Path to the pipeline definition file
        #[arg(short, long)]
        file: PathBuf,

        /// k=v list of template parameters to substitute into the definition
        /// e.g. medallion validate -f pipeline.yml -p run_date=2024-07-07
        #[arg(short, long, value_parser = parse_key_val::<String, String>)]
        params: Option<Vec<(String, String)>>,
    },

    /// Print the task chain a definition resolves to
    Plan {
        /// Path to the pipeline definition file
        #[arg(short, long)]
        file: PathBuf,

        /// k=v list of template parameters to substitute into the definition
        #[arg(short, long, value_parser = parse_key_val::<String, String>)]
        params: Option<Vec<(String, String)>>,
    },

    /// Run a pipeline to completion
    Run {
        /// Path to the pipeline definition file
        #[arg(short, long)]
        file: PathBuf,

        /// k=v list of template parameters to substitute into the definition
        #[arg(short, long, value_parser = parse_key_val::<String, String>)]
        params: Option<Vec<(String, String)>>,

        /// dbt binary to invoke for the transformation stages
        #[arg(long, default_value = "dbt")]
        dbt_bin: String,

        /// Override the dbt base path resolved from the environment mode
        #[arg(long)]
        base_path: Option<PathBuf>,
    },
}

fn parse_key_val<T, U>(s: &str) -> Result<(T, U), Box<dyn Error + Send + Sync + 'static>>
where
    T: std::str::FromStr,
    T::Err: Error + Send + Sync + 'static,
    U: std::str::FromStr,
    U::Err: Error + Send + Sync + 'static,
{
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=value: no `=` found in `{s}`"))?;
    Ok((s[..pos].parse()?, s[pos + 1..].parse()?))
}

/// Load a pipeline definition, inferring the format from the file extension.
fn load_definition(
    file: &PathBuf,
    params: Option<Vec<(String, String)>>,
) -> Result<PipelineDefinition, anyhow::Error> {
    let params = HashMap::from_iter(params.unwrap_or_default());
    let format = format_from_path(file);

    debug!("Parsing {} definition: {}", format, file.display());

    PipelineDefinition::from_file(file, format, params)
        .with_context(|| format!("failed to load pipeline definition from {}", file.display()))
}

async fn run(
    file: PathBuf,
    params: Option<Vec<(String, String)>>,
    dbt_bin: String,
    base_path: Option<PathBuf>,
) -> Result<(), anyhow::Error> {
    let definition = load_definition(&file, params)?;

    let config = match base_path {
        Some(base) => DbtConfig::with_base_path(&definition.profile, &base),
        None => {
            let mode = EnvMode::detect();
            debug!("Resolved environment mode: {mode:?}");
            DbtConfig::resolve(&definition.profile, mode)
        }
    };

    let runner = Arc::new(DbtRunner::new(config).with_bin(dbt_bin));
    let tracker: Arc<dyn ProgressTracker> = Arc::new(LoggingProgressTracker);

    let summary = run_pipeline(&definition, runner, Some(tracker))
        .await
        .context("failure during pipeline execution")?;

    if !summary.failed.is_empty() {
        warn!(
            "Run finished with suppressed stage failures: {}",
            summary.failed.join(", ")
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("medallion=info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    match args.command {
        Commands::Validate { file, params } => {
            let definition = load_definition(&file, params)?;
            info!(
                "✅ Definition '{}' is valid ({} stage(s))",
                definition.name,
                definition.stages.len()
            );
        }
        Commands::Plan { file, params } => {
            let definition = load_definition(&file, params)?;
            let plan = TaskPlan::build(&definition).context("failed to build task plan")?;
            println!("{plan}");
        }
        Commands::Run {
            file,
            params,
            dbt_bin,
            base_path,
        } => {
            run(file, params, dbt_bin, base_path).await?;
        }
    }

    Ok(())
}
