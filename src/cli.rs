//! Command-line parsing and stage dispatch for the `nba-etl` binary.

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::checkpoint::CheckpointPaths;
use crate::config::{self, PipelineConfig};
use crate::extract::{SeasonQuery, StatsApiClient};
use crate::pipeline;
use crate::warehouse::PgWarehouse;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "nba-etl",
    version,
    about = "Season player stats ETL into a PostgreSQL star schema"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Pull season stats from the stats API into the raw checkpoint.
    Extract,
    /// Split the raw checkpoint into dimension and fact checkpoints.
    Transform,
    /// Replace the warehouse tables with the processed checkpoints.
    Load,
    /// Check the warehouse tables against the processed checkpoints.
    Validate,
    /// Extract, transform and load in one go.
    Run,
}

/// Runs one command. `Ok(false)` means validation ran but failed.
pub async fn run(cli: Cli) -> anyhow::Result<bool> {
    let query = SeasonQuery::default();

    match cli.command {
        Command::Extract => {
            let paths = paths_from_env(&query);
            let client = StatsApiClient::new()?;
            let raw = pipeline::extract_stage(&client, &query, &paths)
                .await
                .context("extract failed")?;
            println!(
                "Extraction complete. {} rows saved to {}",
                raw.len(),
                paths.raw.display()
            );
        }
        Command::Transform => {
            let paths = paths_from_env(&query);
            let schema = pipeline::transform_stage(&paths).context("transform failed")?;
            println!(
                "Transformation complete. dim_player={}, dim_team={}, fact_player_stats={}",
                schema.players.len(),
                schema.teams.len(),
                schema.facts.len()
            );
        }
        Command::Load => {
            let config = PipelineConfig::from_env()?;
            let paths = CheckpointPaths::new(&config.data_dir, &query);
            let warehouse = PgWarehouse::connect(&config.database).await?;
            let report = pipeline::load_stage(&warehouse, &paths)
                .await
                .context("load failed")?;
            print!("{}", report);
        }
        Command::Validate => {
            let config = PipelineConfig::from_env()?;
            let paths = CheckpointPaths::new(&config.data_dir, &query);
            let warehouse = PgWarehouse::connect(&config.database).await?;
            let report = pipeline::validate_stage(&warehouse, &paths)
                .await
                .context("validation could not run")?;
            print!("{}", report);
            return Ok(report.passed());
        }
        Command::Run => {
            let config = PipelineConfig::from_env()?;
            let paths = CheckpointPaths::new(&config.data_dir, &query);
            let client = StatsApiClient::new()?;
            let warehouse = PgWarehouse::connect(&config.database).await?;
            let summary = pipeline::run_pipeline(&client, &warehouse, &query, &paths)
                .await
                .context("pipeline failed")?;
            info!(
                "Extracted {} rows into {} players / {} teams / {} stat rows",
                summary.extracted_rows, summary.players, summary.teams, summary.facts
            );
            print!("{}", summary.load);
        }
    }

    Ok(true)
}

/// Checkpoint locations for stages that never touch the database.
fn paths_from_env(query: &SeasonQuery) -> CheckpointPaths {
    CheckpointPaths::new(&config::data_dir_from_env(), query)
}
