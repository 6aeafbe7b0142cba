//! Stage entry points and the end-to-end run.
//!
//! Each stage is a plain function over its inputs so the CLI can run any of
//! them alone, picking up where the checkpoint files left off:
//! extract -> raw CSV -> transform -> processed CSVs -> load / validate

use tracing::info;

use crate::checkpoint::{self, CheckpointPaths};
use crate::dataset::RawDataset;
use crate::domain::StarSchema;
use crate::error::EtlError;
use crate::extract::{SeasonQuery, StatsSource};
use crate::loader::{self, LoadReport};
use crate::transform;
use crate::validator::{self, ValidationReport};
use crate::warehouse::Warehouse;

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub extracted_rows: usize,
    pub players: usize,
    pub teams: usize,
    pub facts: usize,
    pub load: LoadReport,
}

pub async fn extract_stage<S: StatsSource + ?Sized>(
    source: &S,
    query: &SeasonQuery,
    paths: &CheckpointPaths,
) -> Result<RawDataset, EtlError> {
    let raw = source.fetch_player_stats(query).await?;
    checkpoint::write_raw(&paths.raw, &raw)?;
    Ok(raw)
}

/// Transforms `raw` and writes the processed checkpoints.
pub fn transform_and_checkpoint(
    raw: &RawDataset,
    paths: &CheckpointPaths,
) -> Result<StarSchema, EtlError> {
    let schema = transform::transform(raw)?;
    checkpoint::write_processed(paths, &schema)?;
    Ok(schema)
}

pub fn transform_stage(paths: &CheckpointPaths) -> Result<StarSchema, EtlError> {
    let raw = checkpoint::read_raw(&paths.raw)?;
    transform_and_checkpoint(&raw, paths)
}

pub async fn load_stage<W: Warehouse + ?Sized>(
    warehouse: &W,
    paths: &CheckpointPaths,
) -> Result<LoadReport, EtlError> {
    let schema = checkpoint::read_processed(paths)?;
    loader::load(warehouse, &schema).await
}

pub async fn validate_stage<W: Warehouse + ?Sized>(
    warehouse: &W,
    paths: &CheckpointPaths,
) -> Result<ValidationReport, EtlError> {
    let processed = checkpoint::read_processed(paths)?;
    validator::validate(warehouse, &processed).await
}

/// Extract -> Transform -> Load. The first failing stage stops the run.
pub async fn run_pipeline<S, W>(
    source: &S,
    warehouse: &W,
    query: &SeasonQuery,
    paths: &CheckpointPaths,
) -> Result<RunSummary, EtlError>
where
    S: StatsSource + ?Sized,
    W: Warehouse + ?Sized,
{
    info!("[1/3] Extracting {} {}", query.season, query.season_type);
    let raw = extract_stage(source, query, paths).await?;

    info!("[2/3] Transforming {} rows", raw.len());
    let schema = transform_and_checkpoint(&raw, paths)?;

    info!("[3/3] Loading into warehouse");
    let load = loader::load(warehouse, &schema).await?;

    info!("Pipeline completed successfully");
    Ok(RunSummary {
        extracted_rows: raw.len(),
        players: schema.players.len(),
        teams: schema.teams.len(),
        facts: schema.facts.len(),
        load,
    })
}
