//! CSV checkpoints written between stages so each stage can be re-run alone.
//!
//! Layout under the data directory:
//! - `raw/nba_player_stats_<season>.csv`: the wide table as extracted
//! - `processed/{dim_player,dim_team,fact_player_stats}.csv`

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::dataset::RawDataset;
use crate::domain::{StarSchema, Table};
use crate::error::EtlError;
use crate::extract::SeasonQuery;

#[derive(Debug, Clone)]
pub struct CheckpointPaths {
    pub raw: PathBuf,
    pub processed_dir: PathBuf,
}

impl CheckpointPaths {
    pub fn new(data_dir: &Path, query: &SeasonQuery) -> Self {
        let season = query.season.replace('-', "_");
        Self {
            raw: data_dir
                .join("raw")
                .join(format!("nba_player_stats_{}.csv", season)),
            processed_dir: data_dir.join("processed"),
        }
    }

    pub fn processed(&self, table: Table) -> PathBuf {
        self.processed_dir.join(format!("{}.csv", table.as_str()))
    }
}

pub fn write_raw(path: &Path, raw: &RawDataset) -> Result<(), EtlError> {
    let mut writer = csv::Writer::from_writer(create(path)?);
    writer.write_record(&raw.columns)?;
    for row in &raw.rows {
        writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
    }
    writer.flush()?;

    info!("{} raw rows saved to {}", raw.len(), path.display());
    Ok(())
}

pub fn read_raw(path: &Path) -> Result<RawDataset, EtlError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(open(path)?);

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| checkpoint_error(path, e))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows: Vec<Vec<Option<String>>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| checkpoint_error(path, e))?;
        rows.push(
            record
                .iter()
                .map(|field| (!field.is_empty()).then(|| field.to_string()))
                .collect(),
        );
    }

    info!("{} rows loaded from {}", rows.len(), path.display());
    Ok(RawDataset::new(columns, rows))
}

pub fn write_processed(paths: &CheckpointPaths, schema: &StarSchema) -> Result<(), EtlError> {
    write_records(&paths.processed(Table::DimPlayer), &schema.players)?;
    write_records(&paths.processed(Table::DimTeam), &schema.teams)?;
    write_records(&paths.processed(Table::FactPlayerStats), &schema.facts)?;

    info!("Processed CSVs saved to {}", paths.processed_dir.display());
    Ok(())
}

pub fn read_processed(paths: &CheckpointPaths) -> Result<StarSchema, EtlError> {
    Ok(StarSchema {
        players: read_records(&paths.processed(Table::DimPlayer))?,
        teams: read_records(&paths.processed(Table::DimTeam))?,
        facts: read_records(&paths.processed(Table::FactPlayerStats))?,
    })
}

fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<(), EtlError> {
    let mut writer = csv::Writer::from_writer(create(path)?);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, EtlError> {
    let mut reader = csv::Reader::from_reader(open(path)?);
    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| checkpoint_error(path, e))
}

fn create(path: &Path) -> Result<File, EtlError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| checkpoint_error(path, e))?;
    }
    File::create(path).map_err(|e| checkpoint_error(path, e))
}

fn open(path: &Path) -> Result<File, EtlError> {
    File::open(path).map_err(|e| checkpoint_error(path, e))
}

fn checkpoint_error(path: &Path, err: impl std::fmt::Display) -> EtlError {
    EtlError::Checkpoint {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DimPlayer, DimTeam, FactPlayerStats};

    #[test]
    fn paths_follow_season_naming() {
        let paths = CheckpointPaths::new(Path::new("data"), &SeasonQuery::default());

        assert_eq!(paths.raw, PathBuf::from("data/raw/nba_player_stats_2024_25.csv"));
        assert_eq!(
            paths.processed(Table::FactPlayerStats),
            PathBuf::from("data/processed/fact_player_stats.csv")
        );
    }

    #[test]
    fn raw_nulls_survive_as_empty_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw/stats.csv");
        let raw = RawDataset::new(
            vec!["PLAYER_ID".to_string(), "NICKNAME".to_string()],
            vec![vec![Some("1".to_string()), None]],
        );

        write_raw(&path, &raw).unwrap();
        let back = read_raw(&path).unwrap();

        assert_eq!(back, raw);
    }

    #[test]
    fn processed_header_uses_schema_column_names() {
        let dir = tempfile::tempdir().unwrap();
        let paths = CheckpointPaths::new(dir.path(), &SeasonQuery::default());
        let schema = StarSchema {
            players: vec![DimPlayer {
                player_id: 7,
                player_name: Some("Seven".to_string()),
                nickname: None,
                age: Some(26.3),
            }],
            teams: vec![DimTeam {
                team_id: 70,
                team_abbreviation: Some("SEV".to_string()),
            }],
            facts: vec![FactPlayerStats::from_stats(7, 70, [1.5; 29])],
        };

        write_processed(&paths, &schema).unwrap();

        let player_csv = fs::read_to_string(paths.processed(Table::DimPlayer)).unwrap();
        assert!(player_csv.starts_with("player_id,player_name,nickname,age\n"));
        let fact_csv = fs::read_to_string(paths.processed(Table::FactPlayerStats)).unwrap();
        assert!(fact_csv.starts_with("player_id,team_id,gp,w,l,w_pct,min,"));
        assert_eq!(read_processed(&paths).unwrap(), schema);
    }

    #[test]
    fn missing_processed_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let paths = CheckpointPaths::new(dir.path(), &SeasonQuery::default());

        let err = read_processed(&paths).unwrap_err();

        assert!(err.to_string().contains("dim_player.csv"));
    }
}
