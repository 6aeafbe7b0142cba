//! Splits the raw wide table into `dim_player`, `dim_team` and
//! `fact_player_stats`.
//!
//! Rules:
//! - dimensions are deduplicated by key, keeping the first row in input order
//! - a null nickname becomes `"Unknown"`
//! - a null age becomes the mean age over the whole raw dataset (before dedup)
//! - null stats become `0`
//!
//! Nulls are never fatal. Missing columns, ragged rows, unparseable numbers
//! and null keys are.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use crate::dataset::{
    required_columns, RawDataset, AGE, NICKNAME, PLAYER_ID, PLAYER_NAME, STAT_COLUMNS,
    TEAM_ABBREVIATION, TEAM_ID,
};
use crate::domain::{DimPlayer, DimTeam, FactPlayerStats, StarSchema};
use crate::error::EtlError;

pub const UNKNOWN_NICKNAME: &str = "Unknown";

pub fn transform(raw: &RawDataset) -> Result<StarSchema, EtlError> {
    info!("Transforming {} raw rows", raw.len());

    let columns = ColumnMap::resolve(raw)?;
    for (idx, row) in raw.rows.iter().enumerate() {
        if row.len() != raw.columns.len() {
            return Err(EtlError::RaggedRow {
                row: idx + 1,
                expected: raw.columns.len(),
                found: row.len(),
            });
        }
    }

    let mean_age = mean_age(raw, &columns)?;
    debug!("Mean raw age: {:?}", mean_age);

    let players = build_dim_player(raw, &columns, mean_age)?;
    let teams = build_dim_team(raw, &columns)?;
    let facts = build_fact_player_stats(raw, &columns)?;

    info!(
        "dim_player: {} rows, dim_team: {} rows, fact_player_stats: {} rows",
        players.len(),
        teams.len(),
        facts.len()
    );

    Ok(StarSchema {
        players,
        teams,
        facts,
    })
}

/// Positions of every required column in the raw header.
struct ColumnMap {
    index: HashMap<String, usize>,
}

impl ColumnMap {
    fn resolve(raw: &RawDataset) -> Result<Self, EtlError> {
        let index = raw.column_index();
        let missing: Vec<String> = required_columns()
            .filter(|name| !index.contains_key(*name))
            .map(str::to_string)
            .collect();

        if !missing.is_empty() {
            return Err(EtlError::MissingColumns { columns: missing });
        }

        Ok(Self { index })
    }

    fn get(&self, name: &str) -> usize {
        // Every name asked for was checked in `resolve`.
        self.index[name]
    }
}

struct Cell<'a> {
    row: usize,
    column: &'static str,
    value: Option<&'a str>,
}

impl<'a> Cell<'a> {
    fn at(raw: &'a RawDataset, columns: &ColumnMap, row: usize, column: &'static str) -> Self {
        let value = raw.rows[row][columns.get(column)]
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty());
        Self {
            row: row + 1,
            column,
            value,
        }
    }

    fn text(&self) -> Option<String> {
        self.value.map(str::to_string)
    }

    fn number(&self) -> Result<Option<f64>, EtlError> {
        match self.value {
            None => Ok(None),
            Some(v) if v.eq_ignore_ascii_case("nan") => Ok(None),
            Some(v) => v
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(Some)
                .ok_or_else(|| self.malformed(v)),
        }
    }

    fn key(&self) -> Result<i64, EtlError> {
        let v = self.value.ok_or_else(|| self.malformed(""))?;
        if let Ok(id) = v.parse::<i64>() {
            return Ok(id);
        }
        // Ids written through a float column come back as "1630173.0".
        // Out-of-range values would saturate and merge distinct keys.
        match v.parse::<f64>() {
            Ok(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                Ok(f as i64)
            }
            _ => Err(self.malformed(v)),
        }
    }

    fn malformed(&self, value: &str) -> EtlError {
        EtlError::MalformedValue {
            row: self.row,
            column: self.column.to_string(),
            value: value.to_string(),
        }
    }
}

fn mean_age(raw: &RawDataset, columns: &ColumnMap) -> Result<Option<f64>, EtlError> {
    let mut sum = 0.0;
    let mut n = 0usize;
    for row in 0..raw.len() {
        if let Some(age) = Cell::at(raw, columns, row, AGE).number()? {
            sum += age;
            n += 1;
        }
    }
    Ok((n > 0).then(|| sum / n as f64))
}

fn build_dim_player(
    raw: &RawDataset,
    columns: &ColumnMap,
    mean_age: Option<f64>,
) -> Result<Vec<DimPlayer>, EtlError> {
    let mut seen = HashSet::new();
    let mut players = Vec::new();

    for row in 0..raw.len() {
        let player_id = Cell::at(raw, columns, row, PLAYER_ID).key()?;
        if !seen.insert(player_id) {
            continue;
        }

        let age = Cell::at(raw, columns, row, AGE).number()?.or(mean_age);
        let nickname = Cell::at(raw, columns, row, NICKNAME)
            .text()
            .unwrap_or_else(|| UNKNOWN_NICKNAME.to_string());

        players.push(DimPlayer {
            player_id,
            player_name: Cell::at(raw, columns, row, PLAYER_NAME).text(),
            nickname: Some(nickname),
            age,
        });
    }

    Ok(players)
}

fn build_dim_team(raw: &RawDataset, columns: &ColumnMap) -> Result<Vec<DimTeam>, EtlError> {
    let mut seen = HashSet::new();
    let mut teams = Vec::new();

    for row in 0..raw.len() {
        let team_id = Cell::at(raw, columns, row, TEAM_ID).key()?;
        if seen.insert(team_id) {
            teams.push(DimTeam {
                team_id,
                team_abbreviation: Cell::at(raw, columns, row, TEAM_ABBREVIATION).text(),
            });
        }
    }

    Ok(teams)
}

fn build_fact_player_stats(
    raw: &RawDataset,
    columns: &ColumnMap,
) -> Result<Vec<FactPlayerStats>, EtlError> {
    let mut facts = Vec::with_capacity(raw.len());

    for row in 0..raw.len() {
        let player_id = Cell::at(raw, columns, row, PLAYER_ID).key()?;
        let team_id = Cell::at(raw, columns, row, TEAM_ID).key()?;

        let mut stats = [0.0; 29];
        for (slot, column) in stats.iter_mut().zip(STAT_COLUMNS) {
            *slot = Cell::at(raw, columns, row, column).number()?.unwrap_or(0.0);
        }

        facts.push(FactPlayerStats::from_stats(player_id, team_id, stats));
    }

    Ok(facts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> Vec<String> {
        required_columns().map(str::to_string).collect()
    }

    /// A raw row with every stat set to `pts` and the given descriptors.
    fn row(
        player_id: &str,
        team_id: &str,
        nickname: Option<&str>,
        age: Option<&str>,
        pts: &str,
    ) -> Vec<Option<String>> {
        let mut cells = vec![
            Some(player_id.to_string()),
            Some(format!("Player {}", player_id)),
            nickname.map(str::to_string),
            age.map(str::to_string),
            Some(team_id.to_string()),
            Some(format!("T{}", team_id)),
        ];
        cells.extend(STAT_COLUMNS.iter().map(|_| Some(pts.to_string())));
        cells
    }

    #[test]
    fn traded_player_keeps_first_stint_in_dimension_and_all_stints_in_fact() {
        let raw = RawDataset::new(
            header(),
            vec![
                row("1", "10", Some("Ace"), Some("25"), "100"),
                row("1", "20", Some("Ace"), Some("25"), "50"),
                row("2", "20", Some("Bo"), Some("30"), "70"),
            ],
        );

        let schema = transform(&raw).unwrap();

        assert_eq!(schema.players.len(), 2);
        assert_eq!(schema.teams.len(), 2);
        assert_eq!(schema.facts.len(), 3);
        assert_eq!(schema.teams[0].team_abbreviation.as_deref(), Some("T10"));
        assert_eq!(schema.facts[1].team_id, 20);
        assert_eq!(schema.facts[1].pts, 50.0);
    }

    #[test]
    fn null_nickname_and_age_are_defaulted_from_whole_dataset() {
        // Player 1 appears twice; both stints count toward the mean.
        let raw = RawDataset::new(
            header(),
            vec![
                row("1", "10", Some("Ace"), Some("20"), "1"),
                row("1", "11", Some("Ace"), Some("20"), "1"),
                row("2", "10", None, None, "1"),
                row("3", "10", Some("Cee"), Some("35"), "1"),
            ],
        );

        let schema = transform(&raw).unwrap();
        let defaulted = schema.players.iter().find(|p| p.player_id == 2).unwrap();

        assert_eq!(defaulted.nickname.as_deref(), Some(UNKNOWN_NICKNAME));
        assert_eq!(defaulted.age, Some(25.0));
    }

    #[test]
    fn null_stats_become_zero() {
        let mut sparse = row("1", "10", Some("Ace"), Some("25"), "3");
        let pts_idx = 6 + STAT_COLUMNS.iter().position(|c| *c == "PTS").unwrap();
        sparse[pts_idx] = None;
        sparse[6] = Some(String::new());

        let schema = transform(&RawDataset::new(header(), vec![sparse])).unwrap();

        assert_eq!(schema.facts[0].pts, 0.0);
        assert_eq!(schema.facts[0].gp, 0.0);
        assert_eq!(schema.facts[0].reb, 3.0);
    }

    #[test]
    fn missing_columns_are_reported_together() {
        let columns: Vec<String> = header()
            .into_iter()
            .filter(|c| c != AGE && c != "PTS")
            .collect();
        let err = transform(&RawDataset::new(columns, vec![])).unwrap_err();

        match err {
            EtlError::MissingColumns { columns } => {
                assert_eq!(columns, vec!["AGE".to_string(), "PTS".to_string()])
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn unparseable_stat_is_a_schema_error() {
        let mut bad = row("1", "10", Some("Ace"), Some("25"), "3");
        bad[7] = Some("lots".to_string());

        let err = transform(&RawDataset::new(header(), vec![bad])).unwrap_err();

        assert!(err.is_schema_error());
        assert!(err.to_string().contains("lots"));
    }

    #[test]
    fn null_player_id_is_a_schema_error() {
        let mut bad = row("1", "10", Some("Ace"), Some("25"), "3");
        bad[0] = None;

        let err = transform(&RawDataset::new(header(), vec![bad])).unwrap_err();

        assert!(matches!(err, EtlError::MalformedValue { row: 1, .. }));
    }

    #[test]
    fn float_formatted_ids_are_accepted() {
        let raw = RawDataset::new(
            header(),
            vec![row("1630173.0", "1610612737", Some("Ace"), Some("25"), "1")],
        );

        let schema = transform(&raw).unwrap();

        assert_eq!(schema.players[0].player_id, 1630173);
        assert_eq!(schema.teams[0].team_id, 1610612737);
    }

    #[test]
    fn ids_beyond_i64_are_rejected() {
        let raw = RawDataset::new(
            header(),
            vec![
                row("1e20", "1610612737", Some("Ace"), Some("25"), "1"),
                row("5e25", "1610612737", Some("Deuce"), Some("26"), "1"),
            ],
        );

        let err = transform(&raw).unwrap_err();

        assert!(
            matches!(err, EtlError::MalformedValue { row: 1, ref column, ref value }
                if column == "PLAYER_ID" && value == "1e20"),
            "{}",
            err
        );
    }
}
