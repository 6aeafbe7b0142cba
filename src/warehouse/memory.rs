//! In-process warehouse that enforces the same rules as the PostgreSQL
//! schema: primary-key conflicts are skipped on dimension inserts, fact
//! inserts require both dimension rows, truncates reset the `stat_id`
//! sequence and cascade to the fact table, and a load only becomes visible
//! once every step has succeeded.
//!
//! The `seed_*`/`remove_*` helpers write straight to the tables without any
//! constraint checks, to stage drifted state for the validator.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{DimPlayer, DimTeam, FactPlayerStats, ForeignKey, StarSchema, Table};
use crate::error::EtlError;
use crate::loader::{self, LoadReport};
use crate::warehouse::{LoadSession, Warehouse};

#[derive(Debug, Clone, PartialEq)]
pub struct StoredFact {
    pub stat_id: i64,
    pub fact: FactPlayerStats,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    players: Vec<DimPlayer>,
    teams: Vec<DimTeam>,
    facts: Vec<StoredFact>,
    last_stat_id: i64,
}

#[derive(Debug, Default)]
struct State {
    tables: Tables,
    failing_truncate: Option<Table>,
}

#[derive(Debug, Default)]
pub struct MemoryWarehouse {
    state: Mutex<State>,
}

impl MemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later truncate of `table` fail.
    pub async fn fail_truncate_of(&self, table: Table) {
        self.state.lock().await.failing_truncate = Some(table);
    }

    pub async fn seed_players(&self, rows: impl IntoIterator<Item = DimPlayer>) {
        self.state.lock().await.tables.players.extend(rows);
    }

    pub async fn seed_teams(&self, rows: impl IntoIterator<Item = DimTeam>) {
        self.state.lock().await.tables.teams.extend(rows);
    }

    /// Deletes a team without touching the facts that reference it.
    pub async fn remove_team(&self, team_id: i64) -> usize {
        let mut state = self.state.lock().await;
        let before = state.tables.teams.len();
        state.tables.teams.retain(|t| t.team_id != team_id);
        before - state.tables.teams.len()
    }

    pub async fn remove_fact(&self, stat_id: i64) -> bool {
        let mut state = self.state.lock().await;
        let before = state.tables.facts.len();
        state.tables.facts.retain(|f| f.stat_id != stat_id);
        before != state.tables.facts.len()
    }

    pub async fn players(&self) -> Vec<DimPlayer> {
        self.state.lock().await.tables.players.clone()
    }

    pub async fn teams(&self) -> Vec<DimTeam> {
        self.state.lock().await.tables.teams.clone()
    }

    pub async fn facts(&self) -> Vec<StoredFact> {
        self.state.lock().await.tables.facts.clone()
    }
}

#[async_trait]
impl Warehouse for MemoryWarehouse {
    async fn replace_star_schema(&self, schema: &StarSchema) -> Result<LoadReport, EtlError> {
        let mut state = self.state.lock().await;
        let mut staged = state.tables.clone();

        let report = {
            let mut session = MemorySession {
                tables: &mut staged,
                failing_truncate: state.failing_truncate,
            };
            loader::write_star_schema(&mut session, schema).await?
        };

        state.tables = staged;
        Ok(report)
    }

    async fn count_rows(&self, table: Table) -> Result<i64, EtlError> {
        let state = self.state.lock().await;
        let t = &state.tables;
        let n = match table {
            Table::DimPlayer => t.players.len(),
            Table::DimTeam => t.teams.len(),
            Table::FactPlayerStats => t.facts.len(),
        };
        Ok(n as i64)
    }

    async fn count_duplicate_keys(&self, table: Table) -> Result<i64, EtlError> {
        let state = self.state.lock().await;
        let t = &state.tables;
        let keys: Vec<i64> = match table {
            Table::DimPlayer => t.players.iter().map(|p| p.player_id).collect(),
            Table::DimTeam => t.teams.iter().map(|p| p.team_id).collect(),
            Table::FactPlayerStats => t.facts.iter().map(|f| f.stat_id).collect(),
        };

        let mut groups: HashMap<i64, usize> = HashMap::new();
        for key in keys {
            *groups.entry(key).or_default() += 1;
        }
        Ok(groups.values().filter(|n| **n > 1).count() as i64)
    }

    async fn count_nulls(&self, table: Table, column: &'static str) -> Result<i64, EtlError> {
        let state = self.state.lock().await;
        let t = &state.tables;
        let nulls = match (table, column) {
            // Key columns are non-optional here.
            (Table::DimPlayer, "player_id")
            | (Table::DimTeam, "team_id")
            | (Table::FactPlayerStats, "stat_id" | "player_id" | "team_id") => 0,
            (Table::DimPlayer, "player_name") => {
                t.players.iter().filter(|p| p.player_name.is_none()).count()
            }
            (Table::DimPlayer, "nickname") => {
                t.players.iter().filter(|p| p.nickname.is_none()).count()
            }
            (Table::DimPlayer, "age") => t.players.iter().filter(|p| p.age.is_none()).count(),
            (Table::DimTeam, "team_abbreviation") => t
                .teams
                .iter()
                .filter(|t| t.team_abbreviation.is_none())
                .count(),
            _ => {
                return Err(EtlError::Database {
                    message: format!("column {}.{} does not exist", table, column),
                })
            }
        };
        Ok(nulls as i64)
    }

    async fn count_orphans(&self, key: ForeignKey) -> Result<i64, EtlError> {
        let state = self.state.lock().await;
        let t = &state.tables;
        let orphans = match key {
            ForeignKey::Player => {
                let ids: HashSet<i64> = t.players.iter().map(|p| p.player_id).collect();
                t.facts
                    .iter()
                    .filter(|f| !ids.contains(&f.fact.player_id))
                    .count()
            }
            ForeignKey::Team => {
                let ids: HashSet<i64> = t.teams.iter().map(|t| t.team_id).collect();
                t.facts
                    .iter()
                    .filter(|f| !ids.contains(&f.fact.team_id))
                    .count()
            }
        };
        Ok(orphans as i64)
    }
}

struct MemorySession<'a> {
    tables: &'a mut Tables,
    failing_truncate: Option<Table>,
}

#[async_trait]
impl LoadSession for MemorySession<'_> {
    async fn truncate(&mut self, table: Table) -> Result<(), EtlError> {
        if self.failing_truncate == Some(table) {
            return Err(EtlError::Database {
                message: format!("could not obtain lock on relation \"{}\"", table),
            });
        }

        let t = &mut *self.tables;
        match table {
            Table::FactPlayerStats => {}
            Table::DimPlayer => t.players.clear(),
            Table::DimTeam => t.teams.clear(),
        }
        // CASCADE reaches the fact table from either dimension.
        t.facts.clear();
        t.last_stat_id = 0;
        Ok(())
    }

    async fn insert_players(&mut self, rows: &[DimPlayer]) -> Result<usize, EtlError> {
        let players = &mut self.tables.players;
        let mut keys: HashSet<i64> = players.iter().map(|p| p.player_id).collect();
        let before = players.len();
        for row in rows {
            if keys.insert(row.player_id) {
                players.push(row.clone());
            }
        }
        Ok(players.len() - before)
    }

    async fn insert_teams(&mut self, rows: &[DimTeam]) -> Result<usize, EtlError> {
        let teams = &mut self.tables.teams;
        let mut keys: HashSet<i64> = teams.iter().map(|t| t.team_id).collect();
        let before = teams.len();
        for row in rows {
            if keys.insert(row.team_id) {
                teams.push(row.clone());
            }
        }
        Ok(teams.len() - before)
    }

    async fn insert_facts(&mut self, rows: &[FactPlayerStats]) -> Result<usize, EtlError> {
        let t = &mut *self.tables;
        let players: HashSet<i64> = t.players.iter().map(|p| p.player_id).collect();
        let teams: HashSet<i64> = t.teams.iter().map(|t| t.team_id).collect();

        for row in rows {
            if !players.contains(&row.player_id) {
                return Err(EtlError::ConstraintViolation {
                    message: format!(
                        "fact_player_stats.player_id {} is not present in dim_player",
                        row.player_id
                    ),
                });
            }
            if !teams.contains(&row.team_id) {
                return Err(EtlError::ConstraintViolation {
                    message: format!(
                        "fact_player_stats.team_id {} is not present in dim_team",
                        row.team_id
                    ),
                });
            }
        }

        for row in rows {
            t.last_stat_id += 1;
            t.facts.push(StoredFact {
                stat_id: t.last_stat_id,
                fact: row.clone(),
            });
        }
        Ok(rows.len())
    }
}
