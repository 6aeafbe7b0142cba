//! Full-replace load of the star schema.
//!
//! Every run truncates all three tables (fact first) and re-inserts the
//! processed datasets, dimensions before the fact table. The warehouse wraps
//! the whole sequence in one transaction, so a failure leaves the previous
//! contents in place.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::domain::{StarSchema, Table};
use crate::error::EtlError;
use crate::warehouse::{LoadSession, Warehouse};

/// Rows actually inserted per table.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub dim_player: usize,
    pub dim_team: usize,
    pub fact_player_stats: usize,
    pub loaded_at: DateTime<Utc>,
}

impl LoadReport {
    pub fn inserted(&self, table: Table) -> usize {
        match table {
            Table::DimPlayer => self.dim_player,
            Table::DimTeam => self.dim_team,
            Table::FactPlayerStats => self.fact_player_stats,
        }
    }
}

impl std::fmt::Display for LoadReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Load completed at {}", self.loaded_at.to_rfc3339())?;
        for table in Table::ALL {
            writeln!(f, "  {}: {} rows inserted", table, self.inserted(table))?;
        }
        Ok(())
    }
}

pub async fn load<W: Warehouse + ?Sized>(
    warehouse: &W,
    schema: &StarSchema,
) -> Result<LoadReport, EtlError> {
    info!(
        "Loading {} players, {} teams, {} stat rows",
        schema.players.len(),
        schema.teams.len(),
        schema.facts.len()
    );

    let report = warehouse.replace_star_schema(schema).await?;

    info!(
        "Load committed: dim_player={}, dim_team={}, fact_player_stats={}",
        report.dim_player, report.dim_team, report.fact_player_stats
    );
    Ok(report)
}

/// The ordered write sequence. Callers must run this inside a transaction.
pub async fn write_star_schema<S: LoadSession + ?Sized>(
    session: &mut S,
    schema: &StarSchema,
) -> Result<LoadReport, EtlError> {
    for table in Table::TRUNCATE_ORDER {
        session
            .truncate(table)
            .await
            .map_err(|e| match e {
                EtlError::TruncateFailure { .. } => e,
                other => EtlError::TruncateFailure {
                    table: table.to_string(),
                    message: other.to_string(),
                },
            })?;
    }
    debug!("Tables truncated");

    let dim_player = session.insert_players(&schema.players).await?;
    warn_on_skipped(Table::DimPlayer, schema.players.len(), dim_player);

    let dim_team = session.insert_teams(&schema.teams).await?;
    warn_on_skipped(Table::DimTeam, schema.teams.len(), dim_team);

    // Only reached once both dimensions are in place.
    let fact_player_stats = session.insert_facts(&schema.facts).await?;

    Ok(LoadReport {
        dim_player,
        dim_team,
        fact_player_stats,
        loaded_at: Utc::now(),
    })
}

fn warn_on_skipped(table: Table, attempted: usize, inserted: usize) {
    if inserted < attempted {
        warn!(
            "{}: skipped {} rows with conflicting keys",
            table,
            attempted - inserted
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DimPlayer, DimTeam, FactPlayerStats};
    use async_trait::async_trait;

    /// Records the call order and fails where asked.
    #[derive(Default)]
    struct RecordingSession {
        calls: Vec<String>,
        fail_fact_insert: bool,
    }

    #[async_trait]
    impl LoadSession for RecordingSession {
        async fn truncate(&mut self, table: Table) -> Result<(), EtlError> {
            self.calls.push(format!("truncate {}", table));
            Ok(())
        }

        async fn insert_players(&mut self, rows: &[DimPlayer]) -> Result<usize, EtlError> {
            self.calls.push("insert dim_player".to_string());
            Ok(rows.len())
        }

        async fn insert_teams(&mut self, rows: &[DimTeam]) -> Result<usize, EtlError> {
            self.calls.push("insert dim_team".to_string());
            // Pretend one team key already existed.
            Ok(rows.len().saturating_sub(1))
        }

        async fn insert_facts(&mut self, rows: &[FactPlayerStats]) -> Result<usize, EtlError> {
            self.calls.push("insert fact_player_stats".to_string());
            if self.fail_fact_insert {
                return Err(EtlError::ConstraintViolation {
                    message: "missing dim_team row".to_string(),
                });
            }
            Ok(rows.len())
        }
    }

    fn schema() -> StarSchema {
        StarSchema {
            players: vec![DimPlayer {
                player_id: 1,
                player_name: None,
                nickname: Some("Unknown".to_string()),
                age: None,
            }],
            teams: vec![
                DimTeam {
                    team_id: 10,
                    team_abbreviation: None,
                },
                DimTeam {
                    team_id: 20,
                    team_abbreviation: None,
                },
            ],
            facts: vec![FactPlayerStats::from_stats(1, 10, [0.0; 29])],
        }
    }

    #[tokio::test]
    async fn truncates_fact_first_and_inserts_it_last() {
        let mut session = RecordingSession::default();

        let report = write_star_schema(&mut session, &schema()).await.unwrap();

        assert_eq!(
            session.calls,
            vec![
                "truncate fact_player_stats",
                "truncate dim_player",
                "truncate dim_team",
                "insert dim_player",
                "insert dim_team",
                "insert fact_player_stats",
            ]
        );
        assert_eq!(report.inserted(Table::DimTeam), 1);
        assert_eq!(report.inserted(Table::FactPlayerStats), 1);
    }

    #[tokio::test]
    async fn fact_constraint_violation_is_not_swallowed() {
        let mut session = RecordingSession {
            fail_fact_insert: true,
            ..Default::default()
        };

        let err = write_star_schema(&mut session, &schema()).await.unwrap_err();

        assert!(matches!(err, EtlError::ConstraintViolation { .. }));
    }
}
