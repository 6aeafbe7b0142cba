use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::pooled_connection::deadpool::{Object, Pool};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::domain::{DimPlayer, DimTeam, FactPlayerStats, ForeignKey, StarSchema, Table};
use crate::error::EtlError;
use crate::loader::{self, LoadReport};
use crate::models::{CountRow, NewDimPlayer, NewDimTeam, NewFactPlayerStats};
use crate::schema::{dim_player, dim_team, fact_player_stats};
use crate::warehouse::{LoadSession, Warehouse};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Keeps each statement well under PostgreSQL's 65535 bind-parameter cap.
const INSERT_BATCH_ROWS: usize = 1000;

#[derive(Clone)]
pub struct PgWarehouse {
    pool: Pool<AsyncPgConnection>,
}

impl PgWarehouse {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, EtlError> {
        info!("Connecting to {}", config.redacted_url());
        Self::connect_url(&config.database_url()).await
    }

    pub async fn connect_url(database_url: &str) -> Result<Self, EtlError> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
        let pool = Pool::builder(manager)
            .build()
            .map_err(|e| EtlError::Connection {
                message: format!("Failed to create database pool: {}", e),
            })?;

        let warehouse = Self { pool };
        warehouse.run_migrations(database_url).await?;

        info!("Database connection established");
        Ok(warehouse)
    }

    /// Creates the star schema tables if they don't exist yet.
    pub async fn run_migrations(&self, database_url: &str) -> Result<(), EtlError> {
        // diesel_migrations only drives synchronous connections.
        let url = database_url.to_string();
        tokio::task::spawn_blocking(move || {
            let mut connection = PgConnection::establish(&url).map_err(|e| EtlError::Migration {
                message: format!("Failed to establish connection for migrations: {}", e),
            })?;

            connection
                .run_pending_migrations(MIGRATIONS)
                .map(|applied| debug!("Applied {} migrations", applied.len()))
                .map_err(|e| EtlError::Migration {
                    message: format!("Failed to run migrations: {}", e),
                })
        })
        .await
        .map_err(|e| EtlError::Migration {
            message: format!("Migration task failed: {}", e),
        })?
    }

    async fn connection(&self) -> Result<Object<AsyncPgConnection>, EtlError> {
        self.pool.get().await.map_err(|e| EtlError::Connection {
            message: format!("Failed to get database connection: {}", e),
        })
    }

    async fn count(&self, sql: String) -> Result<i64, EtlError> {
        let mut conn = self.connection().await?;
        let row = diesel::sql_query(sql).get_result::<CountRow>(&mut conn).await?;
        Ok(row.count)
    }
}

#[async_trait]
impl Warehouse for PgWarehouse {
    async fn replace_star_schema(&self, schema: &StarSchema) -> Result<LoadReport, EtlError> {
        let mut pooled = self.connection().await?;
        let conn: &mut AsyncPgConnection = &mut pooled;

        conn.transaction::<_, EtlError, _>(|conn| {
            async move {
                let mut session = PgSession { conn };
                loader::write_star_schema(&mut session, schema).await
            }
            .scope_boxed()
        })
        .await
    }

    async fn count_rows(&self, table: Table) -> Result<i64, EtlError> {
        self.count(format!("SELECT COUNT(*) AS count FROM {}", table)).await
    }

    async fn count_duplicate_keys(&self, table: Table) -> Result<i64, EtlError> {
        let pk = table.primary_key();
        self.count(format!(
            "SELECT COUNT(*) AS count FROM (
                SELECT {pk} FROM {table} GROUP BY {pk} HAVING COUNT(*) > 1
            ) duplicates"
        ))
        .await
    }

    async fn count_nulls(&self, table: Table, column: &'static str) -> Result<i64, EtlError> {
        self.count(format!(
            "SELECT COUNT(*) AS count FROM {} WHERE {} IS NULL",
            table, column
        ))
        .await
    }

    async fn count_orphans(&self, key: ForeignKey) -> Result<i64, EtlError> {
        let column = key.column();
        let dimension = key.references();
        self.count(format!(
            "SELECT COUNT(*) AS count FROM fact_player_stats f
             LEFT JOIN {dimension} d ON f.{column} = d.{column}
             WHERE d.{column} IS NULL"
        ))
        .await
    }
}

struct PgSession<'c> {
    conn: &'c mut AsyncPgConnection,
}

#[async_trait]
impl LoadSession for PgSession<'_> {
    async fn truncate(&mut self, table: Table) -> Result<(), EtlError> {
        diesel::sql_query(format!("TRUNCATE TABLE {} RESTART IDENTITY CASCADE", table))
            .execute(&mut *self.conn)
            .await?;
        debug!("Truncated {}", table);
        Ok(())
    }

    async fn insert_players(&mut self, rows: &[DimPlayer]) -> Result<usize, EtlError> {
        let mut inserted = 0;
        for chunk in rows.chunks(INSERT_BATCH_ROWS) {
            let batch: Vec<NewDimPlayer> = chunk.iter().map(NewDimPlayer::from).collect();
            inserted += diesel::insert_into(dim_player::table)
                .values(&batch)
                .on_conflict_do_nothing()
                .execute(&mut *self.conn)
                .await?;
        }
        Ok(inserted)
    }

    async fn insert_teams(&mut self, rows: &[DimTeam]) -> Result<usize, EtlError> {
        let mut inserted = 0;
        for chunk in rows.chunks(INSERT_BATCH_ROWS) {
            let batch: Vec<NewDimTeam> = chunk.iter().map(NewDimTeam::from).collect();
            inserted += diesel::insert_into(dim_team::table)
                .values(&batch)
                .on_conflict_do_nothing()
                .execute(&mut *self.conn)
                .await?;
        }
        Ok(inserted)
    }

    async fn insert_facts(&mut self, rows: &[FactPlayerStats]) -> Result<usize, EtlError> {
        let mut inserted = 0;
        for chunk in rows.chunks(INSERT_BATCH_ROWS) {
            let batch: Vec<NewFactPlayerStats> =
                chunk.iter().map(NewFactPlayerStats::from).collect();
            inserted += diesel::insert_into(fact_player_stats::table)
                .values(&batch)
                .execute(&mut *self.conn)
                .await?;
        }
        Ok(inserted)
    }
}
