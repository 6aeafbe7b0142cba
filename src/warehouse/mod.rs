//! Database handle used by the loader and the validator.
//!
//! [`Warehouse`] owns connection/transaction scope; [`LoadSession`] is the
//! handle the loader writes through while that scope is open. Backends:
//! - [`PgWarehouse`]: PostgreSQL through diesel-async and a deadpool pool
//! - [`MemoryWarehouse`]: in-process tables with the same constraint rules

use async_trait::async_trait;

use crate::domain::{DimPlayer, DimTeam, FactPlayerStats, ForeignKey, StarSchema, Table};
use crate::error::EtlError;
use crate::loader::LoadReport;

pub mod memory;
pub mod postgres;

pub use memory::MemoryWarehouse;
pub use postgres::PgWarehouse;

/// Writes issued inside one open transaction.
#[async_trait]
pub trait LoadSession: Send {
    /// Empties `table` and resets its identity counter.
    async fn truncate(&mut self, table: Table) -> Result<(), EtlError>;

    /// Returns the number of rows actually inserted; key conflicts are skipped.
    async fn insert_players(&mut self, rows: &[DimPlayer]) -> Result<usize, EtlError>;

    /// Returns the number of rows actually inserted; key conflicts are skipped.
    async fn insert_teams(&mut self, rows: &[DimTeam]) -> Result<usize, EtlError>;

    /// Fails with [`EtlError::ConstraintViolation`] if a referenced dimension row is missing.
    async fn insert_facts(&mut self, rows: &[FactPlayerStats]) -> Result<usize, EtlError>;
}

#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Runs [`crate::loader::write_star_schema`] inside a single transaction.
    /// Nothing is visible unless every step succeeds.
    async fn replace_star_schema(&self, schema: &StarSchema) -> Result<LoadReport, EtlError>;

    async fn count_rows(&self, table: Table) -> Result<i64, EtlError>;

    /// Number of primary-key values shared by more than one row.
    async fn count_duplicate_keys(&self, table: Table) -> Result<i64, EtlError>;

    async fn count_nulls(&self, table: Table, column: &'static str) -> Result<i64, EtlError>;

    /// Fact rows whose `key` has no match in the referenced dimension.
    async fn count_orphans(&self, key: ForeignKey) -> Result<i64, EtlError>;
}
