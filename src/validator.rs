//! Read-only checks that the loaded tables match the processed datasets.
//!
//! Four categories run unconditionally: row counts against the processed
//! data, primary-key uniqueness, nulls in key columns, and orphaned fact
//! rows. A failing check never stops the others; the report carries all of
//! them.

use tracing::{info, warn};

use crate::domain::{ForeignKey, StarSchema, Table};
use crate::error::EtlError;
use crate::warehouse::Warehouse;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckKind {
    RowCount,
    Uniqueness,
    Nulls,
    ReferentialIntegrity,
}

impl CheckKind {
    pub const ALL: [CheckKind; 4] = [
        CheckKind::RowCount,
        CheckKind::Uniqueness,
        CheckKind::Nulls,
        CheckKind::ReferentialIntegrity,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            CheckKind::RowCount => "Row Count Validation",
            CheckKind::Uniqueness => "Duplicate Validation",
            CheckKind::Nulls => "Null Value Validation",
            CheckKind::ReferentialIntegrity => "Foreign Key Validation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub kind: CheckKind,
    pub table: Table,
    pub column: &'static str,
    /// Source-of-truth row count; only set for row-count checks.
    pub expected: Option<i64>,
    pub observed: i64,
}

impl CheckOutcome {
    pub fn passed(&self) -> bool {
        match self.kind {
            CheckKind::RowCount => self.expected == Some(self.observed),
            _ => self.observed == 0,
        }
    }
}

impl std::fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = if self.passed() { "PASS" } else { "FAIL" };
        match self.kind {
            CheckKind::RowCount => write!(
                f,
                "{} | {}: CSV={} rows, DB={} rows",
                status,
                self.table,
                self.expected.unwrap_or_default(),
                self.observed
            ),
            CheckKind::Uniqueness => write!(
                f,
                "{} | {}: {} duplicate {}s found",
                status, self.table, self.observed, self.column
            ),
            CheckKind::Nulls => write!(
                f,
                "{} | {}.{}: {} null values found",
                status, self.table, self.column, self.observed
            ),
            CheckKind::ReferentialIntegrity => write!(
                f,
                "{} | {}.{}: {} orphaned records",
                status, self.table, self.column, self.observed
            ),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub checks: Vec<CheckOutcome>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.checks.iter().all(CheckOutcome::passed)
    }

    pub fn failures(&self) -> Vec<&CheckOutcome> {
        self.checks.iter().filter(|c| !c.passed()).collect()
    }

    pub fn category(&self, kind: CheckKind) -> impl Iterator<Item = &CheckOutcome> {
        self.checks.iter().filter(move |c| c.kind == kind)
    }

    pub fn category_passed(&self, kind: CheckKind) -> bool {
        self.category(kind).all(CheckOutcome::passed)
    }

    pub fn find(&self, kind: CheckKind, table: Table, column: &str) -> Option<&CheckOutcome> {
        self.category(kind).find(|c| c.table == table && c.column == column)
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for kind in CheckKind::ALL {
            writeln!(f, "\n--- {} ---", kind.title())?;
            for check in self.category(kind) {
                writeln!(f, "{}", check)?;
            }
        }
        writeln!(f)?;
        if self.passed() {
            writeln!(f, "All validation checks passed!")
        } else {
            writeln!(
                f,
                "{} validation checks failed, review above",
                self.failures().len()
            )
        }
    }
}

pub async fn validate<W: Warehouse + ?Sized>(
    warehouse: &W,
    processed: &StarSchema,
) -> Result<ValidationReport, EtlError> {
    info!("Running data validation");
    let mut checks = Vec::new();

    for table in Table::ALL {
        checks.push(CheckOutcome {
            kind: CheckKind::RowCount,
            table,
            column: "*",
            expected: Some(processed.row_count(table) as i64),
            observed: warehouse.count_rows(table).await?,
        });
    }

    for table in Table::ALL {
        checks.push(CheckOutcome {
            kind: CheckKind::Uniqueness,
            table,
            column: table.primary_key(),
            expected: None,
            observed: warehouse.count_duplicate_keys(table).await?,
        });
    }

    for table in Table::ALL {
        for &column in table.critical_columns() {
            checks.push(CheckOutcome {
                kind: CheckKind::Nulls,
                table,
                column,
                expected: None,
                observed: warehouse.count_nulls(table, column).await?,
            });
        }
    }

    for key in ForeignKey::ALL {
        checks.push(CheckOutcome {
            kind: CheckKind::ReferentialIntegrity,
            table: Table::FactPlayerStats,
            column: key.column(),
            expected: None,
            observed: warehouse.count_orphans(key).await?,
        });
    }

    let report = ValidationReport { checks };
    for failure in report.failures() {
        warn!("{}", failure);
    }
    info!(
        "Validation finished: {} checks, {} failed",
        report.checks.len(),
        report.failures().len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(kind: CheckKind, expected: Option<i64>, observed: i64) -> CheckOutcome {
        CheckOutcome {
            kind,
            table: Table::FactPlayerStats,
            column: "team_id",
            expected,
            observed,
        }
    }

    #[test]
    fn row_count_mismatch_shows_both_counts() {
        let check = outcome(CheckKind::RowCount, Some(500), 499);

        assert!(!check.passed());
        assert_eq!(
            check.to_string(),
            "FAIL | fact_player_stats: CSV=500 rows, DB=499 rows"
        );
    }

    #[test]
    fn zero_count_checks_pass() {
        let check = outcome(CheckKind::ReferentialIntegrity, None, 0);

        assert!(check.passed());
        assert_eq!(
            check.to_string(),
            "PASS | fact_player_stats.team_id: 0 orphaned records"
        );
    }

    #[test]
    fn one_failure_fails_the_whole_report() {
        let report = ValidationReport {
            checks: vec![
                outcome(CheckKind::RowCount, Some(3), 3),
                outcome(CheckKind::Nulls, None, 2),
                outcome(CheckKind::Uniqueness, None, 0),
            ],
        };

        assert!(!report.passed());
        assert_eq!(report.failures().len(), 1);
        assert!(report.category_passed(CheckKind::RowCount));
        assert!(!report.category_passed(CheckKind::Nulls));
        assert!(report.to_string().contains("1 validation checks failed"));
    }
}
