//! The wide, denormalized table as it comes back from the stats API.

use std::collections::HashMap;

pub const PLAYER_ID: &str = "PLAYER_ID";
pub const PLAYER_NAME: &str = "PLAYER_NAME";
pub const NICKNAME: &str = "NICKNAME";
pub const AGE: &str = "AGE";
pub const TEAM_ID: &str = "TEAM_ID";
pub const TEAM_ABBREVIATION: &str = "TEAM_ABBREVIATION";

/// Numeric columns carried into `fact_player_stats`, in schema order.
pub const STAT_COLUMNS: [&str; 29] = [
    "GP",
    "W",
    "L",
    "W_PCT",
    "MIN",
    "FGM",
    "FGA",
    "FG_PCT",
    "FG3M",
    "FG3A",
    "FG3_PCT",
    "FTM",
    "FTA",
    "FT_PCT",
    "OREB",
    "DREB",
    "REB",
    "AST",
    "TOV",
    "STL",
    "BLK",
    "BLKA",
    "PF",
    "PFD",
    "PTS",
    "PLUS_MINUS",
    "DD2",
    "TD3",
    "NBA_FANTASY_PTS",
];

/// Every column the transform reads.
pub fn required_columns() -> impl Iterator<Item = &'static str> {
    [PLAYER_ID, PLAYER_NAME, NICKNAME, AGE, TEAM_ID, TEAM_ABBREVIATION]
        .into_iter()
        .chain(STAT_COLUMNS)
}

/// Rectangular dataset of named columns. Cells are kept as text; `None` is null.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDataset {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawDataset {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Maps normalized header names to their position.
    pub fn column_index(&self) -> HashMap<String, usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, name)| (normalize_column_name(name), idx))
            .collect()
    }
}

pub fn normalize_column_name(name: &str) -> String {
    // CSVs re-saved by spreadsheet tools may carry a BOM on the first header.
    name.trim().trim_start_matches('\u{feff}').to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_index_ignores_case_and_bom() {
        let raw = RawDataset::new(
            vec!["\u{feff}player_id".to_string(), " Team_Id ".to_string()],
            vec![],
        );
        let index = raw.column_index();

        assert_eq!(index.get(PLAYER_ID), Some(&0));
        assert_eq!(index.get(TEAM_ID), Some(&1));
    }

    #[test]
    fn required_columns_cover_descriptors_and_stats() {
        assert_eq!(required_columns().count(), 6 + STAT_COLUMNS.len());
    }
}
