use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimPlayer {
    pub player_id: i64,
    pub player_name: Option<String>,
    pub nickname: Option<String>,
    pub age: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimTeam {
    pub team_id: i64,
    pub team_abbreviation: Option<String>,
}

/// One player-team stint. Field order matches `STAT_COLUMNS`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactPlayerStats {
    pub player_id: i64,
    pub team_id: i64,
    pub gp: f64,
    pub w: f64,
    pub l: f64,
    pub w_pct: f64,
    pub min: f64,
    pub fgm: f64,
    pub fga: f64,
    pub fg_pct: f64,
    pub fg3m: f64,
    pub fg3a: f64,
    pub fg3_pct: f64,
    pub ftm: f64,
    pub fta: f64,
    pub ft_pct: f64,
    pub oreb: f64,
    pub dreb: f64,
    pub reb: f64,
    pub ast: f64,
    pub tov: f64,
    pub stl: f64,
    pub blk: f64,
    pub blka: f64,
    pub pf: f64,
    pub pfd: f64,
    pub pts: f64,
    pub plus_minus: f64,
    pub dd2: f64,
    pub td3: f64,
    pub nba_fantasy_pts: f64,
}

impl FactPlayerStats {
    pub fn from_stats(player_id: i64, team_id: i64, s: [f64; 29]) -> Self {
        let [
            gp,
            w,
            l,
            w_pct,
            min,
            fgm,
            fga,
            fg_pct,
            fg3m,
            fg3a,
            fg3_pct,
            ftm,
            fta,
            ft_pct,
            oreb,
            dreb,
            reb,
            ast,
            tov,
            stl,
            blk,
            blka,
            pf,
            pfd,
            pts,
            plus_minus,
            dd2,
            td3,
            nba_fantasy_pts,
        ] = s;
        Self {
            player_id,
            team_id,
            gp,
            w,
            l,
            w_pct,
            min,
            fgm,
            fga,
            fg_pct,
            fg3m,
            fg3a,
            fg3_pct,
            ftm,
            fta,
            ft_pct,
            oreb,
            dreb,
            reb,
            ast,
            tov,
            stl,
            blk,
            blka,
            pf,
            pfd,
            pts,
            plus_minus,
            dd2,
            td3,
            nba_fantasy_pts,
        }
    }

    pub fn stats(&self) -> [f64; 29] {
        [
            self.gp,
            self.w,
            self.l,
            self.w_pct,
            self.min,
            self.fgm,
            self.fga,
            self.fg_pct,
            self.fg3m,
            self.fg3a,
            self.fg3_pct,
            self.ftm,
            self.fta,
            self.ft_pct,
            self.oreb,
            self.dreb,
            self.reb,
            self.ast,
            self.tov,
            self.stl,
            self.blk,
            self.blka,
            self.pf,
            self.pfd,
            self.pts,
            self.plus_minus,
            self.dd2,
            self.td3,
            self.nba_fantasy_pts,
        ]
    }
}

/// The three processed tables derived from one raw dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StarSchema {
    pub players: Vec<DimPlayer>,
    pub teams: Vec<DimTeam>,
    pub facts: Vec<FactPlayerStats>,
}

impl StarSchema {
    pub fn row_count(&self, table: Table) -> usize {
        match table {
            Table::DimPlayer => self.players.len(),
            Table::DimTeam => self.teams.len(),
            Table::FactPlayerStats => self.facts.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    DimPlayer,
    DimTeam,
    FactPlayerStats,
}

impl Table {
    pub const ALL: [Table; 3] = [Table::DimPlayer, Table::DimTeam, Table::FactPlayerStats];

    /// Fact first: it holds the foreign keys.
    pub const TRUNCATE_ORDER: [Table; 3] =
        [Table::FactPlayerStats, Table::DimPlayer, Table::DimTeam];

    pub fn as_str(&self) -> &'static str {
        match self {
            Table::DimPlayer => "dim_player",
            Table::DimTeam => "dim_team",
            Table::FactPlayerStats => "fact_player_stats",
        }
    }

    pub fn primary_key(&self) -> &'static str {
        match self {
            Table::DimPlayer => "player_id",
            Table::DimTeam => "team_id",
            Table::FactPlayerStats => "stat_id",
        }
    }

    /// Columns that must never be null once loaded.
    pub fn critical_columns(&self) -> &'static [&'static str] {
        match self {
            Table::DimPlayer => &["player_id"],
            Table::DimTeam => &["team_id"],
            Table::FactPlayerStats => &["player_id", "team_id"],
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Foreign keys held by `fact_player_stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForeignKey {
    Player,
    Team,
}

impl ForeignKey {
    pub const ALL: [ForeignKey; 2] = [ForeignKey::Player, ForeignKey::Team];

    pub fn column(&self) -> &'static str {
        match self {
            ForeignKey::Player => "player_id",
            ForeignKey::Team => "team_id",
        }
    }

    pub fn references(&self) -> Table {
        match self {
            ForeignKey::Player => Table::DimPlayer,
            ForeignKey::Team => Table::DimTeam,
        }
    }
}
