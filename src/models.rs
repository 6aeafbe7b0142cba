use diesel::prelude::*;

use crate::domain::{DimPlayer, DimTeam, FactPlayerStats};
use crate::schema::{dim_player, dim_team, fact_player_stats};

#[derive(Insertable, Debug)]
#[diesel(table_name = dim_player)]
pub struct NewDimPlayer<'a> {
    pub player_id: i64,
    pub player_name: Option<&'a str>,
    pub nickname: Option<&'a str>,
    pub age: Option<f64>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = dim_team)]
pub struct NewDimTeam<'a> {
    pub team_id: i64,
    pub team_abbreviation: Option<&'a str>,
}

/// `stat_id` is left to the sequence.
#[derive(Insertable, Debug)]
#[diesel(table_name = fact_player_stats)]
pub struct NewFactPlayerStats {
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

impl<'a> From<&'a DimPlayer> for NewDimPlayer<'a> {
    fn from(player: &'a DimPlayer) -> Self {
        NewDimPlayer {
            player_id: player.player_id,
            player_name: player.player_name.as_deref(),
            nickname: player.nickname.as_deref(),
            age: player.age,
        }
    }
}

impl<'a> From<&'a DimTeam> for NewDimTeam<'a> {
    fn from(team: &'a DimTeam) -> Self {
        NewDimTeam {
            team_id: team.team_id,
            team_abbreviation: team.team_abbreviation.as_deref(),
        }
    }
}

impl From<&FactPlayerStats> for NewFactPlayerStats {
    fn from(f: &FactPlayerStats) -> Self {
        NewFactPlayerStats {
            player_id: f.player_id,
            team_id: f.team_id,
            gp: f.gp,
            w: f.w,
            l: f.l,
            w_pct: f.w_pct,
            min: f.min,
            fgm: f.fgm,
            fga: f.fga,
            fg_pct: f.fg_pct,
            fg3m: f.fg3m,
            fg3a: f.fg3a,
            fg3_pct: f.fg3_pct,
            ftm: f.ftm,
            fta: f.fta,
            ft_pct: f.ft_pct,
            oreb: f.oreb,
            dreb: f.dreb,
            reb: f.reb,
            ast: f.ast,
            tov: f.tov,
            stl: f.stl,
            blk: f.blk,
            blka: f.blka,
            pf: f.pf,
            pfd: f.pfd,
            pts: f.pts,
            plus_minus: f.plus_minus,
            dd2: f.dd2,
            td3: f.td3,
            nba_fantasy_pts: f.nba_fantasy_pts,
        }
    }
}

/// Single `COUNT(*)` result from a raw SQL probe.
#[derive(QueryableByName, Debug)]
pub struct CountRow {
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub count: i64,
}
