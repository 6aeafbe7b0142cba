//! Stats API integration for league-wide player season totals.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, ORIGIN, REFERER, USER_AGENT,
};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::dataset::RawDataset;
use crate::error::EtlError;

const BASE_URL: &str = "https://stats.nba.com/stats/leaguedashplayerstats";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const SEASON: &str = "2024-25";
pub const SEASON_TYPE: &str = "Regular Season";

/// Which season the extract pulls. Fixed to [`SEASON`] / [`SEASON_TYPE`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonQuery {
    pub season: String,
    pub season_type: String,
}

impl Default for SeasonQuery {
    fn default() -> Self {
        Self {
            season: SEASON.to_string(),
            season_type: SEASON_TYPE.to_string(),
        }
    }
}

/// Anything that can hand back one rectangular player-stats dataset.
#[async_trait]
pub trait StatsSource: Send + Sync {
    async fn fetch_player_stats(&self, query: &SeasonQuery) -> Result<RawDataset, EtlError>;
}

pub struct StatsApiClient {
    client: Client,
    base_url: String,
}

impl StatsApiClient {
    pub fn new() -> Result<Self, EtlError> {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, EtlError> {
        let client = Client::builder()
            .default_headers(default_headers())
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl StatsSource for StatsApiClient {
    async fn fetch_player_stats(&self, query: &SeasonQuery) -> Result<RawDataset, EtlError> {
        info!(
            "Requesting player stats for {} ({})",
            query.season, query.season_type
        );

        let resp = self
            .client
            .get(&self.base_url)
            .query(&query_params(query))
            .send()
            .await
            .map_err(|e| EtlError::Extract {
                message: format!("request failed: {}", e),
            })?;

        if !resp.status().is_success() {
            return Err(EtlError::Extract {
                message: format!("request failed with status {}", resp.status()),
            });
        }

        let body: StatsResponse = resp.json().await.map_err(|e| EtlError::Extract {
            message: format!("failed to parse response: {}", e),
        })?;

        let raw = body.into_dataset()?;
        info!("Extracted {} rows x {} columns", raw.len(), raw.columns.len());
        Ok(raw)
    }
}

fn default_headers() -> HeaderMap {
    // stats.nba.com drops requests that don't look like they came from the site.
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:140.0) Gecko/20100101 Firefox/140.0",
        ),
    );
    headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(ORIGIN, HeaderValue::from_static("https://www.nba.com"));
    headers.insert(REFERER, HeaderValue::from_static("https://www.nba.com/"));
    headers
}

fn query_params(query: &SeasonQuery) -> Vec<(&'static str, String)> {
    let fixed = [
        ("College", ""),
        ("Conference", ""),
        ("Country", ""),
        ("DateFrom", ""),
        ("DateTo", ""),
        ("Division", ""),
        ("DraftPick", ""),
        ("DraftYear", ""),
        ("GameScope", ""),
        ("GameSegment", ""),
        ("Height", ""),
        ("LastNGames", "0"),
        ("LeagueID", "00"),
        ("Location", ""),
        ("MeasureType", "Base"),
        ("Month", "0"),
        ("OpponentTeamID", "0"),
        ("Outcome", ""),
        ("PORound", "0"),
        ("PaceAdjust", "N"),
        ("PerMode", "Totals"),
        ("Period", "0"),
        ("PlayerExperience", ""),
        ("PlayerPosition", ""),
        ("PlusMinus", "N"),
        ("Rank", "N"),
        ("SeasonSegment", ""),
        ("ShotClockRange", ""),
        ("StarterBench", ""),
        ("TeamID", "0"),
        ("TwoWay", "0"),
        ("VsConference", ""),
        ("VsDivision", ""),
        ("Weight", ""),
    ];

    fixed
        .into_iter()
        .map(|(k, v)| (k, v.to_string()))
        .chain([
            ("Season", query.season.clone()),
            ("SeasonType", query.season_type.clone()),
        ])
        .collect()
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    #[serde(rename = "resultSets")]
    result_sets: Vec<ResultSet>,
}

#[derive(Debug, Deserialize)]
struct ResultSet {
    headers: Vec<String>,
    #[serde(rename = "rowSet")]
    row_set: Vec<Vec<Value>>,
}

impl StatsResponse {
    fn into_dataset(self) -> Result<RawDataset, EtlError> {
        let set = self
            .result_sets
            .into_iter()
            .next()
            .ok_or_else(|| EtlError::Extract {
                message: "response contained no result sets".to_string(),
            })?;

        let rows = set
            .row_set
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect();

        Ok(RawDataset::new(set.headers, rows))
    }
}

fn cell_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}
