use crate::models::{Player, Position};
use crate::utils::names::clean_name;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const URL_PLAYERS: &str = "https://api.sleeper.app/v1/players/nfl";
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// One entry of the Sleeper players dataset. Most fields are nullable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SleeperPlayer {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub fantasy_positions: Option<Vec<String>>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub bye_week: Option<serde_json::Value>,
}

impl SleeperPlayer {
    /// `None` when the entry has no usable name or is not at a fantasy
    /// position.
    pub fn into_player(self, player_id: String) -> Option<Player> {
        let full_name = match self.full_name.filter(|n| !n.trim().is_empty()) {
            Some(name) => name,
            None => format!(
                "{} {}",
                self.first_name.unwrap_or_default(),
                self.last_name.unwrap_or_default()
            ),
        };
        let clean = clean_name(&full_name);
        if clean.is_empty() {
            return None;
        }

        let raw_position = self
            .position
            .filter(|p| !p.trim().is_empty())
            .or_else(|| self.fantasy_positions.and_then(|fp| fp.into_iter().next()))?;
        let position: Position = raw_position.parse().ok()?;

        let team = self
            .team
            .map(|t| t.trim().to_uppercase())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "FA".to_string());

        let bye_week = self
            .bye_week
            .and_then(|v| v.as_u64())
            .and_then(|w| u32::try_from(w).ok());

        Some(Player {
            player_id,
            clean_name: clean,
            position,
            team,
            bye_week,
        })
    }
}

/// Convert the raw dataset into players, sorted by id
pub fn roster_players(data: HashMap<String, SleeperPlayer>) -> Vec<Player> {
    let mut players: Vec<Player> = data
        .into_iter()
        .filter_map(|(id, p)| p.into_player(id))
        .collect();
    players.sort_by(|a, b| a.player_id.cmp(&b.player_id));
    players
}

pub struct SleeperClient {
    client: reqwest::Client,
}

impl SleeperClient {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(FETCH_TIMEOUT)
                .build()
                .context("Failed to build Sleeper HTTP client")?,
        })
    }

    /// Fetch the full NFL players dataset, keyed by Sleeper player id
    pub async fn fetch_players(&self) -> Result<HashMap<String, SleeperPlayer>> {
        let response = self
            .client
            .get(URL_PLAYERS)
            .send()
            .await
            .context("Failed to fetch Sleeper players")?;

        if !response.status().is_success() {
            anyhow::bail!("Sleeper API returned error: {}", response.status());
        }

        response
            .json()
            .await
            .context("Failed to parse Sleeper players response")
    }

    pub async fn fetch_roster(&self) -> Result<Vec<Player>> {
        Ok(roster_players(self.fetch_players().await?))
    }
}
