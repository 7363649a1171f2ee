use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Source label for FantasyPros expert consensus ranks
pub const CONSENSUS_SOURCE: &str = "fantasypros";
/// Source label for the half-PPR consensus ADP table
pub const PRIMARY_ADP_SOURCE: &str = "fantasypros_half";
/// Source label for the best-ball ADP table (Underdog proxy)
pub const SECONDARY_ADP_SOURCE: &str = "fantasypros_bestball";
/// Source label for scraped player news
pub const NEWS_SOURCE: &str = "nbc_rotoworld";

/// Fantasy-relevant NFL positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Position {
    QB,
    RB,
    WR,
    TE,
    K,
    DEF,
}

impl Position {
    pub const ALL: [Position; 6] = [
        Position::QB,
        Position::RB,
        Position::WR,
        Position::TE,
        Position::K,
        Position::DEF,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::QB => "QB",
            Position::RB => "RB",
            Position::WR => "WR",
            Position::TE => "TE",
            Position::K => "K",
            Position::DEF => "DEF",
        }
    }

    /// Positions that can fill a FLEX slot
    pub fn is_flex_eligible(&self) -> bool {
        matches!(self, Position::RB | Position::WR | Position::TE)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPosition(pub String);

impl fmt::Display for UnknownPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown position: {}", self.0)
    }
}

impl std::error::Error for UnknownPosition {}

impl FromStr for Position {
    type Err = UnknownPosition;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "QB" => Ok(Position::QB),
            "RB" => Ok(Position::RB),
            "WR" => Ok(Position::WR),
            "TE" => Ok(Position::TE),
            "K" => Ok(Position::K),
            "DEF" | "DST" | "D/ST" => Ok(Position::DEF),
            _ => Err(UnknownPosition(s.to_string())),
        }
    }
}

/// A player from the roster feed. `player_id` is the feed's own id and is
/// stable across refreshes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub player_id: String,
    pub clean_name: String,
    pub position: Position,
    pub team: String,
    pub bye_week: Option<u32>,
}

/// One row of the consensus cheat sheet after name cleaning. `ecr_rank` is
/// `None` when the rank cell was not numeric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedRank {
    pub clean_name: String,
    pub ecr_rank: Option<u32>,
}

/// A consensus row with its derived tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TieredRank {
    pub clean_name: String,
    pub ecr_rank: u32,
    pub tier: u32,
}

/// One row of an ADP table. `adp` is `None` when the cell was not numeric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedAdp {
    pub clean_name: String,
    pub adp: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub headline: String,
    pub url: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSlot {
    pub team_slot_id: u32,
    pub team_name: String,
    pub draft_position: u32,
}

/// Incoming pick request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPick {
    pub round_no: u32,
    pub overall_no: u32,
    pub team_slot_id: u32,
    pub player_id: String,
}

/// A recorded draft pick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pick {
    pub pick_id: i64,
    pub round_no: u32,
    pub overall_no: u32,
    pub team_slot_id: u32,
    pub player_id: String,
    pub ts: DateTime<Utc>,
}

/// Everything known about a player at read time, joined across sources
#[derive(Debug, Clone, PartialEq)]
pub struct BoardEntry {
    pub player: Player,
    pub ecr_rank: Option<u32>,
    pub tier: Option<u32>,
    pub primary_adp: Option<f64>,
    pub secondary_adp: Option<f64>,
    pub injury_risk: Option<f64>,
    pub picked: bool,
}

/// Player as returned by the list and suggestion endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub player_id: String,
    pub clean_name: String,
    pub position: Position,
    pub team: String,
    pub bye_week: Option<u32>,
    pub tier: Option<u32>,
    pub ecr_rank: Option<u32>,
    pub blended_rank: Option<f64>,
    pub adp: Option<f64>,
    pub injury_risk: Option<f64>,
    pub picked: bool,
}
