pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod models;
pub mod scrapers;
pub mod utils;
pub mod web;

pub use config::AppConfig;
pub use db::Database;
pub use error::DraftError;
pub use feed::{CachedFeed, DataFeed, LiveFeed};
pub use models::*;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use utils::injury::injury_risk;
use utils::matching::{IdentityResolver, Resolution};
use utils::tiers::{assign_tiers, TIER_GAP};

/// Resolution counts for one external source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceSummary {
    pub fetched: usize,
    pub resolved: usize,
    pub unresolved: usize,
    pub malformed: usize,
}

/// What a refresh did, returned by `POST /refresh`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshSummary {
    pub ok: bool,
    /// Players known after the refresh
    pub players: usize,
    pub roster_rows: usize,
    pub consensus: SourceSummary,
    pub primary_adp: SourceSummary,
    pub secondary_adp: Option<SourceSummary>,
    pub news_items: usize,
    pub injuries_scored: usize,
    /// Optional sources that failed and were skipped
    pub degraded_sources: Vec<String>,
    pub refreshed_at: DateTime<Utc>,
}

fn resolve_ranks(
    resolver: &IdentityResolver,
    ranks: &[ScrapedRank],
) -> (Vec<(String, u32, u32)>, SourceSummary) {
    let tiered = assign_tiers(ranks, TIER_GAP);
    let mut summary = SourceSummary {
        fetched: ranks.len(),
        malformed: ranks.iter().filter(|r| r.ecr_rank.is_none()).count(),
        ..Default::default()
    };
    let mut rows = Vec::new();

    for row in tiered {
        match resolver.resolve(&row.clean_name) {
            Resolution::Unresolved => {
                debug!("No roster match for ranked player {}", row.clean_name);
                summary.unresolved += 1;
            }
            resolution => {
                if let Resolution::Approximate { player_id, score } = &resolution {
                    debug!("Matched {} to {} ({:.1})", row.clean_name, player_id, score);
                }
                summary.resolved += 1;
                if let Some(id) = resolution.player_id() {
                    rows.push((id.to_string(), row.ecr_rank, row.tier));
                }
            }
        }
    }

    (rows, summary)
}

fn resolve_adp(resolver: &IdentityResolver, adp: &[ScrapedAdp]) -> (Vec<(String, f64)>, SourceSummary) {
    let mut summary = SourceSummary {
        fetched: adp.len(),
        ..Default::default()
    };
    let mut rows = Vec::new();

    for row in adp {
        let Some(value) = row.adp else {
            summary.malformed += 1;
            continue;
        };
        match resolver.resolve(&row.clean_name).player_id() {
            Some(id) => {
                summary.resolved += 1;
                rows.push((id.to_string(), value));
            }
            None => {
                debug!("No roster match for ADP row {}", row.clean_name);
                summary.unresolved += 1;
            }
        }
    }

    (rows, summary)
}

/// Link a headline to the player whose full clean name it contains,
/// preferring the longest such name
fn link_news(item: &NewsItem, players: &[Player]) -> Option<String> {
    players
        .iter()
        .filter(|p| !p.clean_name.is_empty() && item.headline.contains(&p.clean_name))
        .fold(None::<&Player>, |best, p| match best {
            Some(b) if b.clean_name.len() >= p.clean_name.len() => Some(b),
            _ => Some(p),
        })
        .map(|p| p.player_id.clone())
}

/// Run the full ingestion pipeline: roster, consensus ranks with tiers,
/// both ADP sources, then news and injury risk.
///
/// Roster, consensus and primary ADP are required; a failure there aborts
/// with `DraftError::Upstream`. The best-ball ADP and news sources are
/// optional and are skipped with a warning. Callers must not run two
/// refreshes at once.
pub async fn refresh_all(db: &Database, feed: &dyn DataFeed) -> Result<RefreshSummary, DraftError> {
    info!("Refreshing player data");
    let mut degraded_sources = Vec::new();

    let roster = feed
        .fetch_roster()
        .await
        .context("Failed to fetch roster")
        .map_err(DraftError::Upstream)?;
    let roster_rows = db.upsert_players(&roster)?;
    info!("Upserted {} roster players", roster_rows);

    let consensus = feed
        .fetch_consensus()
        .await
        .context("Failed to fetch consensus ranks")
        .map_err(DraftError::Upstream)?;
    let primary_adp = feed
        .fetch_primary_adp()
        .await
        .context("Failed to fetch half-PPR ADP")
        .map_err(DraftError::Upstream)?;
    let secondary_adp = match feed.fetch_secondary_adp().await {
        Ok(rows) => Some(rows),
        Err(e) => {
            warn!("Skipping best-ball ADP: {:#}", e);
            degraded_sources.push(SECONDARY_ADP_SOURCE.to_string());
            None
        }
    };

    let players = db.all_players()?;
    let resolver = IdentityResolver::new(&players);

    let (rank_rows, consensus_summary) = resolve_ranks(&resolver, &consensus);
    db.upsert_consensus_ranks(CONSENSUS_SOURCE, &rank_rows)?;
    info!(
        "Consensus ranks: {} resolved, {} unresolved, {} malformed",
        consensus_summary.resolved, consensus_summary.unresolved, consensus_summary.malformed
    );

    let (adp_rows, primary_summary) = resolve_adp(&resolver, &primary_adp);
    db.upsert_adp(PRIMARY_ADP_SOURCE, &adp_rows)?;
    info!(
        "Half-PPR ADP: {} resolved, {} unresolved, {} malformed",
        primary_summary.resolved, primary_summary.unresolved, primary_summary.malformed
    );

    let secondary_summary = match secondary_adp {
        Some(rows) => {
            let (adp_rows, summary) = resolve_adp(&resolver, &rows);
            db.upsert_adp(SECONDARY_ADP_SOURCE, &adp_rows)?;
            Some(summary)
        }
        None => None,
    };

    let (news_items, injuries_scored) = match feed.fetch_news().await {
        Ok(items) => {
            let linked: Vec<(NewsItem, Option<String>)> = items
                .iter()
                .map(|item| (item.clone(), link_news(item, &players)))
                .collect();
            db.replace_news(&linked)?;

            let risks: Vec<(String, f64)> = players
                .iter()
                .map(|p| (p.player_id.clone(), injury_risk(&p.clean_name, &items)))
                .collect();
            db.upsert_injuries(NEWS_SOURCE, &risks)?;
            (items.len(), risks.len())
        }
        Err(e) => {
            warn!("Skipping news and injury scoring: {:#}", e);
            degraded_sources.push(NEWS_SOURCE.to_string());
            (0, 0)
        }
    };

    let refreshed_at = Utc::now();
    db.set_last_refresh(refreshed_at)?;
    let players = db.player_count()?;
    info!("Refresh complete, {} players known", players);

    Ok(RefreshSummary {
        ok: true,
        players,
        roster_rows,
        consensus: consensus_summary,
        primary_adp: primary_summary,
        secondary_adp: secondary_summary,
        news_items,
        injuries_scored,
        degraded_sources,
        refreshed_at,
    })
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use utils::blend::BlendWeights;
    use utils::suggestions::top_suggestions;

    fn test_db() -> Database {
        let db = Database::open(":memory:").unwrap();
        db.seed_team_slots(12).unwrap();
        db
    }

    #[tokio::test]
    async fn test_refresh_then_suggest() {
        let db = test_db();
        let summary = refresh_all(&db, &three_player_feed()).await.unwrap();

        assert_eq!(summary.players, 3);
        assert_eq!(summary.consensus.resolved, 2);
        assert_eq!(summary.consensus.unresolved, 1);

        let board = db.load_board(None).unwrap();
        let suggestions = top_suggestions(&board, &BlendWeights::default(), 3, 10);
        let ids: Vec<&str> = suggestions.top.iter().map(|p| p.player_id.as_str()).collect();
        assert_eq!(ids, vec!["7564", "4984", "5189"]);
        assert_eq!(suggestions.top[2].blended_rank, None);
    }

    #[tokio::test]
    async fn test_unranked_consensus_row_counts_as_malformed() {
        let db = test_db();
        let mut feed = three_player_feed();
        feed.consensus.push(ScrapedRank {
            clean_name: "Justin Tucker".to_string(),
            ecr_rank: None,
        });

        let summary = refresh_all(&db, &feed).await.unwrap();
        assert_eq!(
            summary.consensus,
            SourceSummary {
                fetched: 4,
                resolved: 2,
                unresolved: 1,
                malformed: 1,
            }
        );
        let board = db.load_board(None).unwrap();
        let tucker = board.iter().find(|e| e.player.player_id == "5189").unwrap();
        assert_eq!(tucker.ecr_rank, None);
    }

    #[tokio::test]
    async fn test_tiers_assigned_on_ingest() {
        let db = test_db();
        refresh_all(&db, &three_player_feed()).await.unwrap();

        let board = db.load_board(None).unwrap();
        let tier_of = |id: &str| board.iter().find(|e| e.player.player_id == id).unwrap().tier;
        assert_eq!(tier_of("7564"), Some(1));
        // gap of 11 from rank 1
        assert_eq!(tier_of("4984"), Some(2));
        assert_eq!(tier_of("5189"), None);
    }

    #[tokio::test]
    async fn test_optional_sources_degrade() {
        let db = test_db();
        let summary = refresh_all(&db, &three_player_feed()).await.unwrap();

        assert_eq!(
            summary.degraded_sources,
            vec![SECONDARY_ADP_SOURCE.to_string(), NEWS_SOURCE.to_string()]
        );
        assert!(summary.secondary_adp.is_none());
        assert_eq!(summary.injuries_scored, 0);
        assert!(db.last_refresh().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_required_source_failure_aborts() {
        let db = test_db();
        let mut feed = three_player_feed();
        feed.fail_consensus = true;

        let err = refresh_all(&db, &feed).await.unwrap_err();
        assert!(matches!(err, DraftError::Upstream(_)));
        assert!(db.last_refresh().unwrap().is_none());
        assert!(db.load_board(None).unwrap().iter().all(|e| e.ecr_rank.is_none()));
    }

    #[tokio::test]
    async fn test_adp_resolution_counts() {
        let db = test_db();
        let mut feed = three_player_feed();
        feed.primary_adp = vec![
            adp("JaMarr Chase", Some(1.4)),
            adp("Josh Allen", None),
            adp("Nobody Here", Some(50.0)),
        ];
        feed.secondary_adp = Some(vec![adp("Josh Allen", Some(20.0))]);

        let summary = refresh_all(&db, &feed).await.unwrap();
        assert_eq!(
            summary.primary_adp,
            SourceSummary {
                fetched: 3,
                resolved: 1,
                unresolved: 1,
                malformed: 1,
            }
        );
        assert_eq!(summary.secondary_adp.unwrap().resolved, 1);

        let board = db.load_board(None).unwrap();
        let chase = board.iter().find(|e| e.player.player_id == "7564").unwrap();
        assert_eq!(chase.primary_adp, Some(1.4));
        let allen = board.iter().find(|e| e.player.player_id == "4984").unwrap();
        assert_eq!(allen.primary_adp, None);
        assert_eq!(allen.secondary_adp, Some(20.0));
    }

    #[tokio::test]
    async fn test_news_scores_injuries_and_links_players() {
        let db = test_db();
        let mut feed = three_player_feed();
        feed.news = Some(vec![NewsItem {
            headline: "Josh Allen questionable with ankle sprain".to_string(),
            url: "/fantasy/football/news/allen".to_string(),
            source: NEWS_SOURCE.to_string(),
        }]);

        let summary = refresh_all(&db, &feed).await.unwrap();
        assert_eq!(summary.news_items, 1);
        assert_eq!(summary.injuries_scored, 3);
        assert_eq!(summary.degraded_sources, vec![SECONDARY_ADP_SOURCE.to_string()]);

        let board = db.load_board(None).unwrap();
        let risk_of = |id: &str| {
            board
                .iter()
                .find(|e| e.player.player_id == id)
                .unwrap()
                .injury_risk
        };
        let allen_risk = risk_of("4984").unwrap();
        assert!((allen_risk - 0.4).abs() < 1e-9);
        assert_eq!(risk_of("5189"), Some(0.2));
    }

    #[tokio::test]
    async fn test_refresh_is_repeatable() {
        let db = test_db();
        let feed = three_player_feed();
        refresh_all(&db, &feed).await.unwrap();
        let summary = refresh_all(&db, &feed).await.unwrap();
        assert_eq!(summary.players, 3);
        assert_eq!(db.load_board(None).unwrap().len(), 3);
    }

    #[test]
    fn test_link_news_prefers_longest_name() {
        let players = vec![
            player("1", "Mike Williams", Position::WR),
            player("2", "Mike Williams Jr.", Position::WR),
        ];
        let item = NewsItem {
            headline: "Mike Williams Jr. signs".to_string(),
            url: String::new(),
            source: NEWS_SOURCE.to_string(),
        };
        assert_eq!(link_news(&item, &players), Some("2".to_string()));
    }
}
