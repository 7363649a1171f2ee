use crate::models::{BoardEntry, PlayerView, Position};
use crate::utils::blend::{blended_rank, BlendInputs, BlendWeights};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Blended rank used for players with no ranking data at all
pub const MISSING_RANK: f64 = 999.0;
/// Sort key used by the player list for absent ranks
const LIST_MISSING_RANK: f64 = 9999.0;

/// Fixed bias per position. Negative values pull a position earlier to
/// reflect thinner depth.
pub fn scarcity_offset(position: Position) -> f64 {
    match position {
        Position::RB => -2.0,
        Position::WR => -1.0,
        Position::TE => -0.5,
        Position::K | Position::DEF => 0.5,
        Position::QB => 0.0,
    }
}

/// Lower is better
pub fn priority_score(blended: Option<f64>, position: Position) -> f64 {
    blended.unwrap_or(MISSING_RANK) + scarcity_offset(position)
}

pub fn player_view(entry: &BoardEntry, weights: &BlendWeights) -> PlayerView {
    let player = &entry.player;
    PlayerView {
        player_id: player.player_id.clone(),
        clean_name: player.clean_name.clone(),
        position: player.position,
        team: player.team.clone(),
        bye_week: player.bye_week,
        tier: entry.tier,
        ecr_rank: entry.ecr_rank,
        blended_rank: blended_rank(&BlendInputs::from(entry), weights),
        adp: entry.primary_adp,
        injury_risk: entry.injury_risk,
        picked: entry.picked,
    }
}

/// Board sorted by blended rank, then consensus rank, absent values last
pub fn rank_players(entries: &[BoardEntry], weights: &BlendWeights) -> Vec<PlayerView> {
    let mut views: Vec<PlayerView> = entries.iter().map(|e| player_view(e, weights)).collect();
    views.sort_by(|a, b| {
        let key = |v: &PlayerView| {
            (
                v.blended_rank.unwrap_or(LIST_MISSING_RANK),
                v.ecr_rank.map(f64::from).unwrap_or(LIST_MISSING_RANK),
            )
        };
        let (a_blend, a_ecr) = key(a);
        let (b_blend, b_ecr) = key(b);
        a_blend
            .total_cmp(&b_blend)
            .then_with(|| a_ecr.total_cmp(&b_ecr))
    });
    views
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestions {
    pub top: Vec<PlayerView>,
    pub next: Vec<PlayerView>,
}

/// Order the whole board by priority score (stable, so equal scores keep
/// board order) and expose the first `limit_top` players plus the following
/// `limit_next`.
pub fn top_suggestions(
    entries: &[BoardEntry],
    weights: &BlendWeights,
    limit_top: usize,
    limit_next: usize,
) -> Suggestions {
    let mut scored: Vec<(f64, PlayerView)> = entries
        .iter()
        .map(|entry| {
            let view = player_view(entry, weights);
            (priority_score(view.blended_rank, view.position), view)
        })
        .collect();
    scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

    let mut ranked = scored.into_iter().map(|(_, view)| view);
    let top: Vec<PlayerView> = ranked.by_ref().take(limit_top).collect();
    let next: Vec<PlayerView> = ranked.take(limit_next).collect();

    Suggestions { top, next }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Player;

    fn entry(id: &str, position: Position, ecr: Option<u32>) -> BoardEntry {
        BoardEntry {
            player: Player {
                player_id: id.to_string(),
                clean_name: format!("Player {}", id),
                position,
                team: "FA".to_string(),
                bye_week: None,
            },
            ecr_rank: ecr,
            tier: ecr.map(|_| 1),
            primary_adp: None,
            secondary_adp: None,
            injury_risk: None,
            picked: false,
        }
    }

    #[test]
    fn test_priority_score_applies_scarcity() {
        assert_eq!(priority_score(Some(50.0), Position::RB), 48.0);
        assert_eq!(priority_score(Some(50.0), Position::QB), 50.0);
        assert_eq!(priority_score(None, Position::K), 999.5);
    }

    #[test]
    fn test_scarcer_position_sorts_first_on_tie() {
        let entries = vec![
            entry("1", Position::QB, Some(20)),
            entry("2", Position::WR, Some(20)),
            entry("3", Position::RB, Some(20)),
        ];
        let suggestions = top_suggestions(&entries, &BlendWeights::default(), 3, 10);
        let ids: Vec<&str> = suggestions.top.iter().map(|p| p.player_id.as_str()).collect();
        assert_eq!(ids, vec!["3", "2", "1"]);
        assert!(suggestions.next.is_empty());
    }

    #[test]
    fn test_top_and_next_windows() {
        let entries: Vec<BoardEntry> = (1..=20)
            .map(|i| entry(&i.to_string(), Position::QB, Some(i)))
            .collect();
        let suggestions = top_suggestions(&entries, &BlendWeights::default(), 3, 10);
        assert_eq!(suggestions.top.len(), 3);
        assert_eq!(suggestions.next.len(), 10);
        assert_eq!(suggestions.top[0].player_id, "1");
        assert_eq!(suggestions.next[0].player_id, "4");
        assert_eq!(suggestions.next[9].player_id, "13");
    }

    #[test]
    fn test_equal_scores_keep_board_order() {
        let entries = vec![
            entry("b", Position::QB, None),
            entry("a", Position::QB, None),
        ];
        let suggestions = top_suggestions(&entries, &BlendWeights::default(), 3, 10);
        let ids: Vec<&str> = suggestions.top.iter().map(|p| p.player_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_rank_players_puts_unranked_last() {
        let entries = vec![
            entry("none", Position::RB, None),
            entry("ten", Position::QB, Some(10)),
            entry("two", Position::TE, Some(2)),
        ];
        let views = rank_players(&entries, &BlendWeights::default());
        let ids: Vec<&str> = views.iter().map(|p| p.player_id.as_str()).collect();
        assert_eq!(ids, vec!["two", "ten", "none"]);
        assert_eq!(views[2].blended_rank, None);
    }

    #[test]
    fn test_player_view_reports_primary_adp() {
        let mut e = entry("1", Position::WR, Some(10));
        e.primary_adp = Some(12.0);
        e.secondary_adp = Some(20.0);
        let view = player_view(&e, &BlendWeights::default());
        assert_eq!(view.adp, Some(12.0));
        assert!((view.blended_rank.unwrap() - 12.8).abs() < 1e-9);
    }
}
