use crate::models::{ScrapedRank, TieredRank};

/// Rank gap that starts a new tier
pub const TIER_GAP: u32 = 8;

/// Split a rank list into tiers with a simple elbow rule: walk the ranks in
/// ascending order and open a new tier whenever the step from the previous
/// rank is larger than `gap`. This is a heuristic, not a fitted breakpoint.
///
/// Input order does not matter; output is sorted by rank (stable for equal
/// ranks). Rows without a rank are left out, every ranked row gets exactly
/// one tier.
pub fn assign_tiers(ranks: &[ScrapedRank], gap: u32) -> Vec<TieredRank> {
    let mut sorted: Vec<(&str, u32)> = ranks
        .iter()
        .filter_map(|r| Some((r.clean_name.as_str(), r.ecr_rank?)))
        .collect();
    sorted.sort_by_key(|&(_, rank)| rank);

    let mut tier = 1;
    let mut prev: Option<u32> = None;

    sorted
        .into_iter()
        .map(|(clean_name, ecr_rank)| {
            if let Some(p) = prev {
                if ecr_rank.saturating_sub(p) > gap {
                    tier += 1;
                }
            }
            prev = Some(ecr_rank);

            TieredRank {
                clean_name: clean_name.to_string(),
                ecr_rank,
                tier,
            }
        })
        .collect()
}
