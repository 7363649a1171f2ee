use crate::config::RosterRequirements;
use crate::models::Position;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// A starting-lineup slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RosterSlot {
    QB,
    RB,
    WR,
    TE,
    FLEX,
    K,
    DEF,
}

impl From<Position> for RosterSlot {
    fn from(position: Position) -> Self {
        match position {
            Position::QB => RosterSlot::QB,
            Position::RB => RosterSlot::RB,
            Position::WR => RosterSlot::WR,
            Position::TE => RosterSlot::TE,
            Position::K => RosterSlot::K,
            Position::DEF => RosterSlot::DEF,
        }
    }
}

/// Starting slots still open for a team given the positions it has drafted.
/// RB/WR/TE picks beyond their own requirement count toward FLEX.
pub fn team_needs(
    requirements: &RosterRequirements,
    drafted: &[Position],
) -> BTreeMap<RosterSlot, u32> {
    let mut counts: HashMap<Position, u32> = HashMap::new();
    for &position in drafted {
        *counts.entry(position).or_insert(0) += 1;
    }

    let mut needs = BTreeMap::new();
    let mut flex_surplus = 0;
    for position in Position::ALL {
        let required = requirements.required(position);
        let have = counts.get(&position).copied().unwrap_or(0);
        needs.insert(RosterSlot::from(position), required.saturating_sub(have));
        if position.is_flex_eligible() {
            flex_surplus += have.saturating_sub(required);
        }
    }
    needs.insert(RosterSlot::FLEX, requirements.flex.saturating_sub(flex_surplus));

    needs
}

/// For the teams picking next, how many still need each slot
pub fn predict_position_demand<'a>(
    team_needs: impl IntoIterator<Item = &'a BTreeMap<RosterSlot, u32>>,
) -> BTreeMap<RosterSlot, u32> {
    let mut demand = BTreeMap::new();
    for needs in team_needs {
        for (&slot, &open) in needs {
            if open > 0 {
                *demand.entry(slot).or_insert(0) += 1;
            }
        }
    }
    demand
}
