pub mod blend;
pub mod data;
pub mod injury;
pub mod matching;
pub mod names;
pub mod opponents;
pub mod suggestions;
pub mod tiers;
