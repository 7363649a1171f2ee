use crate::models::BoardEntry;
use serde::{Deserialize, Serialize};

/// Per-input weights for the blended rank. A zero weight disables that input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendWeights {
    pub consensus: f64,
    pub primary_adp: f64,
    pub secondary_adp: f64,
}

impl BlendWeights {
    /// Historical two-knob form: the primary source weight is split evenly
    /// between its consensus rank and its ADP.
    pub fn from_source_weights(primary: f64, secondary: f64) -> Self {
        Self {
            consensus: primary * 0.5,
            primary_adp: primary * 0.5,
            secondary_adp: secondary,
        }
    }
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self::from_source_weights(0.8, 0.2)
    }
}

/// Raw values feeding the blend. All are "lower is better"; no unit
/// conversion is applied between ordinal ranks and ADP.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BlendInputs {
    pub ecr_rank: Option<f64>,
    pub primary_adp: Option<f64>,
    pub secondary_adp: Option<f64>,
}

impl From<&BoardEntry> for BlendInputs {
    fn from(entry: &BoardEntry) -> Self {
        Self {
            ecr_rank: entry.ecr_rank.map(f64::from),
            primary_adp: entry.primary_adp,
            secondary_adp: entry.secondary_adp,
        }
    }
}

/// Weighted average of every present input whose weight is positive.
/// Falls back to the raw consensus rank when nothing qualifies.
pub fn blended_rank(inputs: &BlendInputs, weights: &BlendWeights) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = [
        (inputs.ecr_rank, weights.consensus),
        (inputs.primary_adp, weights.primary_adp),
        (inputs.secondary_adp, weights.secondary_adp),
    ]
    .into_iter()
    .filter_map(|(value, weight)| value.filter(|_| weight > 0.0).map(|v| (v, weight)))
    .collect();

    if pairs.is_empty() {
        return inputs.ecr_rank;
    }

    let num: f64 = pairs.iter().map(|(v, w)| v * w).sum();
    let den: f64 = pairs.iter().map(|(_, w)| w).sum();

    if den > 0.0 {
        Some(num / den)
    } else {
        None
    }
}
