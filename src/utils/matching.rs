use crate::models::Player;
use std::collections::HashMap;

/// Minimum similarity (0-100) for an approximate match to be accepted
pub const DEFAULT_SIMILARITY_FLOOR: f64 = 85.0;

/// Similarity on a 0-100 scale
pub type Scorer = fn(&str, &str) -> f64;

/// Indel ratio scaled to 0-100: `2 * LCS / (len_a + len_b)`. A trailing
/// suffix such as "Jr." or "III" costs only its own length, so
/// "Kenneth Walker" vs "Kenneth Walker III" scores 87.5.
pub fn indel_similarity(a: &str, b: &str) -> f64 {
    rapidfuzz::fuzz::ratio(a.chars(), b.chars()) * 100.0
}

/// Outcome of resolving one external name
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Exact(String),
    Approximate { player_id: String, score: f64 },
    Unresolved,
}

impl Resolution {
    pub fn player_id(&self) -> Option<&str> {
        match self {
            Resolution::Exact(id) => Some(id),
            Resolution::Approximate { player_id, .. } => Some(player_id),
            Resolution::Unresolved => None,
        }
    }
}

/// Maps clean names from external sources onto roster player ids.
///
/// Exact lookup always wins. Otherwise every known name is scored and the
/// best one is accepted if it reaches the floor. Known names are scanned in
/// ascending lexical order and only a strictly higher score replaces the
/// current best, so ties go to the lexically smallest name.
pub struct IdentityResolver {
    by_name: HashMap<String, String>,
    names: Vec<String>,
    scorer: Scorer,
}

impl IdentityResolver {
    /// When two players share a clean name the one with the greater id wins.
    pub fn new<'a>(players: impl IntoIterator<Item = &'a Player>) -> Self {
        let mut pairs: Vec<(&str, &str)> = players
            .into_iter()
            .map(|p| (p.clean_name.as_str(), p.player_id.as_str()))
            .collect();
        pairs.sort_by(|a, b| a.1.cmp(b.1));

        Self::from_pairs(pairs)
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let by_name: HashMap<String, String> = pairs
            .into_iter()
            .map(|(name, id)| (name.to_string(), id.to_string()))
            .collect();
        let mut names: Vec<String> = by_name.keys().cloned().collect();
        names.sort();

        Self {
            by_name,
            names,
            scorer: indel_similarity,
        }
    }

    pub fn with_scorer(mut self, scorer: Scorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn resolve(&self, clean_name: &str) -> Resolution {
        let clean_name = clean_name.trim();
        if let Some(id) = self.by_name.get(clean_name) {
            return Resolution::Exact(id.clone());
        }

        let mut best: Option<(&str, f64)> = None;
        for candidate in &self.names {
            let score = (self.scorer)(clean_name, candidate);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((candidate, score));
            }
        }

        match best {
            Some((name, score)) if score >= DEFAULT_SIMILARITY_FLOOR => Resolution::Approximate {
                player_id: self.by_name[name].clone(),
                score,
            },
            _ => Resolution::Unresolved,
        }
    }
}
