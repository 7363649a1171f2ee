use crate::models::NewsItem;
use crate::utils::names::first_name_token;

/// Risk score for a player with no matching news
pub const BASE_RISK: f64 = 0.2;
const RISK_PER_KEYWORD: f64 = 0.1;

pub const INJURY_KEYWORDS: [&str; 15] = [
    "hamstring",
    "knee",
    "ankle",
    "concussion",
    "groin",
    "back",
    "shoulder",
    "wrist",
    "questionable",
    "doubtful",
    "limited",
    "did not practice",
    "dnp",
    "mri",
    "out for",
];

/// Keyword-based risk proxy in [0, 1]. Each distinct keyword found anywhere
/// in the headlines adds 0.1 on top of the base.
pub fn score_injury_risk(items: &[&NewsItem]) -> f64 {
    if items.is_empty() {
        return BASE_RISK;
    }

    let text = items
        .iter()
        .map(|item| item.headline.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let hits = INJURY_KEYWORDS.iter().filter(|k| text.contains(*k)).count();

    (BASE_RISK + RISK_PER_KEYWORD * hits as f64).min(1.0)
}

/// Headlines that mention the player's first name. This is a loose
/// substring test and will over-match common first names.
pub fn matching_news<'a>(clean_name: &str, items: &'a [NewsItem]) -> Vec<&'a NewsItem> {
    let Some(first) = first_name_token(clean_name) else {
        return Vec::new();
    };

    items
        .iter()
        .filter(|item| item.headline.to_lowercase().contains(&first))
        .collect()
}

pub fn injury_risk(clean_name: &str, items: &[NewsItem]) -> f64 {
    score_injury_risk(&matching_news(clean_name, items))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn news(headlines: &[&str]) -> Vec<NewsItem> {
        headlines
            .iter()
            .map(|h| NewsItem {
                headline: h.to_string(),
                url: "https://example.com/fantasy/football/x".to_string(),
                source: "test".to_string(),
            })
            .collect()
    }

    #[test]
    fn test_no_matching_news_is_base_risk() {
        let items = news(&["Bijan Robinson limited at practice"]);
        assert_eq!(injury_risk("Josh Allen", &items), BASE_RISK);
        assert_eq!(injury_risk("Josh Allen", &[]), BASE_RISK);
    }

    #[test]
    fn test_keyword_hits_add_risk() {
        let items = news(&["Christian McCaffrey (calf) listed as questionable, MRI pending"]);
        let risk = injury_risk("Christian McCaffrey", &items);
        // questionable + mri
        assert!((risk - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_uppercase_abbreviations_match() {
        let items = news(&["Garrett Wilson DNP Wednesday"]);
        assert!((injury_risk("Garrett Wilson", &items) - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_repeated_keyword_counts_once() {
        let items = news(&["Knee issue for Tyreek", "Tyreek knee update"]);
        assert!((injury_risk("Tyreek Hill", &items) - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_risk_is_capped() {
        let items = news(&[
            "Cooper hamstring knee ankle concussion groin back shoulder wrist questionable doubtful",
        ]);
        assert_eq!(injury_risk("Cooper Kupp", &items), 1.0);
    }

    #[test]
    fn test_first_name_matching_over_matches() {
        let items = news(&["Josh Jacobs out for the week"]);
        assert!(injury_risk("Josh Allen", &items) > BASE_RISK);
    }

    #[test]
    fn test_empty_name_matches_nothing() {
        let items = news(&["Ankle sprain"]);
        assert!(matching_news("", &items).is_empty());
    }
}
