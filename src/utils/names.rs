/// Canonical join key for a player name scraped from any source.
///
/// "Justin Jefferson (MIN - WR, Bye 6)" -> "Justin Jefferson"
///
/// Parenthetical annotations are dropped along with the whitespace in front
/// of them, then everything except ASCII letters, hyphens, periods,
/// apostrophes and spaces is removed. Case is left alone, so two sources that
/// disagree on capitalisation will not produce the same key.
pub fn clean_name(raw: &str) -> String {
    let mut without_parens = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(open) = rest.find('(') {
        match rest[open..].find(')') {
            Some(close) => {
                without_parens.push_str(rest[..open].trim_end());
                rest = &rest[open + close + 1..];
            }
            None => break,
        }
    }
    without_parens.push_str(rest);

    without_parens
        .chars()
        .filter(|c| c.is_ascii_alphabetic() || matches!(c, '-' | '.' | '\'' | ' '))
        .collect::<String>()
        .trim()
        .to_string()
}

/// First whitespace-delimited token of a clean name, lowercased
pub fn first_name_token(clean_name: &str) -> Option<String> {
    clean_name
        .split_whitespace()
        .next()
        .map(|token| token.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_name_strips_team_and_bye() {
        assert_eq!(
            clean_name("Justin Jefferson (MIN - WR, Bye 6)"),
            "Justin Jefferson"
        );
        assert_eq!(clean_name("Ja'Marr Chase (CIN)"), "Ja'Marr Chase");
    }

    #[test]
    fn test_clean_name_is_idempotent() {
        for raw in [
            "Amon-Ra St. Brown (DET - WR, Bye 8)",
            "D'Andre Swift",
            "  Kenneth Walker III  ",
            "Travis Etienne Jr. (JAC)",
        ] {
            let once = clean_name(raw);
            assert_eq!(clean_name(&once), once);
        }
    }

    #[test]
    fn test_clean_name_removes_every_parenthetical() {
        assert_eq!(clean_name("Joe (x) Burrow (CIN)"), "Joe Burrow");
        assert!(!clean_name("Saquon Barkley (PHI) (Q)").contains('('));
    }

    #[test]
    fn test_clean_name_drops_digits_and_symbols() {
        assert_eq!(clean_name("Marvin Harrison Jr.*"), "Marvin Harrison Jr.");
        assert_eq!(clean_name("1. Bijan Robinson"), ". Bijan Robinson");
        assert_eq!(clean_name("Tyreek Hill\tMIA"), "Tyreek HillMIA");
    }

    #[test]
    fn test_clean_name_keeps_case() {
        assert_ne!(clean_name("CeeDee Lamb"), clean_name("Ceedee Lamb"));
    }

    #[test]
    fn test_unclosed_paren_is_kept_as_text() {
        assert_eq!(clean_name("Josh Allen (BUF"), "Josh Allen BUF");
    }

    #[test]
    fn test_first_name_token() {
        assert_eq!(first_name_token("Josh Allen"), Some("josh".to_string()));
        assert_eq!(first_name_token("   "), None);
    }
}
