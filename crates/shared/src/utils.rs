//! Small value-conversion and title-matching helpers shared by talkers.

use strsim::normalized_levenshtein;

/// Reduce a title to a comparable form: case-folded, punctuation stripped,
/// tokens sorted so word order does not affect the score.
fn clean_title(title: &str) -> String {
    let lowered = title.to_lowercase();
    let mut tokens: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Similarity of two titles on a 0-100 scale
pub fn title_ratio(a: &str, b: &str) -> u32 {
    let a = clean_title(a);
    let b = clean_title(b);
    if a.is_empty() && b.is_empty() {
        return 100;
    }
    (normalized_levenshtein(&a, &b) * 100.0).round() as u32
}

/// Whether two titles are similar enough to be considered the same series
pub fn titles_match(search_title: &str, record_title: &str, threshold: u32) -> bool {
    let ratio = title_ratio(search_title, record_title);
    tracing::debug!(search_title, record_title, ratio, threshold, "Title match");
    ratio >= threshold
}

/// Parse a count out of a provider value that may be a bare number or have
/// trailing text ("12", "12 volumes"). Returns None for anything else.
pub fn xlate_int(value: Option<&str>) -> Option<u32> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    let digits: String = value.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_titles() {
        assert_eq!(title_ratio("Naruto", "Naruto"), 100);
        assert!(titles_match("Naruto", "naruto", 90));
    }

    #[test]
    fn test_word_order_is_ignored() {
        assert_eq!(title_ratio("Attack on Titan", "Titan on Attack"), 100);
    }

    #[test]
    fn test_punctuation_is_ignored() {
        assert_eq!(title_ratio("Dr. Stone", "Dr Stone"), 100);
    }

    #[test]
    fn test_different_titles_fall_below_threshold() {
        assert!(!titles_match("Naruto", "One Piece", 90));
        assert!(!titles_match("Naruto", "Boruto: Naruto Next Generations", 90));
    }

    #[test]
    fn test_close_titles_stay_above_threshold() {
        assert!(titles_match("Fullmetal Alchemist", "Full Metal Alchemist", 90));
    }

    #[test]
    fn test_empty_titles() {
        assert_eq!(title_ratio("", ""), 100);
        assert_eq!(title_ratio("Naruto", ""), 0);
    }

    #[test]
    fn test_xlate_int() {
        assert_eq!(xlate_int(Some("12")), Some(12));
        assert_eq!(xlate_int(Some(" 108 ")), Some(108));
        assert_eq!(xlate_int(Some("12 volumes")), Some(12));
        assert_eq!(xlate_int(Some("ongoing")), None);
        assert_eq!(xlate_int(Some("")), None);
        assert_eq!(xlate_int(None), None);
    }
}
