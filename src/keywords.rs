//! Keyword signal extractor.
//!
//! Case-insensitive substring scan against a fixed bilingual phrase list.
//! Pure computation, no side effects, no failure modes.

/// Score added per matched keyword.
pub const KEYWORD_WEIGHT: f64 = 0.12;

/// Cap on the keyword base score.
pub const KEYWORD_SCORE_CAP: f64 = 0.9;

/// Result of a keyword scan.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordSignal {
    /// Matched keywords, in list order (not text order).
    pub matches: Vec<String>,
    /// `min(0.9, matches * 0.12)`.
    pub base_score: f64,
}

impl KeywordSignal {
    /// A scan with no matches.
    pub fn empty() -> Self {
        Self {
            matches: Vec::new(),
            base_score: 0.0,
        }
    }
}

/// Scanner over an injected keyword list.
///
/// Keywords are lowercased once at construction; the input text is
/// lowercased once per scan.
pub struct KeywordScanner {
    keywords: Vec<String>,
}

impl KeywordScanner {
    /// Create a scanner for the given phrase list. List order is preserved
    /// in match output.
    pub fn new(keywords: &[String]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    /// Scan text for keyword substrings.
    pub fn scan(&self, text: &str) -> KeywordSignal {
        let haystack = text.to_lowercase();

        let matches: Vec<String> = self
            .keywords
            .iter()
            .filter(|k| haystack.contains(k.as_str()))
            .cloned()
            .collect();

        let base_score = KEYWORD_SCORE_CAP.min(matches.len() as f64 * KEYWORD_WEIGHT);

        KeywordSignal {
            matches,
            base_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectionConfig;

    fn default_scanner() -> KeywordScanner {
        KeywordScanner::new(&DetectionConfig::default().combined_keywords())
    }

    #[test]
    fn scan_empty_text() {
        let signal = default_scanner().scan("");
        assert!(signal.matches.is_empty());
        assert_eq!(signal.base_score, 0.0);
    }

    #[test]
    fn scan_clean_text() {
        let signal = default_scanner().scan("lunch at noon tomorrow?");
        assert!(signal.matches.is_empty());
        assert_eq!(signal.base_score, 0.0);
    }

    #[test]
    fn scan_is_case_insensitive() {
        let signal = default_scanner().scan("URGENT: please VERIFY your account");
        assert_eq!(signal.matches, vec!["urgent", "verify"]);
    }

    #[test]
    fn scan_matches_vietnamese_phrases() {
        let signal = default_scanner().scan("Ngân hàng yêu cầu chuyển khoản gấp");
        assert!(signal.matches.contains(&"chuyển khoản".to_string()));
        assert!(signal.matches.contains(&"ngân hàng".to_string()));
    }

    #[test]
    fn matches_follow_list_order_not_text_order() {
        // "urgent" precedes "otp" in the text, but "otp" comes first in the
        // combined list (Vietnamese section).
        let signal = default_scanner().scan("urgent: enter the otp code");
        assert_eq!(signal.matches, vec!["otp", "urgent"]);
    }

    #[test]
    fn single_match_score() {
        let signal = default_scanner().scan("please verify");
        assert_eq!(signal.matches.len(), 1);
        assert!((signal.base_score - 0.12).abs() < 1e-9);
    }

    #[test]
    fn eight_matches_clamp_to_cap() {
        let text =
            "urgent verify suspended confirm password winner prize congratulations";
        let signal = default_scanner().scan(text);

        assert_eq!(signal.matches.len(), 8);
        // 8 * 0.12 = 0.96, clamped to 0.9
        assert_eq!(signal.base_score, KEYWORD_SCORE_CAP);
    }

    #[test]
    fn keyword_matches_inside_longer_words() {
        // Substring semantics: "confirm" matches inside "confirmation".
        let signal = default_scanner().scan("awaiting confirmation");
        assert_eq!(signal.matches, vec!["confirm"]);
    }

    #[test]
    fn empty_keyword_list_never_matches() {
        let scanner = KeywordScanner::new(&[]);
        let signal = scanner.scan("urgent verify password");
        assert!(signal.matches.is_empty());
        assert_eq!(signal.base_score, 0.0);
    }
}
