//! URL extraction and per-URL heuristic analysis.
//!
//! Extraction is a pure regex pass; the analyzer evaluates six suspicion
//! tests per URL. Host-based tests require the URL to parse; a URL that
//! does not parse skips them but still counts toward the URL-count signal.

use regex::Regex;
use url::Url;

use crate::error::Result;

/// Score for a link-shortener domain.
pub const SHORTENER_WEIGHT: f64 = 0.25;

/// Score for an IPv4-shaped address in place of a domain name.
pub const IP_ADDRESS_WEIGHT: f64 = 0.30;

/// Score for a plain-HTTP scheme.
pub const INSECURE_HTTP_WEIGHT: f64 = 0.15;

/// Score for a suspicious top-level domain.
pub const SUSPICIOUS_TLD_WEIGHT: f64 = 0.20;

/// Score for 3+ hyphens in the host.
pub const HYPHENS_WEIGHT: f64 = 0.15;

/// Score for consecutive digits in the host.
pub const HOST_DIGITS_WEIGHT: f64 = 0.10;

/// Result of analyzing a single URL.
#[derive(Debug, Clone, PartialEq)]
pub struct UrlAnalysis {
    /// The URL as extracted from the text.
    pub url: String,
    /// Triggered reasons, in check order. Empty for clean URLs.
    pub reasons: Vec<String>,
    /// Summed risk contribution for this URL (uncapped).
    pub score: f64,
}

impl UrlAnalysis {
    /// Whether any suspicion test fired.
    pub fn is_suspicious(&self) -> bool {
        !self.reasons.is_empty()
    }
}

/// Extractor and per-URL analyzer with pre-compiled patterns.
pub struct UrlAnalyzer {
    extract: Regex,
    shortener: Regex,
    ipv4: Regex,
    suspicious_tld: Regex,
    consecutive_digits: Regex,
}

impl UrlAnalyzer {
    /// Compile the fixed URL patterns.
    pub fn new() -> Result<Self> {
        Ok(Self {
            extract: Regex::new(r"(?i)https?://[^\s]+")?,
            shortener: Regex::new(r"(?i)bit\.ly|tinyurl|goo\.gl|t\.co|ow\.ly|is\.gd")?,
            ipv4: Regex::new(r"[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}")?,
            suspicious_tld: Regex::new(r"(?i)\.(xyz|top|work|click|link|club|online)$")?,
            consecutive_digits: Regex::new(r"[0-9]{2,}")?,
        })
    }

    /// Extract all `http://` / `https://` substrings up to the next
    /// whitespace, in text order. Duplicates are preserved.
    pub fn extract_urls(&self, text: &str) -> Vec<String> {
        self.extract
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Evaluate the six suspicion tests against one URL.
    pub fn analyze(&self, url: &str) -> UrlAnalysis {
        let mut reasons = Vec::new();
        let mut score = 0.0;

        if self.shortener.is_match(url) {
            reasons.push("Shortened URL detected".to_string());
            score += SHORTENER_WEIGHT;
        }

        if self.ipv4.is_match(url) {
            reasons.push("IP address instead of domain name".to_string());
            score += IP_ADDRESS_WEIGHT;
        }

        if url.starts_with("http://") {
            reasons.push("Non-secure HTTP connection".to_string());
            score += INSECURE_HTTP_WEIGHT;
        }

        // Host-based checks; skipped when the URL does not parse
        if let Some(host) = Url::parse(url).ok().and_then(|u| u.host_str().map(String::from)) {
            if self.suspicious_tld.is_match(&host) {
                reasons.push("Suspicious top-level domain".to_string());
                score += SUSPICIOUS_TLD_WEIGHT;
            }

            if host.matches('-').count() >= 3 {
                reasons.push("Multiple hyphens in domain".to_string());
                score += HYPHENS_WEIGHT;
            }

            if self.consecutive_digits.is_match(&host) {
                reasons.push("Multiple numbers in domain".to_string());
                score += HOST_DIGITS_WEIGHT;
            }
        } else {
            tracing::debug!(url = %url, "URL failed to parse; skipping host checks");
        }

        UrlAnalysis {
            url: url.to_string(),
            reasons,
            score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> UrlAnalyzer {
        UrlAnalyzer::new().expect("fixed patterns should compile")
    }

    #[test]
    fn extract_none_from_empty() {
        assert!(analyzer().extract_urls("").is_empty());
    }

    #[test]
    fn extract_none_without_scheme() {
        assert!(analyzer().extract_urls("visit example.com today").is_empty());
    }

    #[test]
    fn extract_multiple_in_text_order() {
        let urls = analyzer()
            .extract_urls("first https://a.example/x then http://b.example/y done");
        assert_eq!(
            urls,
            vec!["https://a.example/x", "http://b.example/y"]
        );
    }

    #[test]
    fn extract_preserves_duplicates() {
        let urls = analyzer().extract_urls("http://a.example http://a.example");
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0], urls[1]);
    }

    #[test]
    fn extract_is_case_insensitive() {
        let urls = analyzer().extract_urls("go to HTTPS://Example.com/path now");
        assert_eq!(urls, vec!["HTTPS://Example.com/path"]);
    }

    #[test]
    fn extract_stops_at_whitespace() {
        let urls = analyzer().extract_urls("link http://a.example/path?q=1\nnext line");
        assert_eq!(urls, vec!["http://a.example/path?q=1"]);
    }

    #[test]
    fn clean_https_url_has_no_reasons() {
        let analysis = analyzer().analyze("https://example.com/account");
        assert!(analysis.reasons.is_empty());
        assert_eq!(analysis.score, 0.0);
        assert!(!analysis.is_suspicious());
    }

    #[test]
    fn shortener_detected() {
        let analysis = analyzer().analyze("https://bit.ly/3xyzabc");
        assert!(analysis
            .reasons
            .contains(&"Shortened URL detected".to_string()));
    }

    #[test]
    fn ip_address_host() {
        let analysis = analyzer().analyze("http://192.168.1.10/login");
        assert!(analysis
            .reasons
            .contains(&"IP address instead of domain name".to_string()));
        assert!(analysis
            .reasons
            .contains(&"Non-secure HTTP connection".to_string()));
    }

    #[test]
    fn insecure_http_prefix_is_case_sensitive() {
        // The extractor picks up uppercase schemes, but the non-secure
        // check matches the literal lowercase prefix only.
        let analysis = analyzer().analyze("HTTP://example.com/");
        assert!(!analysis
            .reasons
            .contains(&"Non-secure HTTP connection".to_string()));
    }

    #[test]
    fn suspicious_tld_on_host_with_path() {
        let analysis = analyzer().analyze("https://login-update.xyz/session");
        assert!(analysis
            .reasons
            .contains(&"Suspicious top-level domain".to_string()));
    }

    #[test]
    fn ordinary_tld_not_flagged() {
        let analysis = analyzer().analyze("https://example.com/online");
        assert!(!analysis
            .reasons
            .contains(&"Suspicious top-level domain".to_string()));
    }

    #[test]
    fn many_hyphens_in_host() {
        let analysis = analyzer().analyze("https://secure-bank-login-portal.example/");
        assert!(analysis
            .reasons
            .contains(&"Multiple hyphens in domain".to_string()));

        let two = analyzer().analyze("https://my-own-site.example/");
        assert!(!two
            .reasons
            .contains(&"Multiple hyphens in domain".to_string()));
    }

    #[test]
    fn consecutive_digits_in_host() {
        let analysis = analyzer().analyze("https://paypal99.example/");
        assert!(analysis
            .reasons
            .contains(&"Multiple numbers in domain".to_string()));

        let single = analyzer().analyze("https://channel4.example/");
        assert!(!single
            .reasons
            .contains(&"Multiple numbers in domain".to_string()));
    }

    #[test]
    fn digits_in_path_do_not_count_as_host_digits() {
        let analysis = analyzer().analyze("https://example.com/order/123456");
        assert!(!analysis
            .reasons
            .contains(&"Multiple numbers in domain".to_string()));
    }

    #[test]
    fn unparseable_url_skips_host_checks() {
        // "http://" alone has no host and fails to parse; the scheme
        // check still applies.
        let analysis = analyzer().analyze("http://");
        assert_eq!(analysis.reasons, vec!["Non-secure HTTP connection"]);
        assert!((analysis.score - INSECURE_HTTP_WEIGHT).abs() < 1e-9);
    }

    #[test]
    fn stacked_reasons_sum() {
        let analysis = analyzer().analyze("http://1.2.3.4/login");
        assert_eq!(
            analysis.reasons,
            vec![
                "IP address instead of domain name",
                "Non-secure HTTP connection",
            ]
        );
        let expected = IP_ADDRESS_WEIGHT + INSECURE_HTTP_WEIGHT;
        assert!((analysis.score - expected).abs() < 1e-9);
    }

    #[test]
    fn reasons_follow_check_order() {
        let analysis = analyzer().analyze("http://bit.ly-login-52-portal.xyz/go");
        assert_eq!(
            analysis.reasons,
            vec![
                "Shortened URL detected",
                "Non-secure HTTP connection",
                "Suspicious top-level domain",
                "Multiple hyphens in domain",
                "Multiple numbers in domain",
            ]
        );
    }
}
