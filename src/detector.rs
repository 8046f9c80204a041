//! Scam scoring engine.
//!
//! Runs the independent signal extractors, folds in the blocklist lookup,
//! and aggregates everything into one verdict with a human-readable
//! explanation. Aggregation itself is a pure function over a typed signal
//! bundle; the only suspending step is the blocklist round trip.

use std::sync::Arc;

use crate::blocklist::{KnownUrlSignal, KnownUrlStore};
use crate::config::{DetectionConfig, UrlAggregation};
use crate::database::Database;
use crate::error::Result;
use crate::keywords::{KeywordScanner, KeywordSignal};
use crate::metrics::MetricsCollector;
use crate::models::{AnalysisVerdict, Explanation, RiskLevel, SuspiciousUrl};
use crate::patterns::{PatternScanner, PatternSignal};
use crate::urls::{UrlAnalysis, UrlAnalyzer};

/// Raw-score threshold for a positive verdict. A blocklist match forces a
/// positive verdict regardless of the score.
pub const PHISHING_THRESHOLD: f64 = 0.5;

/// How many matched keywords the findings summary names before eliding.
const FINDING_KEYWORD_LIMIT: usize = 5;

/// All partial results feeding the aggregation step.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalBundle {
    pub keywords: KeywordSignal,
    pub patterns: PatternSignal,
    /// One analysis per extracted URL, duplicates included.
    pub url_analyses: Vec<UrlAnalysis>,
    pub lookup: KnownUrlSignal,
}

/// The scoring engine.
pub struct ScamDetector {
    keywords: KeywordScanner,
    patterns: PatternScanner,
    urls: UrlAnalyzer,
    store: KnownUrlStore,
    aggregation: UrlAggregation,
    metrics: Arc<MetricsCollector>,
}

impl ScamDetector {
    /// Build the engine from detection configuration.
    pub fn new(
        config: &DetectionConfig,
        db: Arc<Database>,
        metrics: Arc<MetricsCollector>,
    ) -> Result<Self> {
        Ok(Self {
            keywords: KeywordScanner::new(&config.combined_keywords()),
            patterns: PatternScanner::new()?,
            urls: UrlAnalyzer::new()?,
            store: KnownUrlStore::new(db, metrics.clone()),
            aggregation: config.url_aggregation,
            metrics,
        })
    }

    /// Analyze message content. Always returns a verdict; a failing
    /// blocklist store degrades that signal rather than aborting.
    pub async fn analyze(&self, content: &str) -> AnalysisVerdict {
        let extracted = self.urls.extract_urls(content);

        let bundle = SignalBundle {
            keywords: self.keywords.scan(content),
            patterns: self.patterns.scan(content, extracted.len()),
            url_analyses: extracted.iter().map(|url| self.urls.analyze(url)).collect(),
            lookup: self.store.check(&extracted).await,
        };

        let verdict = aggregate(&bundle, self.aggregation);
        self.metrics.record_analysis(&verdict);

        tracing::debug!(
            risk_score = verdict.risk_score,
            is_phishing = verdict.is_phishing,
            url_count = extracted.len(),
            known_matches = verdict.explanation.known_phishing_matches.len(),
            "Analysis complete"
        );

        verdict
    }
}

/// Fold a signal bundle into the final verdict. Pure and deterministic.
pub fn aggregate(bundle: &SignalBundle, aggregation: UrlAggregation) -> AnalysisVerdict {
    let url_contribution = fold_url_scores(&bundle.url_analyses, aggregation);

    let raw_score = (bundle.keywords.base_score
        + bundle.patterns.score
        + url_contribution
        + bundle.lookup.score)
        .clamp(0.0, 1.0);

    let is_phishing = raw_score >= PHISHING_THRESHOLD || !bundle.lookup.matches.is_empty();
    let risk_score = (raw_score * 100.0).round() as u8;

    let suspicious_urls: Vec<SuspiciousUrl> = bundle
        .url_analyses
        .iter()
        .filter(|analysis| analysis.is_suspicious())
        .map(|analysis| SuspiciousUrl {
            url: analysis.url.clone(),
            reasons: analysis.reasons.clone(),
        })
        .collect();

    let findings = assemble_findings(bundle);

    AnalysisVerdict {
        is_phishing,
        raw_score,
        risk_score,
        explanation: Explanation {
            keywords: bundle.keywords.matches.clone(),
            patterns: bundle.patterns.findings.clone(),
            suspicious_urls,
            known_phishing_matches: bundle.lookup.matches.clone(),
            findings,
            risk_score,
            recommendation: RiskLevel::from_risk_score(risk_score)
                .recommendation()
                .to_string(),
        },
    }
}

/// Fold per-URL scores into a single contribution.
///
/// The default `Average` dilutes one bad URL among several clean ones; kept
/// for verdict compatibility, with `Sum`/`Max` as configurable alternatives.
fn fold_url_scores(analyses: &[UrlAnalysis], aggregation: UrlAggregation) -> f64 {
    if analyses.is_empty() {
        return 0.0;
    }

    let total: f64 = analyses.iter().map(|a| a.score).sum();
    match aggregation {
        UrlAggregation::Average => total / analyses.len() as f64,
        UrlAggregation::Sum => total,
        UrlAggregation::Max => analyses.iter().map(|a| a.score).fold(0.0, f64::max),
    }
}

/// Assemble the flattened findings list: keyword summary, then pattern
/// findings, then the blocklist alert.
fn assemble_findings(bundle: &SignalBundle) -> Vec<String> {
    let mut findings = Vec::new();

    if !bundle.keywords.matches.is_empty() {
        let named: Vec<&str> = bundle
            .keywords
            .matches
            .iter()
            .take(FINDING_KEYWORD_LIMIT)
            .map(String::as_str)
            .collect();
        let ellipsis = if bundle.keywords.matches.len() > FINDING_KEYWORD_LIMIT {
            "..."
        } else {
            ""
        };
        findings.push(format!(
            "Found {} suspicious keyword(s): {}{}",
            bundle.keywords.matches.len(),
            named.join(", "),
            ellipsis
        ));
    }

    findings.extend(bundle.patterns.findings.iter().cloned());

    if !bundle.lookup.matches.is_empty() {
        findings.push(format!(
            "ALERT: {} URL(s) match known phishing database",
            bundle.lookup.matches.len()
        ));
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::KnownPhishingMatch;

    async fn detector() -> (ScamDetector, Arc<Database>) {
        let db = Arc::new(Database::in_memory().await.expect("db"));
        let metrics = Arc::new(MetricsCollector::new());
        let detector = ScamDetector::new(&DetectionConfig::default(), db.clone(), metrics)
            .expect("detector");
        (detector, db)
    }

    #[tokio::test]
    async fn empty_content_yields_zero_verdict() {
        let (detector, _db) = detector().await;
        let verdict = detector.analyze("").await;

        assert_eq!(verdict.raw_score, 0.0);
        assert_eq!(verdict.risk_score, 0);
        assert!(!verdict.is_phishing);
        assert!(verdict.explanation.keywords.is_empty());
        assert!(verdict.explanation.patterns.is_empty());
        assert!(verdict.explanation.suspicious_urls.is_empty());
        assert!(verdict.explanation.known_phishing_matches.is_empty());
        assert!(verdict.explanation.findings.is_empty());
        assert!(verdict
            .explanation
            .recommendation
            .starts_with("MINIMAL RISK:"));
    }

    #[tokio::test]
    async fn benign_content_scores_low() {
        let (detector, _db) = detector().await;
        let verdict = detector
            .analyze("Hi Lan, see you at the coffee shop tomorrow.")
            .await;

        assert!(!verdict.is_phishing);
        assert!(verdict.raw_score < PHISHING_THRESHOLD);
    }

    #[tokio::test]
    async fn stacked_signals_cross_threshold() {
        let (detector, _db) = detector().await;
        let verdict = detector
            .analyze("Click here urgent!! http://1.2.3.4/login")
            .await;

        // keywords: "click here" + "urgent" = 0.24
        // patterns: urgency 0.15 + 1 URL 0.10 + punctuation 0.08 = 0.33
        // url: non-secure 0.15 + IP host 0.30 = 0.45 (single URL average)
        assert!(verdict.is_phishing);
        assert_eq!(verdict.raw_score, 1.0);
        assert_eq!(verdict.risk_score, 100);

        assert!(verdict
            .explanation
            .patterns
            .contains(&"Urgency language detected".to_string()));
        assert!(verdict
            .explanation
            .patterns
            .contains(&"Contains 1 URL(s)".to_string()));
        assert!(verdict
            .explanation
            .patterns
            .contains(&"Excessive punctuation".to_string()));

        assert_eq!(verdict.explanation.suspicious_urls.len(), 1);
        let url = &verdict.explanation.suspicious_urls[0];
        assert_eq!(url.url, "http://1.2.3.4/login");
        assert!(url
            .reasons
            .contains(&"IP address instead of domain name".to_string()));
        assert!(url
            .reasons
            .contains(&"Non-secure HTTP connection".to_string()));
    }

    #[tokio::test]
    async fn known_url_forces_positive_verdict() {
        let (detector, db) = detector().await;
        db.add_known_phishing_url(
            "https://totally-fine.example/offer",
            None,
            Some("feed"),
            Some("medium"),
            None,
        )
        .await
        .expect("seed");

        // One clean-looking URL and nothing else suspicious: the raw score
        // stays high only because of the lookup signal, and the verdict is
        // positive regardless.
        let verdict = detector
            .analyze("see https://totally-fine.example/offer")
            .await;

        assert!(verdict.is_phishing);
        assert_eq!(verdict.explanation.known_phishing_matches.len(), 1);
        assert_eq!(
            verdict.explanation.known_phishing_matches[0],
            KnownPhishingMatch {
                url: "https://totally-fine.example/offer".to_string(),
                severity: Some("medium".to_string()),
            }
        );
        assert!(verdict
            .explanation
            .findings
            .contains(&"ALERT: 1 URL(s) match known phishing database".to_string()));
    }

    #[tokio::test]
    async fn known_url_positive_even_when_lookup_score_alone() {
        let (detector, db) = detector().await;
        db.add_known_phishing_url("https://x.example/a", None, None, None, None)
            .await
            .expect("seed");

        let verdict = detector.analyze("https://x.example/a").await;

        // 0.95 lookup + 0.10 URL-count pattern, clamped verdict fields hold
        assert!(verdict.is_phishing);
        assert!(verdict.raw_score >= 0.95);
        assert_eq!(
            verdict.risk_score,
            (verdict.raw_score * 100.0).round() as u8
        );
    }

    #[tokio::test]
    async fn analysis_survives_store_failure() {
        let (detector, db) = detector().await;
        db.pool().close().await;

        let verdict = detector
            .analyze("urgent http://bit.ly/deal")
            .await;

        // Lookup degraded to zero; the rest of the signals still scored
        assert!(verdict.explanation.known_phishing_matches.is_empty());
        assert!(verdict.raw_score > 0.0);
    }

    #[tokio::test]
    async fn idempotent_for_identical_input() {
        let (detector, db) = detector().await;
        db.add_known_phishing_url("http://bad.example/x", None, None, None, None)
            .await
            .expect("seed");

        let text = "URGENT!! verify at http://bad.example/x or lose 1000000";
        let first = detector.analyze(text).await;
        let second = detector.analyze(text).await;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn dilution_weakens_single_bad_url_under_average() {
        let (detector, _db) = detector().await;

        let lone = detector.analyze("http://bit.ly/x").await;

        let mut diluted_text = String::from("http://bit.ly/x");
        for i in 0..9 {
            diluted_text.push_str(&format!(" https://clean{}.example/page", i));
        }
        let diluted = detector.analyze(&diluted_text).await;

        // Same bad URL, but its contribution shrinks 10x under averaging.
        // lone: urls 0.10 + (0.25 + 0.15) = 0.50
        // diluted: urls 0.20 + 0.40/10 = 0.24
        assert!(lone.is_phishing);
        assert!(!diluted.is_phishing);
        assert!(diluted.raw_score < lone.raw_score);
    }

    #[tokio::test]
    async fn sum_strategy_restores_diluted_signal() {
        let db = Arc::new(Database::in_memory().await.expect("db"));
        let metrics = Arc::new(MetricsCollector::new());
        let config = DetectionConfig {
            url_aggregation: UrlAggregation::Sum,
            ..DetectionConfig::default()
        };
        let detector = ScamDetector::new(&config, db, metrics).expect("detector");

        let mut text = String::from("http://bit.ly/x");
        for i in 0..9 {
            text.push_str(&format!(" https://clean{}.example/page", i));
        }
        let verdict = detector.analyze(&text).await;

        // urls 0.20 + full 0.40 contribution
        assert!(verdict.is_phishing);
    }

    #[tokio::test]
    async fn keyword_summary_elides_after_five() {
        let (detector, _db) = detector().await;
        let verdict = detector
            .analyze("urgent verify suspended confirm password winner prize congratulations")
            .await;

        let summary = &verdict.explanation.findings[0];
        assert_eq!(
            summary,
            "Found 8 suspicious keyword(s): urgent, verify, suspended, confirm, password..."
        );
    }

    #[test]
    fn findings_order_keyword_pattern_alert() {
        let bundle = SignalBundle {
            keywords: KeywordSignal {
                matches: vec!["urgent".to_string()],
                base_score: 0.12,
            },
            patterns: PatternSignal {
                findings: vec![
                    "Urgency language detected".to_string(),
                    "Contains 1 URL(s)".to_string(),
                ],
                score: 0.25,
            },
            url_analyses: Vec::new(),
            lookup: KnownUrlSignal {
                matches: vec![KnownPhishingMatch {
                    url: "http://bad.example".to_string(),
                    severity: None,
                }],
                score: 0.95,
            },
        };

        let verdict = aggregate(&bundle, UrlAggregation::Average);
        assert_eq!(
            verdict.explanation.findings,
            vec![
                "Found 1 suspicious keyword(s): urgent".to_string(),
                "Urgency language detected".to_string(),
                "Contains 1 URL(s)".to_string(),
                "ALERT: 1 URL(s) match known phishing database".to_string(),
            ]
        );
    }

    #[test]
    fn clean_urls_excluded_from_suspicious_list() {
        let bundle = SignalBundle {
            keywords: KeywordSignal::empty(),
            patterns: PatternSignal::empty(),
            url_analyses: vec![
                UrlAnalysis {
                    url: "https://clean.example".to_string(),
                    reasons: Vec::new(),
                    score: 0.0,
                },
                UrlAnalysis {
                    url: "http://bad.example".to_string(),
                    reasons: vec!["Non-secure HTTP connection".to_string()],
                    score: 0.15,
                },
            ],
            lookup: KnownUrlSignal::empty(),
        };

        let verdict = aggregate(&bundle, UrlAggregation::Average);
        assert_eq!(verdict.explanation.suspicious_urls.len(), 1);
        assert_eq!(
            verdict.explanation.suspicious_urls[0].url,
            "http://bad.example"
        );
        // Both URLs still count toward the average
        assert!((verdict.raw_score - 0.075).abs() < 1e-9);
    }

    #[test]
    fn max_strategy_takes_worst_url() {
        let bundle = SignalBundle {
            keywords: KeywordSignal::empty(),
            patterns: PatternSignal::empty(),
            url_analyses: vec![
                UrlAnalysis {
                    url: "https://a.example".to_string(),
                    reasons: vec!["Suspicious top-level domain".to_string()],
                    score: 0.20,
                },
                UrlAnalysis {
                    url: "http://b.example".to_string(),
                    reasons: vec!["Non-secure HTTP connection".to_string()],
                    score: 0.15,
                },
            ],
            lookup: KnownUrlSignal::empty(),
        };

        let verdict = aggregate(&bundle, UrlAggregation::Max);
        assert!((verdict.raw_score - 0.20).abs() < 1e-9);
    }
}
