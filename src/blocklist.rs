//! Known-phishing blocklist lookup.
//!
//! Cross-references extracted URLs against the curated blocklist by exact
//! string equality. A store failure never reaches the caller: the signal
//! degrades to zero, the fault is logged, and the failure counter ticks so
//! operators can see a systematically failing store.

use std::collections::HashSet;
use std::sync::Arc;

use crate::database::Database;
use crate::metrics::MetricsCollector;
use crate::models::KnownPhishingMatch;

/// Score assigned when any blocklist match exists.
pub const KNOWN_MATCH_SCORE: f64 = 0.95;

/// Result of a blocklist check.
#[derive(Debug, Clone, PartialEq)]
pub struct KnownUrlSignal {
    /// Blocklist entries matching the submitted URLs.
    pub matches: Vec<KnownPhishingMatch>,
    /// 0.95 if any match, else 0.
    pub score: f64,
}

impl KnownUrlSignal {
    /// A check with no matches.
    pub fn empty() -> Self {
        Self {
            matches: Vec::new(),
            score: 0.0,
        }
    }
}

/// Read-only view of the known-phishing store.
pub struct KnownUrlStore {
    db: Arc<Database>,
    metrics: Arc<MetricsCollector>,
}

impl KnownUrlStore {
    /// Create a store view over the database.
    pub fn new(db: Arc<Database>, metrics: Arc<MetricsCollector>) -> Self {
        Self { db, metrics }
    }

    /// Check the distinct set of extracted URLs against the blocklist.
    ///
    /// An empty input short-circuits without touching the store. Lookup
    /// failures degrade to an empty result; the analysis must still
    /// complete.
    pub async fn check(&self, urls: &[String]) -> KnownUrlSignal {
        if urls.is_empty() {
            return KnownUrlSignal::empty();
        }

        // Distinct set; first-seen order is kept for stable output
        let mut seen = HashSet::new();
        let distinct: Vec<String> = urls
            .iter()
            .filter(|url| seen.insert(url.as_str()))
            .cloned()
            .collect();

        match self.db.lookup_known_phishing_urls(&distinct).await {
            Ok(matches) => {
                let score = if matches.is_empty() {
                    0.0
                } else {
                    KNOWN_MATCH_SCORE
                };
                KnownUrlSignal { matches, score }
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    url_count = distinct.len(),
                    "Known-phishing lookup failed; continuing with degraded signal"
                );
                self.metrics.record_lookup_failure();
                KnownUrlSignal::empty()
            }
        }
    }
}
