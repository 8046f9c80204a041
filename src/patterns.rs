//! Structural pattern extractor.
//!
//! Tests raw text for five structural red flags, each contributing an
//! additive score. Checks run in a fixed order so finding strings are
//! stable across calls.

use std::collections::HashSet;

use regex::Regex;

use crate::error::Result;

/// Score for a 4+ digit run.
pub const LONG_NUMBER_WEIGHT: f64 = 0.15;

/// Score for an urgency-language token.
pub const URGENCY_WEIGHT: f64 = 0.15;

/// Score per embedded URL.
pub const URL_COUNT_WEIGHT: f64 = 0.10;

/// Cap on the URL-count contribution.
pub const URL_COUNT_CAP: f64 = 0.20;

/// Score for 3+ distinct all-caps words.
pub const CAPS_WEIGHT: f64 = 0.10;

/// Score for repeated terminal punctuation.
pub const PUNCTUATION_WEIGHT: f64 = 0.08;

/// Result of a structural pattern scan.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternSignal {
    /// Triggered findings, in check order.
    pub findings: Vec<String>,
    /// Summed contribution, clamped to `[0, 1]`.
    pub score: f64,
}

impl PatternSignal {
    /// A scan with nothing triggered.
    pub fn empty() -> Self {
        Self {
            findings: Vec::new(),
            score: 0.0,
        }
    }
}

/// Scanner with the five structural checks pre-compiled.
pub struct PatternScanner {
    long_number: Regex,
    urgency: Regex,
    caps_word: Regex,
    punctuation: Regex,
}

impl PatternScanner {
    /// Compile the fixed check patterns.
    pub fn new() -> Result<Self> {
        Ok(Self {
            long_number: Regex::new(r"\b[0-9]{4,}\b")?,
            urgency: Regex::new(r"(?i)\b(urgent|gấp|khẩn|immediately|ngay|now|asap)\b")?,
            caps_word: Regex::new(r"\b[A-Z]{3,}\b")?,
            punctuation: Regex::new(r"[!?]{2,}")?,
        })
    }

    /// Scan text for structural red flags.
    ///
    /// `url_count` is the number of URLs the extractor found in the same
    /// text; the URL-count check belongs to this signal but the extraction
    /// itself lives in [`crate::urls`].
    pub fn scan(&self, text: &str, url_count: usize) -> PatternSignal {
        let mut findings = Vec::new();
        let mut score = 0.0;

        // Long numbers (phone numbers, account numbers)
        if self.long_number.is_match(text) {
            findings.push("Contains long numeric sequence".to_string());
            score += LONG_NUMBER_WEIGHT;
        }

        if self.urgency.is_match(text) {
            findings.push("Urgency language detected".to_string());
            score += URGENCY_WEIGHT;
        }

        if url_count > 0 {
            findings.push(format!("Contains {} URL(s)", url_count));
            score += URL_COUNT_CAP.min(url_count as f64 * URL_COUNT_WEIGHT);
        }

        // All-caps words (shouting); distinct words only
        let caps_words: HashSet<&str> = self
            .caps_word
            .find_iter(text)
            .map(|m| m.as_str())
            .collect();
        if caps_words.len() >= 3 {
            findings.push("Excessive capitalization".to_string());
            score += CAPS_WEIGHT;
        }

        if self.punctuation.is_match(text) {
            findings.push("Excessive punctuation".to_string());
            score += PUNCTUATION_WEIGHT;
        }

        PatternSignal {
            findings,
            score: score.min(1.0),
        }
    }
}
