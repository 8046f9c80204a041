//! Configuration loading from environment.
//!
//! Reads service configuration from environment variables and supports
//! detection keyword lists from a JSON file or the built-in defaults.
//! Scoring weights and thresholds are compiled-in constants in the signal
//! modules; only the keyword lists and the URL aggregation strategy are
//! externalized, with defaults that keep verdicts identical.

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AntiphishError, Result};

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default per-user message submissions per minute.
pub const DEFAULT_SUBMIT_RATE_PER_MINUTE: u32 = 30;

/// Main configuration for the antiphish service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP listen port.
    pub port: u16,
    /// SQLite database path.
    pub database_path: String,
    /// Directory served as the dashboard SPA.
    pub static_dir: String,
    /// Per-user message submissions per minute.
    pub submit_rate_per_minute: u32,
    /// Detection configuration for the scoring engine.
    pub detection: DetectionConfig,
}

/// How per-URL risk scores are folded into the total when a message
/// contains more than one URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlAggregation {
    /// Mean of the per-URL scores. Dilutes a single bad URL among clean
    /// ones; kept as the default for verdict compatibility.
    #[default]
    Average,
    /// Sum of the per-URL scores.
    Sum,
    /// Highest single per-URL score.
    Max,
}

impl UrlAggregation {
    /// Parse from the configured tag.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "average" => Some(Self::Average),
            "sum" => Some(Self::Sum),
            "max" => Some(Self::Max),
            _ => None,
        }
    }
}

/// Detection configuration for the scoring engine.
///
/// The keyword scanner consumes the Vietnamese list followed by the English
/// list; match output preserves that order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    #[serde(default = "default_vietnamese_keywords")]
    pub vietnamese_keywords: Vec<String>,
    #[serde(default = "default_english_keywords")]
    pub english_keywords: Vec<String>,
    #[serde(default)]
    pub url_aggregation: UrlAggregation,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            vietnamese_keywords: default_vietnamese_keywords(),
            english_keywords: default_english_keywords(),
            url_aggregation: UrlAggregation::Average,
        }
    }
}

impl DetectionConfig {
    /// The combined keyword list, Vietnamese first, as scanned.
    pub fn combined_keywords(&self) -> Vec<String> {
        let mut combined = self.vietnamese_keywords.clone();
        combined.extend(self.english_keywords.iter().cloned());
        combined
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `PORT`: HTTP listen port (default: 3000)
    /// - `DATABASE_PATH`: SQLite file path (default: antiphish.db)
    /// - `STATIC_DIR`: dashboard directory (default: public)
    /// - `SUBMIT_RATE_PER_MINUTE`: per-user submission quota (default: 30)
    /// - `DETECTION_CONFIG_PATH`: path to JSON file with keyword lists
    /// - `URL_AGGREGATION`: average | sum | max (default: average)
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| "antiphish.db".to_string());

        let static_dir = env::var("STATIC_DIR").unwrap_or_else(|_| "public".to_string());

        let submit_rate_per_minute = env::var("SUBMIT_RATE_PER_MINUTE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_SUBMIT_RATE_PER_MINUTE);

        let detection = load_detection_config()?;

        Ok(Self {
            port,
            database_path,
            static_dir,
            submit_rate_per_minute,
            detection,
        })
    }
}

/// Load detection configuration from file or environment.
fn load_detection_config() -> Result<DetectionConfig> {
    let mut config = if let Ok(path) = env::var("DETECTION_CONFIG_PATH") {
        load_detection_from_file(&path)?
    } else {
        DetectionConfig::default()
    };

    // URL_AGGREGATION overrides the file value when both are present
    if let Ok(raw) = env::var("URL_AGGREGATION") {
        config.url_aggregation = UrlAggregation::parse(raw.trim()).ok_or_else(|| {
            AntiphishError::Config(format!(
                "URL_AGGREGATION must be average, sum, or max (got {:?})",
                raw
            ))
        })?;
    }

    Ok(config)
}

/// Load detection lists from a JSON file.
fn load_detection_from_file(path: &str) -> Result<DetectionConfig> {
    let path = Path::new(path);
    let content = fs::read_to_string(path)
        .map_err(|e| AntiphishError::Config(format!("Failed to read detection file: {}", e)))?;

    serde_json::from_str(&content)
        .map_err(|e| AntiphishError::Config(format!("Failed to parse detection file: {}", e)))
}

/// Vietnamese phishing-indicator phrases.
fn default_vietnamese_keywords() -> Vec<String> {
    [
        "chuyển khoản",
        "vay tiền",
        "khóa tài khoản",
        "otp",
        "mã xác nhận",
        "yêu cầu chuyển",
        "thắng",
        "trúng thưởng",
        "ngân hàng",
        "sdt",
        "số tài khoản",
        "gửi link",
        "click link",
        "f0",
        "lừa đảo",
        "giải ngân",
        "nhanh",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// English phishing-indicator phrases.
fn default_english_keywords() -> Vec<String> {
    [
        "urgent",
        "verify",
        "suspended",
        "click here",
        "act now",
        "confirm",
        "password",
        "social security",
        "bank account",
        "credit card",
        "expire",
        "winner",
        "prize",
        "congratulations",
        "limited time",
        "immediately",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_keyword_lists_are_bilingual() {
        let config = DetectionConfig::default();
        assert_eq!(config.vietnamese_keywords.len(), 17);
        assert_eq!(config.english_keywords.len(), 16);
        assert!(config
            .vietnamese_keywords
            .contains(&"chuyển khoản".to_string()));
        assert!(config.english_keywords.contains(&"click here".to_string()));
    }

    #[test]
    fn combined_keywords_vietnamese_first() {
        let config = DetectionConfig::default();
        let combined = config.combined_keywords();

        assert_eq!(combined.len(), 33);
        assert_eq!(combined[0], "chuyển khoản");
        assert_eq!(combined[17], "urgent");
        assert_eq!(combined[32], "immediately");
    }

    #[test]
    fn url_aggregation_parse() {
        assert_eq!(UrlAggregation::parse("average"), Some(UrlAggregation::Average));
        assert_eq!(UrlAggregation::parse("sum"), Some(UrlAggregation::Sum));
        assert_eq!(UrlAggregation::parse("max"), Some(UrlAggregation::Max));
        assert_eq!(UrlAggregation::parse("median"), None);
    }

    #[test]
    fn url_aggregation_defaults_to_average() {
        assert_eq!(UrlAggregation::default(), UrlAggregation::Average);
    }

    #[test]
    fn detection_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{"english_keywords": ["phish"], "url_aggregation": "max"}}"#
        )
        .expect("write");

        let config = load_detection_from_file(
            file.path().to_str().expect("utf-8 path"),
        )
        .expect("load");

        // Omitted lists fall back to defaults
        assert_eq!(config.vietnamese_keywords.len(), 17);
        assert_eq!(config.english_keywords, vec!["phish".to_string()]);
        assert_eq!(config.url_aggregation, UrlAggregation::Max);
    }

    #[test]
    fn detection_config_missing_file_errors() {
        let result = load_detection_from_file("/nonexistent/detection.json");
        assert!(matches!(result, Err(AntiphishError::Config(_))));
    }

    #[test]
    fn detection_config_serialize_roundtrip() {
        let config = DetectionConfig::default();
        let json = serde_json::to_string(&config).expect("serialize");
        let parsed: DetectionConfig = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(config.vietnamese_keywords, parsed.vietnamese_keywords);
        assert_eq!(config.english_keywords, parsed.english_keywords);
        assert_eq!(config.url_aggregation, parsed.url_aggregation);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_keyword() -> impl Strategy<Value = String> {
        "[a-z ]{3,20}"
    }

    fn arb_detection_config() -> impl Strategy<Value = DetectionConfig> {
        (
            prop::collection::vec(arb_keyword(), 0..8),
            prop::collection::vec(arb_keyword(), 0..8),
            prop_oneof![
                Just(UrlAggregation::Average),
                Just(UrlAggregation::Sum),
                Just(UrlAggregation::Max),
            ],
        )
            .prop_map(|(vietnamese_keywords, english_keywords, url_aggregation)| {
                DetectionConfig {
                    vietnamese_keywords,
                    english_keywords,
                    url_aggregation,
                }
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The JSON file form round-trips without losing keywords or the
        /// aggregation strategy.
        #[test]
        fn prop_detection_config_json_roundtrip(config in arb_detection_config()) {
            let json = serde_json::to_string(&config).expect("serialization should succeed");
            let parsed: DetectionConfig =
                serde_json::from_str(&json).expect("deserialization should succeed");

            prop_assert_eq!(config.vietnamese_keywords, parsed.vietnamese_keywords);
            prop_assert_eq!(config.english_keywords, parsed.english_keywords);
            prop_assert_eq!(config.url_aggregation, parsed.url_aggregation);
        }

        /// The combined list always concatenates Vietnamese before English.
        #[test]
        fn prop_combined_keywords_order(config in arb_detection_config()) {
            let combined = config.combined_keywords();

            prop_assert_eq!(
                combined.len(),
                config.vietnamese_keywords.len() + config.english_keywords.len()
            );
            prop_assert_eq!(
                &combined[..config.vietnamese_keywords.len()],
                &config.vietnamese_keywords[..]
            );
            prop_assert_eq!(
                &combined[config.vietnamese_keywords.len()..],
                &config.english_keywords[..]
            );
        }
    }
}
