//! Core data models for the antiphish service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Channel a submitted message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSource {
    Email,
    Sms,
    SocialMedia,
    MessagingApp,
    Website,
    BrowserExtension,
    Other,
}

impl MessageSource {
    /// Convert to string for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Sms => "sms",
            Self::SocialMedia => "social_media",
            Self::MessagingApp => "messaging_app",
            Self::Website => "website",
            Self::BrowserExtension => "browser_extension",
            Self::Other => "other",
        }
    }

    /// Parse from the stored/submitted tag.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "email" => Some(Self::Email),
            "sms" => Some(Self::Sms),
            "social_media" => Some(Self::SocialMedia),
            "messaging_app" => Some(Self::MessagingApp),
            "website" => Some(Self::Website),
            "browser_extension" => Some(Self::BrowserExtension),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// A user-submitted message, immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub user_id: i64,
    pub content: String,
    pub source: Option<MessageSource>,
    pub sender: Option<String>,
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A URL flagged by the per-URL analyzer, with the reasons that fired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspiciousUrl {
    pub url: String,
    pub reasons: Vec<String>,
}

/// An exact-match hit against the known-phishing blocklist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnownPhishingMatch {
    pub url: String,
    pub severity: Option<String>,
}

/// Structured explanation attached to every verdict.
///
/// Field order mirrors how findings are assembled: keywords, then structural
/// patterns, then URL evidence, then blocklist matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub keywords: Vec<String>,
    pub patterns: Vec<String>,
    pub suspicious_urls: Vec<SuspiciousUrl>,
    pub known_phishing_matches: Vec<KnownPhishingMatch>,
    pub findings: Vec<String>,
    pub risk_score: u8,
    pub recommendation: String,
}

/// The scoring engine's sole output, computed fresh per call.
///
/// Invariants:
/// - `raw_score` is clamped to `[0, 1]`
/// - `risk_score == round(raw_score * 100)`
/// - `is_phishing == (raw_score >= 0.5) || !explanation.known_phishing_matches.is_empty()`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisVerdict {
    pub is_phishing: bool,
    pub raw_score: f64,
    pub risk_score: u8,
    pub explanation: Explanation,
}

/// Risk bucket derived from the 0-100 risk score.
///
/// - High: risk_score >= 75
/// - Medium: 50 <= risk_score < 75
/// - Low: 25 <= risk_score < 50
/// - Minimal: risk_score < 25
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    High,
    Medium,
    Low,
    Minimal,
}

impl RiskLevel {
    /// Classify a 0-100 risk score into a bucket.
    ///
    /// ```
    /// use antiphish::models::RiskLevel;
    ///
    /// assert_eq!(RiskLevel::from_risk_score(80), RiskLevel::High);
    /// assert_eq!(RiskLevel::from_risk_score(50), RiskLevel::Medium);
    /// assert_eq!(RiskLevel::from_risk_score(30), RiskLevel::Low);
    /// assert_eq!(RiskLevel::from_risk_score(10), RiskLevel::Minimal);
    /// ```
    pub fn from_risk_score(risk_score: u8) -> Self {
        if risk_score >= 75 {
            RiskLevel::High
        } else if risk_score >= 50 {
            RiskLevel::Medium
        } else if risk_score >= 25 {
            RiskLevel::Low
        } else {
            RiskLevel::Minimal
        }
    }

    /// The recommendation string shown to the user for this bucket.
    pub fn recommendation(&self) -> &'static str {
        match self {
            RiskLevel::High => {
                "HIGH RISK: Do not interact with this message. Delete immediately and report as phishing."
            }
            RiskLevel::Medium => {
                "MEDIUM RISK: Exercise extreme caution. Verify sender through official channels before taking any action."
            }
            RiskLevel::Low => {
                "LOW RISK: Some suspicious elements detected. Verify sender identity before clicking links or providing information."
            }
            RiskLevel::Minimal => {
                "MINIMAL RISK: No major red flags detected, but always stay vigilant."
            }
        }
    }
}

/// Account role; admins may manage the blocklist and review reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    /// Convert to string for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// Parse from string. Unknown values fall back to the least-privileged role.
    pub fn parse(s: &str) -> Self {
        match s {
            "admin" => Self::Admin,
            _ => Self::User,
        }
    }
}

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: Option<String>,
    pub role: Role,
    pub disabled: bool,
    pub created_at: DateTime<Utc>,
}

/// Review state of a user-filed report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Open,
    Confirmed,
    Dismissed,
}

impl ReportStatus {
    /// Convert to string for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Confirmed => "confirmed",
            Self::Dismissed => "dismissed",
        }
    }

    /// Parse from the stored/submitted tag.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(Self::Open),
            "confirmed" => Some(Self::Confirmed),
            "dismissed" => Some(Self::Dismissed),
            _ => None,
        }
    }
}

/// A report filed by a user for moderator review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,
    pub message_id: Option<i64>,
    pub reporter_user_id: Option<i64>,
    pub url: Option<String>,
    pub details: Option<String>,
    pub status: ReportStatus,
    pub moderator_id: Option<i64>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// For any risk score in [0, 100], the bucket boundaries are
        /// inclusive on the lower bound and evaluated highest-first.
        #[test]
        fn prop_risk_level_classification(risk_score in 0u8..=100u8) {
            let level = RiskLevel::from_risk_score(risk_score);

            if risk_score >= 75 {
                prop_assert_eq!(level, RiskLevel::High);
            } else if risk_score >= 50 {
                prop_assert_eq!(level, RiskLevel::Medium);
            } else if risk_score >= 25 {
                prop_assert_eq!(level, RiskLevel::Low);
            } else {
                prop_assert_eq!(level, RiskLevel::Minimal);
            }
        }

        /// Boundary scores land in the expected buckets.
        #[test]
        fn prop_risk_level_boundaries(risk_score in prop_oneof![
            Just(0u8),
            Just(24u8),
            Just(25u8),
            Just(49u8),
            Just(50u8),
            Just(74u8),
            Just(75u8),
            Just(100u8),
        ]) {
            let level = RiskLevel::from_risk_score(risk_score);

            match risk_score {
                s if s >= 75 => prop_assert_eq!(level, RiskLevel::High),
                s if s >= 50 => prop_assert_eq!(level, RiskLevel::Medium),
                s if s >= 25 => prop_assert_eq!(level, RiskLevel::Low),
                _ => prop_assert_eq!(level, RiskLevel::Minimal),
            }
        }
    }
}
