//! antiphish: a message/URL phishing triage service.
//!
//! Users submit text or URLs over an authenticated API; a multi-signal
//! heuristic engine scores them for phishing likelihood, cross-references
//! extracted URLs against a curated blocklist, persists the verdict, and
//! explains it. Admins manage the blocklist and review user-filed reports.

pub mod accounts;
pub mod blocklist;
pub mod config;
pub mod database;
pub mod detector;
pub mod error;
pub mod keywords;
pub mod metrics;
pub mod models;
pub mod patterns;
pub mod reports;
pub mod session;
pub mod urls;
pub mod web;
