//! SQLite database for persistent storage.
//!
//! Handles users, sessions, submitted messages, analysis verdicts, the
//! known-phishing blocklist, and user-filed reports.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use crate::error::{AntiphishError, Result};
use crate::models::{
    AnalysisVerdict, Explanation, KnownPhishingMatch, Message, MessageSource, Report,
    ReportStatus, Role, User,
};

/// Session data for API authentication.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
}

/// A blocklist entry as stored.
#[derive(Debug, Clone, Serialize)]
pub struct KnownUrlEntry {
    pub id: i64,
    pub url: String,
    pub domain: Option<String>,
    pub source: Option<String>,
    pub severity: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A persisted verdict joined with its message, as returned to the owner.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRecord {
    pub id: i64,
    pub message_id: i64,
    pub is_scam: bool,
    pub score: f64,
    pub risk_score: u8,
    pub explanation: Explanation,
    pub created_at: DateTime<Utc>,
    pub content: String,
    pub source: Option<MessageSource>,
    pub sender: Option<String>,
}

/// Admin view of one submission: message, submitter, and verdict.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionRecord {
    pub message_id: i64,
    pub content: String,
    pub source: Option<MessageSource>,
    pub sender: Option<String>,
    pub created_at: DateTime<Utc>,
    pub user_email: Option<String>,
    pub is_scam: Option<bool>,
    pub score: Option<f64>,
    pub risk_score: Option<u8>,
}

/// Count of analyses per source channel.
#[derive(Debug, Clone, Serialize)]
pub struct SourceCount {
    pub source: Option<String>,
    pub count: i64,
}

/// Per-user analysis statistics.
#[derive(Debug, Clone, Serialize)]
pub struct UserStatistics {
    pub total: i64,
    pub scams: i64,
    pub safe: i64,
    pub scam_percentage: f64,
    pub average_score: f64,
    pub recent_analyses: i64,
    pub top_sources: Vec<SourceCount>,
}

/// Service-wide statistics for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct GlobalStatistics {
    pub total_analyses: i64,
    pub detection_rate: f64,
    pub active_users: i64,
    pub average_score: f64,
    pub recent_activity: i64,
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection.
    ///
    /// Creates the database file and initializes schema if needed.
    pub async fn new(path: &str) -> Result<Self> {
        let db_path = Path::new(path);

        // Create parent directories if needed
        if let Some(parent) = db_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AntiphishError::Database(format!(
                        "Failed to create database directory: {}",
                        e
                    ))
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| {
                AntiphishError::Database(format!("Failed to connect to database: {}", e))
            })?;

        let db = Self { pool };
        db.initialize_schema().await?;

        Ok(db)
    }

    /// Create an in-memory database for testing.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(":memory:")
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| {
                AntiphishError::Database(format!("Failed to create in-memory db: {}", e))
            })?;

        let db = Self { pool };
        db.initialize_schema().await?;

        Ok(db)
    }

    /// Initialize database schema.
    async fn initialize_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AntiphishError::Database(format!("Failed to initialize schema: {}", e))
            })?;

        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Check if the database is healthy.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AntiphishError::Database(format!("Health check failed: {}", e)))?;

        Ok(())
    }

    // ========== User CRUD ==========

    /// Create a new user account.
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        name: Option<&str>,
        role: Role,
    ) -> Result<User> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO users (username, email, password_hash, name, role, disabled, created_at)
             VALUES (?, ?, ?, ?, ?, 0, ?)",
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(name)
        .bind(role.as_str())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AntiphishError::Database(format!("Failed to create user: {}", e)))?;

        Ok(User {
            id: result.last_insert_rowid(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            name: name.map(String::from),
            role,
            disabled: false,
            created_at: now,
        })
    }

    /// Get a user by email.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, email, password_hash, name, role, disabled, created_at
             FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AntiphishError::Database(format!("Failed to get user: {}", e)))?;

        row.map(user_from_row).transpose()
    }

    /// Get a user by ID.
    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, email, password_hash, name, role, disabled, created_at
             FROM users WHERE id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AntiphishError::Database(format!("Failed to get user: {}", e)))?;

        row.map(user_from_row).transpose()
    }

    // ========== Session CRUD ==========

    /// Create a new session.
    pub async fn create_session(&self, session: &Session) -> Result<()> {
        sqlx::query(
            "INSERT INTO sessions (id, user_id, expires_at, created_at, last_accessed)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&session.id)
        .bind(session.user_id)
        .bind(session.expires_at.to_rfc3339())
        .bind(session.created_at.to_rfc3339())
        .bind(session.last_accessed.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AntiphishError::Database(format!("Failed to create session: {}", e)))?;

        Ok(())
    }

    /// Get a session by ID, bumping its last-accessed timestamp.
    pub async fn get_session(&self, session_id: &str) -> Result<Option<Session>> {
        let row = sqlx::query(
            "SELECT id, user_id, expires_at, created_at, last_accessed
             FROM sessions WHERE id = ?",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AntiphishError::Database(format!("Failed to get session: {}", e)))?;

        match row {
            Some(row) => {
                let session = Session {
                    id: row.get("id"),
                    user_id: row.get("user_id"),
                    expires_at: parse_timestamp(row.get("expires_at"))?,
                    created_at: parse_timestamp(row.get("created_at"))?,
                    last_accessed: parse_timestamp(row.get("last_accessed"))?,
                };

                let _ = sqlx::query("UPDATE sessions SET last_accessed = ? WHERE id = ?")
                    .bind(Utc::now().to_rfc3339())
                    .bind(session_id)
                    .execute(&self.pool)
                    .await;

                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    /// Delete a session (logout).
    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AntiphishError::Database(format!("Failed to delete session: {}", e)))?;

        Ok(())
    }

    /// Clean up expired sessions.
    /// Returns the number of sessions deleted.
    pub async fn cleanup_expired_sessions(&self) -> Result<u64> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| AntiphishError::Database(format!("Failed to cleanup sessions: {}", e)))?;

        Ok(result.rows_affected())
    }

    // ========== Message CRUD ==========

    /// Persist a submitted message.
    pub async fn insert_message(
        &self,
        user_id: i64,
        content: &str,
        source: Option<MessageSource>,
        sender: Option<&str>,
        content_hash: &str,
    ) -> Result<Message> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO messages (user_id, content, source, sender, content_hash, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(content)
        .bind(source.map(|s| s.as_str()))
        .bind(sender)
        .bind(content_hash)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AntiphishError::Database(format!("Failed to insert message: {}", e)))?;

        Ok(Message {
            id: result.last_insert_rowid(),
            user_id,
            content: content.to_string(),
            source,
            sender: sender.map(String::from),
            content_hash: content_hash.to_string(),
            created_at: now,
        })
    }

    /// List a user's messages, newest first.
    pub async fn list_messages(&self, user_id: i64) -> Result<Vec<Message>> {
        let rows = sqlx::query(
            "SELECT id, user_id, content, source, sender, content_hash, created_at
             FROM messages WHERE user_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AntiphishError::Database(format!("Failed to list messages: {}", e)))?;

        rows.into_iter().map(message_from_row).collect()
    }

    /// Get one of a user's messages by ID.
    pub async fn get_message(&self, message_id: i64, user_id: i64) -> Result<Option<Message>> {
        let row = sqlx::query(
            "SELECT id, user_id, content, source, sender, content_hash, created_at
             FROM messages WHERE id = ? AND user_id = ?",
        )
        .bind(message_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AntiphishError::Database(format!("Failed to get message: {}", e)))?;

        row.map(message_from_row).transpose()
    }

    // ========== Analysis CRUD ==========

    /// Persist the verdict for a message.
    pub async fn insert_analysis(
        &self,
        message_id: i64,
        verdict: &AnalysisVerdict,
    ) -> Result<i64> {
        let explanation = serde_json::to_string(&verdict.explanation)?;
        let result = sqlx::query(
            "INSERT INTO analyses (message_id, is_scam, score, risk_score, explanation, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(message_id)
        .bind(verdict.is_phishing)
        .bind(verdict.raw_score)
        .bind(verdict.risk_score as i64)
        .bind(explanation)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AntiphishError::Database(format!("Failed to insert analysis: {}", e)))?;

        Ok(result.last_insert_rowid())
    }

    /// Get the verdict persisted for a message, if any.
    pub async fn get_analysis_by_message(
        &self,
        message_id: i64,
    ) -> Result<Option<AnalysisRecord>> {
        let row = sqlx::query(
            "SELECT a.id, a.message_id, a.is_scam, a.score, a.risk_score, a.explanation,
                    a.created_at, m.content, m.source, m.sender
             FROM analyses a JOIN messages m ON a.message_id = m.id
             WHERE a.message_id = ?",
        )
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AntiphishError::Database(format!("Failed to get analysis: {}", e)))?;

        row.map(analysis_from_row).transpose()
    }

    /// Get one of a user's analyses by analysis ID.
    pub async fn get_analysis(
        &self,
        analysis_id: i64,
        user_id: i64,
    ) -> Result<Option<AnalysisRecord>> {
        let row = sqlx::query(
            "SELECT a.id, a.message_id, a.is_scam, a.score, a.risk_score, a.explanation,
                    a.created_at, m.content, m.source, m.sender
             FROM analyses a JOIN messages m ON a.message_id = m.id
             WHERE a.id = ? AND m.user_id = ?",
        )
        .bind(analysis_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AntiphishError::Database(format!("Failed to get analysis: {}", e)))?;

        row.map(analysis_from_row).transpose()
    }

    /// List a user's analyses, newest first, paginated.
    /// Returns the page and the total count.
    pub async fn list_analyses(
        &self,
        user_id: i64,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<AnalysisRecord>, i64)> {
        let offset = (page - 1) * limit;
        let rows = sqlx::query(
            "SELECT a.id, a.message_id, a.is_scam, a.score, a.risk_score, a.explanation,
                    a.created_at, m.content, m.source, m.sender
             FROM analyses a JOIN messages m ON a.message_id = m.id
             WHERE m.user_id = ?
             ORDER BY a.created_at DESC, a.id DESC
             LIMIT ? OFFSET ?",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AntiphishError::Database(format!("Failed to list analyses: {}", e)))?;

        let analyses: Result<Vec<AnalysisRecord>> =
            rows.into_iter().map(analysis_from_row).collect();

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(a.id) FROM analyses a JOIN messages m ON a.message_id = m.id
             WHERE m.user_id = ?",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AntiphishError::Database(format!("Failed to count analyses: {}", e)))?;

        Ok((analyses?, total))
    }

    /// Delete one of a user's analyses. Returns false if not found.
    pub async fn delete_analysis(&self, analysis_id: i64, user_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM analyses WHERE id = ? AND message_id IN
             (SELECT id FROM messages WHERE user_id = ?)",
        )
        .bind(analysis_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AntiphishError::Database(format!("Failed to delete analysis: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    /// Per-user statistics for the dashboard.
    pub async fn user_statistics(&self, user_id: i64) -> Result<UserStatistics> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(a.id) FROM analyses a JOIN messages m ON a.message_id = m.id
             WHERE m.user_id = ?",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AntiphishError::Database(format!("Failed to count analyses: {}", e)))?;

        let scams: i64 = sqlx::query_scalar(
            "SELECT COUNT(a.id) FROM analyses a JOIN messages m ON a.message_id = m.id
             WHERE m.user_id = ? AND a.is_scam = 1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AntiphishError::Database(format!("Failed to count scams: {}", e)))?;

        let average_score: Option<f64> = sqlx::query_scalar(
            "SELECT AVG(a.score) FROM analyses a JOIN messages m ON a.message_id = m.id
             WHERE m.user_id = ?",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AntiphishError::Database(format!("Failed to average score: {}", e)))?;

        let thirty_days_ago = (Utc::now() - Duration::days(30)).to_rfc3339();
        let recent_analyses: i64 = sqlx::query_scalar(
            "SELECT COUNT(a.id) FROM analyses a JOIN messages m ON a.message_id = m.id
             WHERE m.user_id = ? AND a.created_at >= ?",
        )
        .bind(user_id)
        .bind(thirty_days_ago)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AntiphishError::Database(format!("Failed to count recent: {}", e)))?;

        let source_rows = sqlx::query(
            "SELECT m.source, COUNT(m.id) AS count
             FROM messages m JOIN analyses a ON a.message_id = m.id
             WHERE m.user_id = ?
             GROUP BY m.source ORDER BY count DESC LIMIT 5",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AntiphishError::Database(format!("Failed to group sources: {}", e)))?;

        let top_sources = source_rows
            .into_iter()
            .map(|row| SourceCount {
                source: row.get("source"),
                count: row.get("count"),
            })
            .collect();

        let safe = total - scams;
        let scam_percentage = if total > 0 {
            (scams as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        Ok(UserStatistics {
            total,
            scams,
            safe,
            scam_percentage,
            average_score: average_score.unwrap_or(0.0),
            recent_analyses,
            top_sources,
        })
    }

    // ========== Known phishing URL CRUD ==========

    /// Add a blocklist entry. Rejects duplicate URLs.
    pub async fn add_known_phishing_url(
        &self,
        url: &str,
        domain: Option<&str>,
        source: Option<&str>,
        severity: Option<&str>,
        notes: Option<&str>,
    ) -> Result<KnownUrlEntry> {
        let existing: Option<i64> =
            sqlx::query_scalar("SELECT id FROM known_phishing_urls WHERE url = ?")
                .bind(url)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    AntiphishError::Database(format!("Failed to check blocklist: {}", e))
                })?;

        if existing.is_some() {
            return Err(AntiphishError::Validation("URL already exists".to_string()));
        }

        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO known_phishing_urls
             (url, domain, source, severity, notes, first_seen_at, last_seen_at, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(url)
        .bind(domain)
        .bind(source)
        .bind(severity)
        .bind(notes)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AntiphishError::Database(format!("Failed to add blocklist entry: {}", e)))?;

        Ok(KnownUrlEntry {
            id: result.last_insert_rowid(),
            url: url.to_string(),
            domain: domain.map(String::from),
            source: source.map(String::from),
            severity: severity.map(String::from),
            notes: notes.map(String::from),
            created_at: now,
        })
    }

    /// List blocklist entries, newest first.
    pub async fn list_known_phishing_urls(&self) -> Result<Vec<KnownUrlEntry>> {
        let rows = sqlx::query(
            "SELECT id, url, domain, source, severity, notes, created_at
             FROM known_phishing_urls ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AntiphishError::Database(format!("Failed to list blocklist: {}", e)))?;

        rows.into_iter()
            .map(|row| {
                Ok(KnownUrlEntry {
                    id: row.get("id"),
                    url: row.get("url"),
                    domain: row.get("domain"),
                    source: row.get("source"),
                    severity: row.get("severity"),
                    notes: row.get("notes"),
                    created_at: parse_timestamp(row.get("created_at"))?,
                })
            })
            .collect()
    }

    /// Delete a blocklist entry. Returns false if not found.
    pub async fn delete_known_phishing_url(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM known_phishing_urls WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AntiphishError::Database(format!("Failed to delete blocklist entry: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }

    /// Exact-match lookup of URLs against the blocklist.
    pub async fn lookup_known_phishing_urls(
        &self,
        urls: &[String],
    ) -> Result<Vec<KnownPhishingMatch>> {
        if urls.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; urls.len()].join(", ");
        let sql = format!(
            "SELECT url, severity FROM known_phishing_urls WHERE url IN ({})",
            placeholders
        );

        let mut query = sqlx::query(&sql);
        for url in urls {
            query = query.bind(url);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AntiphishError::Database(format!("Failed to query blocklist: {}", e)))?;

        Ok(rows
            .into_iter()
            .map(|row| KnownPhishingMatch {
                url: row.get("url"),
                severity: row.get("severity"),
            })
            .collect())
    }

    // ========== Report CRUD ==========

    /// File a report for moderator review.
    pub async fn create_report(
        &self,
        message_id: Option<i64>,
        reporter_user_id: Option<i64>,
        url: Option<&str>,
        details: Option<&str>,
    ) -> Result<Report> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO reports (message_id, reporter_user_id, url, details, status, created_at)
             VALUES (?, ?, ?, ?, 'open', ?)",
        )
        .bind(message_id)
        .bind(reporter_user_id)
        .bind(url)
        .bind(details)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AntiphishError::Database(format!("Failed to create report: {}", e)))?;

        Ok(Report {
            id: result.last_insert_rowid(),
            message_id,
            reporter_user_id,
            url: url.map(String::from),
            details: details.map(String::from),
            status: ReportStatus::Open,
            moderator_id: None,
            reviewed_at: None,
            created_at: now,
        })
    }

    /// List reports, optionally filtered by status, newest first.
    pub async fn list_reports(&self, status: Option<ReportStatus>) -> Result<Vec<Report>> {
        let rows = match status {
            Some(status) => sqlx::query(
                "SELECT id, message_id, reporter_user_id, url, details, status,
                        moderator_id, reviewed_at, created_at
                 FROM reports WHERE status = ? ORDER BY created_at DESC, id DESC",
            )
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await,
            None => {
                sqlx::query(
                    "SELECT id, message_id, reporter_user_id, url, details, status,
                            moderator_id, reviewed_at, created_at
                     FROM reports ORDER BY created_at DESC, id DESC",
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| AntiphishError::Database(format!("Failed to list reports: {}", e)))?;

        rows.into_iter().map(report_from_row).collect()
    }

    /// Get a report by ID.
    pub async fn get_report(&self, report_id: i64) -> Result<Option<Report>> {
        let row = sqlx::query(
            "SELECT id, message_id, reporter_user_id, url, details, status,
                    moderator_id, reviewed_at, created_at
             FROM reports WHERE id = ?",
        )
        .bind(report_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AntiphishError::Database(format!("Failed to get report: {}", e)))?;

        row.map(report_from_row).transpose()
    }

    /// Update a report's review status. Returns the updated report, or
    /// None if it does not exist.
    pub async fn update_report_status(
        &self,
        report_id: i64,
        status: ReportStatus,
        moderator_id: i64,
    ) -> Result<Option<Report>> {
        let result = sqlx::query(
            "UPDATE reports SET status = ?, moderator_id = ?, reviewed_at = ? WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(moderator_id)
        .bind(Utc::now().to_rfc3339())
        .bind(report_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AntiphishError::Database(format!("Failed to update report: {}", e)))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_report(report_id).await
    }

    // ========== Admin queries ==========

    /// Admin listing of submissions, optionally filtered by source channel.
    pub async fn list_submissions(
        &self,
        source: Option<&str>,
    ) -> Result<Vec<SubmissionRecord>> {
        let rows = match source {
            Some(source) => sqlx::query(
                "SELECT m.id AS message_id, m.content, m.source, m.sender, m.created_at,
                        u.email AS user_email, a.is_scam, a.score, a.risk_score
                 FROM messages m
                 LEFT JOIN users u ON m.user_id = u.id
                 LEFT JOIN analyses a ON a.message_id = m.id
                 WHERE m.source = ?
                 ORDER BY m.created_at DESC, m.id DESC",
            )
            .bind(source)
            .fetch_all(&self.pool)
            .await,
            None => {
                sqlx::query(
                    "SELECT m.id AS message_id, m.content, m.source, m.sender, m.created_at,
                            u.email AS user_email, a.is_scam, a.score, a.risk_score
                     FROM messages m
                     LEFT JOIN users u ON m.user_id = u.id
                     LEFT JOIN analyses a ON a.message_id = m.id
                     ORDER BY m.created_at DESC, m.id DESC",
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| AntiphishError::Database(format!("Failed to list submissions: {}", e)))?;

        rows.into_iter().map(submission_from_row).collect()
    }

    /// Admin view of one submission.
    pub async fn get_submission(&self, message_id: i64) -> Result<Option<SubmissionRecord>> {
        let row = sqlx::query(
            "SELECT m.id AS message_id, m.content, m.source, m.sender, m.created_at,
                    u.email AS user_email, a.is_scam, a.score, a.risk_score
             FROM messages m
             LEFT JOIN users u ON m.user_id = u.id
             LEFT JOIN analyses a ON a.message_id = m.id
             WHERE m.id = ?",
        )
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AntiphishError::Database(format!("Failed to get submission: {}", e)))?;

        row.map(submission_from_row).transpose()
    }

    /// Service-wide statistics for the admin dashboard.
    pub async fn global_statistics(&self) -> Result<GlobalStatistics> {
        let total_analyses: i64 = sqlx::query_scalar("SELECT COUNT(id) FROM analyses")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AntiphishError::Database(format!("Failed to count analyses: {}", e)))?;

        let scams: i64 =
            sqlx::query_scalar("SELECT COUNT(id) FROM analyses WHERE is_scam = 1")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AntiphishError::Database(format!("Failed to count scams: {}", e))
                })?;

        let active_users: i64 =
            sqlx::query_scalar("SELECT COUNT(DISTINCT user_id) FROM messages")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AntiphishError::Database(format!("Failed to count users: {}", e))
                })?;

        let average_score: Option<f64> = sqlx::query_scalar("SELECT AVG(score) FROM analyses")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AntiphishError::Database(format!("Failed to average score: {}", e)))?;

        let yesterday = (Utc::now() - Duration::hours(24)).to_rfc3339();
        let recent_activity: i64 =
            sqlx::query_scalar("SELECT COUNT(id) FROM messages WHERE created_at >= ?")
                .bind(yesterday)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AntiphishError::Database(format!("Failed to count recent: {}", e))
                })?;

        let detection_rate = if total_analyses > 0 {
            (scams as f64 / total_analyses as f64) * 100.0
        } else {
            0.0
        };

        Ok(GlobalStatistics {
            total_analyses,
            detection_rate,
            active_users,
            average_score: average_score.unwrap_or(0.0),
            recent_activity,
        })
    }
}

/// Parse an RFC 3339 timestamp column.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AntiphishError::Database(format!("Invalid timestamp: {}", e)))
}

fn user_from_row(row: sqlx::sqlite::SqliteRow) -> Result<User> {
    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        name: row.get("name"),
        role: Role::parse(row.get("role")),
        disabled: row.get("disabled"),
        created_at: parse_timestamp(row.get("created_at"))?,
    })
}

fn message_from_row(row: sqlx::sqlite::SqliteRow) -> Result<Message> {
    Ok(Message {
        id: row.get("id"),
        user_id: row.get("user_id"),
        content: row.get("content"),
        source: row
            .get::<Option<String>, _>("source")
            .as_deref()
            .and_then(MessageSource::parse),
        sender: row.get("sender"),
        content_hash: row.get("content_hash"),
        created_at: parse_timestamp(row.get("created_at"))?,
    })
}

fn analysis_from_row(row: sqlx::sqlite::SqliteRow) -> Result<AnalysisRecord> {
    let explanation: Explanation = serde_json::from_str(row.get("explanation"))?;
    Ok(AnalysisRecord {
        id: row.get("id"),
        message_id: row.get("message_id"),
        is_scam: row.get("is_scam"),
        score: row.get("score"),
        risk_score: row.get::<i64, _>("risk_score") as u8,
        explanation,
        created_at: parse_timestamp(row.get("created_at"))?,
        content: row.get("content"),
        source: row
            .get::<Option<String>, _>("source")
            .as_deref()
            .and_then(MessageSource::parse),
        sender: row.get("sender"),
    })
}

fn submission_from_row(row: sqlx::sqlite::SqliteRow) -> Result<SubmissionRecord> {
    Ok(SubmissionRecord {
        message_id: row.get("message_id"),
        content: row.get("content"),
        source: row
            .get::<Option<String>, _>("source")
            .as_deref()
            .and_then(MessageSource::parse),
        sender: row.get("sender"),
        created_at: parse_timestamp(row.get("created_at"))?,
        user_email: row.get("user_email"),
        is_scam: row.get("is_scam"),
        score: row.get("score"),
        risk_score: row
            .get::<Option<i64>, _>("risk_score")
            .map(|score| score as u8),
    })
}

fn report_from_row(row: sqlx::sqlite::SqliteRow) -> Result<Report> {
    let status_raw: String = row.get("status");
    Ok(Report {
        id: row.get("id"),
        message_id: row.get("message_id"),
        reporter_user_id: row.get("reporter_user_id"),
        url: row.get("url"),
        details: row.get("details"),
        status: ReportStatus::parse(&status_raw).ok_or_else(|| {
            AntiphishError::Database(format!("Invalid report status: {}", status_raw))
        })?,
        moderator_id: row.get("moderator_id"),
        reviewed_at: row
            .get::<Option<String>, _>("reviewed_at")
            .as_deref()
            .map(parse_timestamp)
            .transpose()?,
        created_at: parse_timestamp(row.get("created_at"))?,
    })
}

const SCHEMA: &str = r#"
-- Registered accounts
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    name TEXT,
    role TEXT NOT NULL DEFAULT 'user',
    disabled INTEGER NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT CURRENT_TIMESTAMP
);

-- API sessions
CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    user_id INTEGER NOT NULL,
    expires_at TEXT NOT NULL,
    created_at TEXT DEFAULT CURRENT_TIMESTAMP,
    last_accessed TEXT DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (user_id) REFERENCES users(id)
);

-- Submitted messages
CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    content TEXT NOT NULL,
    source TEXT,
    sender TEXT,
    content_hash TEXT NOT NULL,
    created_at TEXT DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (user_id) REFERENCES users(id)
);
CREATE INDEX IF NOT EXISTS idx_messages_user ON messages(user_id);

-- Analysis verdicts, one per message
CREATE TABLE IF NOT EXISTS analyses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    message_id INTEGER NOT NULL,
    is_scam INTEGER NOT NULL DEFAULT 0,
    score REAL NOT NULL DEFAULT 0,
    risk_score INTEGER NOT NULL DEFAULT 0,
    explanation TEXT,
    created_at TEXT DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (message_id) REFERENCES messages(id)
);
CREATE INDEX IF NOT EXISTS idx_analyses_message ON analyses(message_id);

-- Known phishing blocklist, matched by exact URL
CREATE TABLE IF NOT EXISTS known_phishing_urls (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    domain TEXT,
    source TEXT,
    severity TEXT,
    notes TEXT,
    first_seen_at TEXT,
    last_seen_at TEXT,
    created_at TEXT DEFAULT CURRENT_TIMESTAMP
);
CREATE INDEX IF NOT EXISTS idx_known_phishing_urls_url ON known_phishing_urls(url);

-- User-filed reports for moderator review
CREATE TABLE IF NOT EXISTS reports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    message_id INTEGER,
    reporter_user_id INTEGER,
    url TEXT,
    details TEXT,
    status TEXT NOT NULL DEFAULT 'open',
    moderator_id INTEGER,
    reviewed_at TEXT,
    created_at TEXT DEFAULT CURRENT_TIMESTAMP
);
CREATE INDEX IF NOT EXISTS idx_reports_status ON reports(status);
"#;
