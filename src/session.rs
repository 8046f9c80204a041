//! Session management for API authentication.
//!
//! Handles session creation, retrieval, and cleanup. Sessions are
//! database-backed cookies with a fixed TTL.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::database::{Database, Session};
use crate::error::Result;
use crate::models::User;

/// Session lifetime in days.
pub const SESSION_TTL_DAYS: i64 = 7;

/// Session manager for the API.
pub struct SessionManager {
    db: Arc<Database>,
}

impl SessionManager {
    /// Create a new session manager.
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create a new session for an authenticated user.
    pub async fn create_session(&self, user: &User) -> Result<Session> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id: user.id,
            expires_at: now + Duration::days(SESSION_TTL_DAYS),
            created_at: now,
            last_accessed: now,
        };

        self.db.create_session(&session).await?;
        Ok(session)
    }

    /// Get a live session by ID.
    ///
    /// Returns None for unknown or expired sessions; expired rows are
    /// deleted on sight rather than waiting for the cleanup task.
    pub async fn get_session(&self, session_id: &str) -> Result<Option<Session>> {
        let Some(session) = self.db.get_session(session_id).await? else {
            return Ok(None);
        };

        if session.expires_at <= Utc::now() {
            self.db.delete_session(session_id).await?;
            return Ok(None);
        }

        Ok(Some(session))
    }

    /// Delete a session (logout).
    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        self.db.delete_session(session_id).await
    }

    /// Clean up expired sessions.
    /// Returns the number of sessions deleted.
    pub async fn cleanup_expired(&self) -> Result<u64> {
        self.db.cleanup_expired_sessions().await
    }
}
