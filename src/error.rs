//! Error types for the antiphish service.
//!
//! All errors are explicitly typed using thiserror. No panics in production code.

use thiserror::Error;

/// Central error type for all antiphish operations.
#[derive(Debug, Error)]
pub enum AntiphishError {
    /// Request payload failed validation (bad field, out-of-range length).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing, invalid, or expired session.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Authenticated user lacks the required role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Requested resource does not exist (or is not visible to the caller).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Per-user submission rate limit exceeded.
    #[error("Rate limited, retry after {retry_after_ms}ms")]
    RateLimited {
        /// Milliseconds to wait before retry.
        retry_after_ms: u64,
    },

    /// Configuration error (missing env vars, invalid values).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal state error (invalid state transitions).
    #[error("Internal state error: {0}")]
    InternalState(String),

    /// Regex pattern compilation error.
    #[error("Regex pattern error: {0}")]
    RegexPattern(#[from] regex::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),
}

impl AntiphishError {
    /// Log error with full context using tracing.
    ///
    /// Critical faults get `error`-level records with structured fields;
    /// expected conditions (validation, auth, rate limits) log at `warn`
    /// or `debug` so they do not drown real failures.
    pub fn log_with_context(&self, context: &ErrorContext) {
        match self {
            Self::Database(_) | Self::InternalState(_) | Self::Io(_) => {
                tracing::error!(
                    error = %self,
                    request_id = %context.request_id,
                    user_id = ?context.user_id,
                    operation = %context.operation,
                    "Critical error occurred"
                );
            }
            Self::RateLimited { retry_after_ms } => {
                tracing::warn!(
                    error = %self,
                    request_id = %context.request_id,
                    user_id = ?context.user_id,
                    operation = %context.operation,
                    retry_after_ms = retry_after_ms,
                    "Rate limited"
                );
            }
            Self::Config(_) | Self::RegexPattern(_) => {
                tracing::error!(
                    error = %self,
                    request_id = %context.request_id,
                    operation = %context.operation,
                    "Configuration error"
                );
            }
            Self::Json(_) => {
                tracing::error!(
                    error = %self,
                    request_id = %context.request_id,
                    user_id = ?context.user_id,
                    operation = %context.operation,
                    "Data processing error"
                );
            }
            Self::Validation(_) | Self::Auth(_) | Self::Forbidden(_) | Self::NotFound(_) => {
                tracing::debug!(
                    error = %self,
                    request_id = %context.request_id,
                    user_id = ?context.user_id,
                    operation = %context.operation,
                    "Request rejected"
                );
            }
        }
    }

    /// Check if this error is critical and requires alerting.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::InternalState(_) | Self::Io(_)
        )
    }

    /// Get user-friendly error message (hides internal details).
    ///
    /// Validation, auth, and not-found messages are written for the caller
    /// and pass through as-is; everything else is redacted.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::Auth(msg) => msg.clone(),
            Self::Forbidden(msg) => msg.clone(),
            Self::NotFound(msg) => msg.clone(),
            Self::RateLimited { .. } => "Too many requests, please try again later".to_string(),
            Self::Config(_) => "Service configuration error".to_string(),
            Self::InternalState(_) => "Internal service error".to_string(),
            Self::RegexPattern(_) => "Invalid pattern configuration".to_string(),
            Self::Json(_) => "Data format error".to_string(),
            Self::Database(_) => "Database service temporarily unavailable".to_string(),
            Self::Io(_) => "File system error".to_string(),
        }
    }
}

/// Context information for error logging.
///
/// Provides structured context for debugging and monitoring.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Unique request identifier for correlation.
    pub request_id: String,
    /// User ID if available.
    pub user_id: Option<i64>,
    /// Operation being performed.
    pub operation: String,
}

impl ErrorContext {
    /// Create a new error context.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            user_id: None,
            operation: operation.into(),
        }
    }

    /// Set user ID.
    pub fn with_user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Set request ID.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }
}

/// Result type alias for antiphish operations.
pub type Result<T> = std::result::Result<T, AntiphishError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_validation() {
        let err = AntiphishError::Validation("Content is required".to_string());
        assert_eq!(err.to_string(), "Validation error: Content is required");
    }

    #[test]
    fn error_display_rate_limited() {
        let err = AntiphishError::RateLimited {
            retry_after_ms: 5000,
        };
        assert_eq!(err.to_string(), "Rate limited, retry after 5000ms");
    }

    #[test]
    fn error_display_config() {
        let err = AntiphishError::Config("DATABASE_PATH not set".to_string());
        assert_eq!(err.to_string(), "Configuration error: DATABASE_PATH not set");
    }

    #[test]
    fn error_is_critical() {
        assert!(AntiphishError::Database("test".to_string()).is_critical());
        assert!(AntiphishError::InternalState("test".to_string()).is_critical());
        assert!(AntiphishError::Io("test".to_string()).is_critical());
        assert!(!AntiphishError::RateLimited {
            retry_after_ms: 1000
        }
        .is_critical());
        assert!(!AntiphishError::Validation("test".to_string()).is_critical());
    }

    #[test]
    fn error_user_message_hides_details() {
        let err = AntiphishError::Database("SELECT * FROM sessions".to_string());
        assert_eq!(
            err.user_message(),
            "Database service temporarily unavailable"
        );
        assert!(!err.user_message().contains("sessions"));

        let err = AntiphishError::InternalState("panic at line 42".to_string());
        assert_eq!(err.user_message(), "Internal service error");
        assert!(!err.user_message().contains("panic"));
    }

    #[test]
    fn error_user_message_passes_validation_through() {
        let err = AntiphishError::Validation("Password must be at least 6 characters".to_string());
        assert_eq!(
            err.user_message(),
            "Password must be at least 6 characters"
        );
    }

    #[test]
    fn error_context_builder() {
        let ctx = ErrorContext::new("submit_message")
            .with_user_id(42)
            .with_request_id("req-123");

        assert_eq!(ctx.operation, "submit_message");
        assert_eq!(ctx.user_id, Some(42));
        assert_eq!(ctx.request_id, "req-123");
    }

    #[test]
    fn error_context_generates_request_id() {
        let ctx1 = ErrorContext::new("op1");
        let ctx2 = ErrorContext::new("op2");

        assert_ne!(ctx1.request_id, ctx2.request_id);
        assert!(!ctx1.request_id.is_empty());
    }
}
