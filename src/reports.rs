//! User-filed reports and the moderator review workflow.
//!
//! Users flag a message or a raw URL for human review; moderators move
//! reports from `open` to `confirmed` or `dismissed`.

use std::sync::Arc;

use crate::database::Database;
use crate::error::{AntiphishError, Result};
use crate::models::{Report, ReportStatus};

/// Maximum accepted length of report details.
pub const MAX_DETAILS_LEN: usize = 1000;

/// Report service backed by the database.
pub struct ReportService {
    db: Arc<Database>,
}

impl ReportService {
    /// Create a new report service.
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// File a report. At least one of `message_id` / `url` must be given;
    /// a referenced message must belong to the reporter.
    pub async fn submit(
        &self,
        reporter_user_id: i64,
        message_id: Option<i64>,
        url: Option<&str>,
        details: Option<&str>,
    ) -> Result<Report> {
        if message_id.is_none() && url.is_none() {
            return Err(AntiphishError::Validation(
                "Report must reference a message or a URL".to_string(),
            ));
        }

        if let Some(details) = details {
            if details.len() > MAX_DETAILS_LEN {
                return Err(AntiphishError::Validation(format!(
                    "Details must not exceed {} characters",
                    MAX_DETAILS_LEN
                )));
            }
        }

        if let Some(message_id) = message_id {
            if self
                .db
                .get_message(message_id, reporter_user_id)
                .await?
                .is_none()
            {
                return Err(AntiphishError::NotFound("Message not found".to_string()));
            }
        }

        let report = self
            .db
            .create_report(message_id, Some(reporter_user_id), url, details)
            .await?;

        tracing::info!(report_id = report.id, reporter = reporter_user_id, "Report filed");
        Ok(report)
    }

    /// List reports, optionally filtered by status.
    pub async fn list(&self, status: Option<ReportStatus>) -> Result<Vec<Report>> {
        self.db.list_reports(status).await
    }

    /// Get a report by ID.
    pub async fn get(&self, report_id: i64) -> Result<Option<Report>> {
        self.db.get_report(report_id).await
    }

    /// Review a report: move it to `confirmed` or `dismissed`.
    ///
    /// Reopening is not a review action; only open reports can be reviewed.
    pub async fn review(
        &self,
        report_id: i64,
        status: ReportStatus,
        moderator_id: i64,
    ) -> Result<Report> {
        if status == ReportStatus::Open {
            return Err(AntiphishError::Validation(
                "Status must be confirmed or dismissed".to_string(),
            ));
        }

        let Some(existing) = self.db.get_report(report_id).await? else {
            return Err(AntiphishError::NotFound("Report not found".to_string()));
        };

        if existing.status != ReportStatus::Open {
            return Err(AntiphishError::Validation(
                "Report has already been reviewed".to_string(),
            ));
        }

        let updated = self
            .db
            .update_report_status(report_id, status, moderator_id)
            .await?
            .ok_or_else(|| AntiphishError::NotFound("Report not found".to_string()))?;

        tracing::info!(
            report_id = report_id,
            status = status.as_str(),
            moderator = moderator_id,
            "Report reviewed"
        );
        Ok(updated)
    }
}
