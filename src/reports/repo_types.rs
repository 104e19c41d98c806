use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

use super::lifecycle::{Category, ReportStatus};
use crate::db::StoreError;

/// Row shape shared by every report query. `user_name` comes from the users join.
#[derive(Debug, FromRow)]
pub struct ReportRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub before_image: String,
    pub after_image: Option<String>,
    pub status: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub completed_at: Option<OffsetDateTime>,
    pub user_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Report {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub location: String,
    pub before_image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_image: Option<String>,
    pub status: ReportStatus,
    #[serde(with = "crate::display_time")]
    pub created_at: OffsetDateTime,
    #[serde(with = "crate::display_time")]
    pub updated_at: OffsetDateTime,
    #[serde(
        with = "crate::display_time::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_at: Option<OffsetDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

impl TryFrom<ReportRow> for Report {
    type Error = StoreError;

    fn try_from(r: ReportRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            title: r.title,
            description: r.description,
            category: r.category.parse().map_err(StoreError::Decode)?,
            location: r.location,
            before_image: r.before_image,
            // Older rows store an empty string rather than NULL.
            after_image: r.after_image.filter(|s| !s.is_empty()),
            status: r.status.parse().map_err(StoreError::Decode)?,
            created_at: r.created_at,
            updated_at: r.updated_at,
            completed_at: r.completed_at,
            user_name: r.user_name,
        })
    }
}

/// Fields a citizen supplies when filing a report. Status is never among them.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub location: String,
    pub before_image: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub status: Option<ReportStatus>,
    pub category: Option<Category>,
}

#[derive(Debug, Clone, Default, Serialize, FromRow, PartialEq, Eq)]
pub struct ReportStats {
    pub total_reports: i64,
    pub pending_reports: i64,
    pub in_progress_reports: i64,
    pub completed_reports: i64,
    pub rejected_reports: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub user_id: i64,
    pub user_name: String,
    pub phone_number: String,
    pub report_count: i64,
}
