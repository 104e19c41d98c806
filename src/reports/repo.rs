use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;

use super::{
    repo_types::{
        LeaderboardEntry, NewReport, Page, Report, ReportFilter, ReportRow, ReportStats,
    },
};
use crate::db::{bounded, StoreError};

pub const LEADERBOARD_SIZE: i64 = 10;

#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn insert(&self, new: &NewReport) -> Result<Report, StoreError>;

    async fn get(&self, id: i64) -> Result<Report, StoreError>;

    /// Newest first.
    async fn list(&self, filter: &ReportFilter, page: Page) -> Result<Vec<Report>, StoreError>;

    /// Newest first, only reports authored by `user_id`.
    async fn list_by_user(&self, user_id: i64, page: Page) -> Result<Vec<Report>, StoreError>;

    /// Writes the status fields of `next` over the row for `current.id`, but
    /// only while the stored status and `completed_at` still equal those in
    /// `current`. Otherwise fails with `EditConflict`.
    async fn update_status(&self, current: &Report, next: &Report) -> Result<(), StoreError>;

    async fn stats(&self) -> Result<ReportStats, StoreError>;

    async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, StoreError>;
}

#[derive(Clone)]
pub struct PgReportStore {
    db: PgPool,
    timeout: Duration,
}

impl PgReportStore {
    pub fn new(db: PgPool, timeout: Duration) -> Self {
        Self { db, timeout }
    }
}

fn into_reports(rows: Vec<ReportRow>) -> Result<Vec<Report>, StoreError> {
    rows.into_iter().map(Report::try_from).collect()
}

#[async_trait]
impl ReportStore for PgReportStore {
    async fn insert(&self, new: &NewReport) -> Result<Report, StoreError> {
        let query = sqlx::query_as::<_, ReportRow>(
            r#"
            INSERT INTO reports (user_id, title, description, category, location, before_image, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'pending')
            RETURNING id, user_id, title, description, category, location,
                      before_image, after_image, status, created_at, updated_at,
                      completed_at, NULL::TEXT AS user_name
            "#,
        )
        .bind(new.user_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.category.as_str())
        .bind(&new.location)
        .bind(&new.before_image)
        .fetch_one(&self.db);

        bounded(self.timeout, query).await?.try_into()
    }

    async fn get(&self, id: i64) -> Result<Report, StoreError> {
        let query = sqlx::query_as::<_, ReportRow>(
            r#"
            SELECT r.id, r.user_id, r.title, r.description, r.category, r.location,
                   r.before_image, r.after_image, r.status, r.created_at, r.updated_at,
                   r.completed_at, u.name AS user_name
            FROM reports r
            INNER JOIN users u ON r.user_id = u.id
            WHERE r.id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.db);

        bounded(self.timeout, query).await?.try_into()
    }

    async fn list(&self, filter: &ReportFilter, page: Page) -> Result<Vec<Report>, StoreError> {
        let query = sqlx::query_as::<_, ReportRow>(
            r#"
            SELECT r.id, r.user_id, r.title, r.description, r.category, r.location,
                   r.before_image, r.after_image, r.status, r.created_at, r.updated_at,
                   r.completed_at, u.name AS user_name
            FROM reports r
            INNER JOIN users u ON r.user_id = u.id
            WHERE ($3::TEXT IS NULL OR r.status = $3)
              AND ($4::TEXT IS NULL OR r.category = $4)
            ORDER BY r.created_at DESC, r.id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit)
        .bind(page.offset)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.category.map(|c| c.as_str()))
        .fetch_all(&self.db);

        into_reports(bounded(self.timeout, query).await?)
    }

    async fn list_by_user(&self, user_id: i64, page: Page) -> Result<Vec<Report>, StoreError> {
        let query = sqlx::query_as::<_, ReportRow>(
            r#"
            SELECT r.id, r.user_id, r.title, r.description, r.category, r.location,
                   r.before_image, r.after_image, r.status, r.created_at, r.updated_at,
                   r.completed_at, u.name AS user_name
            FROM reports r
            INNER JOIN users u ON r.user_id = u.id
            WHERE r.user_id = $1
            ORDER BY r.created_at DESC, r.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.db);

        into_reports(bounded(self.timeout, query).await?)
    }

    async fn update_status(&self, current: &Report, next: &Report) -> Result<(), StoreError> {
        let query = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE reports
            SET status = $1, after_image = $2, completed_at = $3, updated_at = $4
            WHERE id = $5
              AND status = $6
              AND completed_at IS NOT DISTINCT FROM $7
            RETURNING id
            "#,
        )
        .bind(next.status.as_str())
        .bind(next.after_image.as_deref())
        .bind(next.completed_at)
        .bind(next.updated_at)
        .bind(current.id)
        .bind(current.status.as_str())
        .bind(current.completed_at)
        .fetch_one(&self.db);

        match bounded(self.timeout, query).await {
            Ok(_) => Ok(()),
            Err(StoreError::NotFound) => Err(StoreError::EditConflict),
            Err(e) => Err(e),
        }
    }

    async fn stats(&self) -> Result<ReportStats, StoreError> {
        let query = sqlx::query_as::<_, ReportStats>(
            r#"
            SELECT
                COUNT(*) AS total_reports,
                COUNT(*) FILTER (WHERE status = 'pending') AS pending_reports,
                COUNT(*) FILTER (WHERE status = 'in-progress') AS in_progress_reports,
                COUNT(*) FILTER (WHERE status = 'completed') AS completed_reports,
                COUNT(*) FILTER (WHERE status = 'rejected') AS rejected_reports
            FROM reports
            "#,
        )
        .fetch_one(&self.db);

        bounded(self.timeout, query).await
    }

    async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let query = sqlx::query_as::<_, LeaderboardEntry>(
            r#"
            SELECT u.id AS user_id, u.name AS user_name, u.phone_number,
                   COUNT(r.id) AS report_count
            FROM users u
            INNER JOIN reports r ON u.id = r.user_id
            GROUP BY u.id, u.name, u.phone_number
            ORDER BY report_count DESC, u.id ASC
            LIMIT $1
            "#,
        )
        .bind(LEADERBOARD_SIZE)
        .fetch_all(&self.db);

        bounded(self.timeout, query).await
    }
}
