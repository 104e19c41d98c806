use time::{Duration, OffsetDateTime};
use tracing::{info, warn};

use super::{
    dto::{CreateReportRequest, ListParams, UpdateStatusRequest},
    lifecycle::{Category, ReportStatus, StatusChange, TransitionPolicy},
    repo::ReportStore,
    repo_types::{NewReport, Report, ReportFilter},
};
use crate::{
    auth::claims::Identity,
    db::StoreError,
    error::AppError,
    validator::{char_len, permitted_value, Validator},
};

pub fn validate_report(v: &mut Validator, input: &CreateReportRequest) {
    v.check(!input.title.is_empty(), "title", "title must be provided");
    v.check(char_len(&input.title) <= 200, "title", "title must not be more than 200 characters");
    v.check(!input.description.is_empty(), "description", "description must be provided");
    v.check(
        char_len(&input.description) <= 2000,
        "description",
        "description must not be more than 2000 characters",
    );
    v.check(!input.category.is_empty(), "category", "category must be provided");
    v.check(permitted_value(&input.category, &Category::ALL), "category", "invalid category");
    v.check(!input.location.is_empty(), "location", "location must be provided");
    v.check(
        char_len(&input.location) <= 500,
        "location",
        "location must not be more than 500 characters",
    );
    v.check(!input.before_image.is_empty(), "before_image", "before image must be provided");
}

/// Files a new report as `author`. Status always starts at `pending`.
pub async fn create_report(
    reports: &dyn ReportStore,
    author: &Identity,
    input: CreateReportRequest,
) -> Result<Report, AppError> {
    let mut v = Validator::new();
    validate_report(&mut v, &input);
    v.into_result()?;

    let category: Category = input
        .category
        .parse()
        .map_err(|_| AppError::field("category", "invalid category"))?;

    let report = reports
        .insert(&NewReport {
            user_id: author.user_id,
            title: input.title,
            description: input.description,
            category,
            location: input.location,
            before_image: input.before_image,
        })
        .await?;
    info!(report_id = report.id, user_id = author.user_id, "report created");
    Ok(report)
}

pub async fn get_report(reports: &dyn ReportStore, id: i64) -> Result<Report, AppError> {
    Ok(reports.get(id).await?)
}

pub async fn list_reports(
    reports: &dyn ReportStore,
    params: &ListParams,
) -> Result<Vec<Report>, AppError> {
    let filter = parse_filter(params)?;
    Ok(reports.list(&filter, params.page()).await?)
}

/// Lists the caller's own reports. The author is always the authenticated
/// identity; nothing in the request can widen it.
pub async fn list_own_reports(
    reports: &dyn ReportStore,
    caller: &Identity,
    params: &ListParams,
) -> Result<Vec<Report>, AppError> {
    Ok(reports.list_by_user(caller.user_id, params.page()).await?)
}

/// Moves a report to a new status. Validation runs before any storage call.
///
/// The new state is computed by [`Report::apply`] from the row as read, and
/// written back only if nobody changed its status or `completed_at` in the
/// meantime; a lost race is an edit conflict.
pub async fn update_status(
    reports: &dyn ReportStore,
    policy: TransitionPolicy,
    id: i64,
    input: UpdateStatusRequest,
) -> Result<Report, AppError> {
    let change = StatusChange::parse(&input.status, &input.after_image)
        .map_err(|v| AppError::Validation(v.into_errors()))?;

    let current = reports.get(id).await?;
    if !policy.allows(current.status, change.status) {
        warn!(report_id = id, from = current.status.as_str(), to = change.status.as_str(), "status move refused");
        return Err(AppError::field(
            "status",
            &format!(
                "cannot move a {} report to {}",
                current.status.as_str(),
                change.status.as_str()
            ),
        ));
    }

    let mut next = current.clone();
    next.apply(&change, storage_now());

    if let Err(e) = reports.update_status(&current, &next).await {
        if matches!(e, StoreError::EditConflict) {
            warn!(report_id = id, "report changed during status update");
        }
        return Err(e.into());
    }
    info!(report_id = id, status = next.status.as_str(), "report status updated");

    Ok(next)
}

/// Current time at the microsecond precision Postgres stores.
fn storage_now() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now - Duration::nanoseconds(i64::from(now.nanosecond() % 1_000))
}

fn parse_filter(params: &ListParams) -> Result<ReportFilter, AppError> {
    let mut v = Validator::new();
    let mut filter = ReportFilter::default();

    if let Some(raw) = params.status.as_deref().filter(|s| !s.is_empty()) {
        match raw.parse::<ReportStatus>() {
            Ok(s) => filter.status = Some(s),
            Err(_) => v.add_error("status", "invalid status"),
        }
    }
    if let Some(raw) = params.category.as_deref().filter(|s| !s.is_empty()) {
        match raw.parse::<Category>() {
            Ok(c) => filter.category = Some(c),
            Err(_) => v.add_error("category", "invalid category"),
        }
    }

    v.into_result()?;
    Ok(filter)
}
