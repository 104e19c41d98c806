use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::instrument;

use super::{
    dto::{CreateReportRequest, ListParams, UpdateStatusRequest},
    services,
};
use crate::{
    auth::extractors::{AdminUser, AuthUser},
    error::AppError,
    extract::{parse_id, JsonBody, QueryParams},
    state::AppState,
};

pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/reports", get(list_reports).post(create_report))
        .route("/reports/stats", get(get_stats))
        .route("/reports/:id", get(get_report).patch(update_report_status))
        .route("/user/reports", get(list_own_reports))
        .route("/leaderboard", get(get_leaderboard))
}

// --- handlers ---

#[instrument(skip(state))]
pub async fn list_reports(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<ListParams>,
) -> Result<Json<Value>, AppError> {
    let reports = services::list_reports(state.reports.as_ref(), &params).await?;
    Ok(Json(json!({ "reports": reports })))
}

#[instrument(skip(state))]
pub async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&id)?;
    let report = services::get_report(state.reports.as_ref(), id).await?;
    Ok(Json(json!({ "report": report })))
}

#[instrument(skip(state, payload))]
pub async fn create_report(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    JsonBody(payload): JsonBody<CreateReportRequest>,
) -> Result<(StatusCode, HeaderMap, Json<Value>), AppError> {
    let report = services::create_report(state.reports.as_ref(), &identity, payload).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/v1/reports/{}", report.id)) {
        headers.insert(header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(json!({ "report": report }))))
}

#[instrument(skip(state, payload))]
pub async fn update_report_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&id)?;
    let report = services::update_status(
        state.reports.as_ref(),
        state.config.transition_policy,
        id,
        payload,
    )
    .await?;
    Ok(Json(json!({ "report": report })))
}

#[instrument(skip(state))]
pub async fn list_own_reports(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    QueryParams(params): QueryParams<ListParams>,
) -> Result<Json<Value>, AppError> {
    let reports = services::list_own_reports(state.reports.as_ref(), &identity, &params).await?;
    Ok(Json(json!({ "reports": reports })))
}

#[instrument(skip(state))]
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let stats = state.reports.stats().await?;
    Ok(Json(json!({ "stats": stats })))
}

#[instrument(skip(state))]
pub async fn get_leaderboard(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let leaderboard = state.reports.leaderboard().await?;
    Ok(Json(json!({ "leaderboard": leaderboard })))
}
