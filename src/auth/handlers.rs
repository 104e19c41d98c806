use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::instrument;

use crate::{
    auth::{
        claims::Role,
        dto::{AdminProfileResponse, LoginRequest, ProfileResponse, RegisterRequest},
        extractors::{AdminUser, AuthUser},
        services,
    },
    error::AppError,
    extract::JsonBody,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/user/register", post(register))
        .route("/user/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/user/me", get(get_me))
        .route("/admin/me", get(get_admin_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let user = services::register_user(state.users.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(json!({ "user": user }))))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let token = services::login(state.users.as_ref(), &state.jwt, payload).await?;
    Ok((StatusCode::CREATED, Json(json!({ "auth_token": token }))))
}

#[instrument]
pub async fn get_me(AuthUser(identity): AuthUser) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        user_id: identity.user_id,
        role: identity.role,
    })
}

#[instrument]
pub async fn get_admin_me(AdminUser(identity): AdminUser) -> Json<AdminProfileResponse> {
    Json(AdminProfileResponse {
        admin_id: identity.user_id,
        role: Role::Admin,
    })
}
