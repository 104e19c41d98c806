use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::instrument;

use super::{dto::ProductRequest, services};
use crate::{
    auth::extractors::AdminUser,
    error::AppError,
    extract::{parse_id, JsonBody},
    state::AppState,
};

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products", post(create_product))
        .route("/products/:id", get(get_product).put(update_product))
}

#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&id)?;
    let product = services::get_product(state.products.as_ref(), id).await?;
    Ok(Json(json!({ "product": product })))
}

#[instrument(skip(state, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    JsonBody(payload): JsonBody<ProductRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let product = services::create_product(state.products.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(json!({ "product": product }))))
}

#[instrument(skip(state, payload))]
pub async fn update_product(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<ProductRequest>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&id)?;
    let product = services::update_product(state.products.as_ref(), id, payload).await?;
    Ok(Json(json!({ "product": product })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::Role;
    use crate::testing::{call, fake_state, token_for};
    use axum::http::Method;

    fn body() -> Value {
        json!({
            "name": "Traffic cone",
            "description": "Orange, 70cm",
            "price": 2500,
            "stock_available": 40,
            "image_url": "https://img.example/cone.jpg"
        })
    }

    #[tokio::test]
    async fn only_admins_create_products() {
        let state = fake_state();
        let router = crate::app::build_app(state.clone());
        let user = token_for(&state, 2, Role::User);
        let admin = token_for(&state, 1, Role::Admin);

        let (status, _) = call(&router, Method::POST, "/v1/products", Some(&user), Some(body())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, created) =
            call(&router, Method::POST, "/v1/products", Some(&admin), Some(body())).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["product"]["id"].as_i64().unwrap();

        let (status, fetched) =
            call(&router, Method::GET, &format!("/v1/products/{id}"), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["product"]["name"], "Traffic cone");
    }

    #[tokio::test]
    async fn update_validates_and_reports_missing() {
        let state = fake_state();
        let router = crate::app::build_app(state.clone());
        let admin = token_for(&state, 1, Role::Admin);

        let (status, _) =
            call(&router, Method::PUT, "/v1/products/9", Some(&admin), Some(body())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let mut bad = body();
        bad["stock_available"] = json!(0);
        let (status, resp) =
            call(&router, Method::PUT, "/v1/products/9", Some(&admin), Some(bad)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(resp["error"]["stock_available"].is_string());
    }
}
