use std::{any::Any, net::SocketAddr};

use axum::{
    extract::{DefaultBodyLimit, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use crate::{auth, config::AppConfig, error::AppError, products, reports, state::AppState};

pub const VERSION: &str = "1.0.0";

const MAX_BODY_BYTES: usize = 1_048_576;

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/v1",
            Router::new()
                .merge(auth::router())
                .merge(reports::router())
                .merge(products::router())
                .route("/healthcheck", get(healthcheck))
                .method_not_allowed_fallback(method_not_allowed),
        )
        .fallback(not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, ?latency, "response");
                        } else {
                            tracing::info!(%status, ?latency, "response");
                        }
                    },
                ),
        )
}

async fn not_found() -> AppError {
    AppError::NotFound
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// Turns a handler panic into the generic 500 envelope.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    AppError::Internal(anyhow::anyhow!("handler panicked: {detail}")).into_response()
}

async fn healthcheck(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "server": {
            "status": "available",
            "environment": state.config.env,
            "version": VERSION,
        }
    }))
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!(%addr, env = %config.env, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{call, fake_state};
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn healthcheck_reports_environment_and_version() {
        let router = build_app(fake_state());
        let (status, body) = call(&router, Method::GET, "/v1/healthcheck", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["server"]["status"], "available");
        assert_eq!(body["server"]["environment"], "test");
        assert_eq!(body["server"]["version"], VERSION);
    }

    #[tokio::test]
    async fn unknown_route_is_404_envelope() {
        let router = build_app(fake_state());
        let (status, body) = call(&router, Method::GET, "/v1/nowhere", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "the requested resource could not be found");

        let (status, body) = call(&router, Method::GET, "/elsewhere", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn wrong_method_is_405_envelope() {
        let router = build_app(fake_state());
        let (status, body) = call(&router, Method::DELETE, "/v1/healthcheck", None, None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["error"], "the method is not supported for this resource");

        let (status, body) = call(&router, Method::DELETE, "/v1/reports/1", None, None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert!(body["error"].is_string());
    }

    async fn explode() -> &'static str {
        panic!("exploded while handling")
    }

    #[tokio::test]
    async fn handler_panic_becomes_generic_500() {
        let router = Router::new()
            .route("/explode", get(explode))
            .layer(CatchPanicLayer::custom(handle_panic));
        let (status, body) = call(&router, Method::GET, "/explode", None, None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let message = body["error"].as_str().unwrap();
        assert!(!message.contains("exploded"));
    }
}
