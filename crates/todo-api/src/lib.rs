//! HTTP API (axum) for the todo service.
//!
//! `/api/*` speaks protobuf through [`proto_router::ProtoRouter`]; `/` and
//! `/todos` serve HTML for the browser page.

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;

pub mod config;
pub mod error;
pub mod handlers;
pub mod store;
pub mod telemetry;

pub use store::Store;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

/// Builds the full router. The route table is fixed from here on.
pub fn app(state: AppState) -> Router {
    handlers::api::routes()
        .merge_native(handlers::html::routes())
        .route_native("/health", get(health))
        .with_state(state)
        .layer(middleware::from_fn(log_request))
}

async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    tracing::info!(%method, %path, "Incoming request");

    let response = next.run(req).await;
    let status = response.status();
    if status.is_server_error() {
        tracing::error!(%method, %path, status = status.as_u16(), "Request failed");
    } else {
        tracing::info!(%method, %path, status = status.as_u16(), "Request completed");
    }
    response
}

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthBody { status: "ok" }))
}
