//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every `GET` that is not an API route is a console page navigation and runs
//! through the bootstrap gate. The JSON endpoints under `/api` read the
//! visitor's applied products and write server settings upstream.

pub mod navigate;
pub mod products;
pub mod settings;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, put};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/products", get(products::list_products))
        .route(
            "/api/settings/{id}",
            put(settings::update_setting).post(settings::ensure_setting),
        )
        .fallback(navigate::navigate)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
