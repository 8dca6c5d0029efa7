//! HTTP service exposing a liveness check and fixed SQL queries as JSON.
//!
//! `POST /query` goes through the vendor-driver backend, `GET /get_users`
//! through the sqlx toolkit backend. Requests are traced and query metrics
//! are exported on `/metrics`.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use executor::{DbConfig, QueryBackend, SqlxBackend};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::trace::TraceLayer;

use config::Config;
use routes::query::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::status::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/ping", get(routes::status::ping))
        .route("/query", post(routes::query::query))
        .route("/get_users", get(routes::query::get_users))
        .with_state(state)
        .merge(metrics_router)
        .layer(TraceLayer::new_for_http())
}

/// Creates the production state: the vendor backend for this build and a
/// sqlx backend for the configured scheme.
pub fn create_default_state(config: &Config, db: Option<DbConfig>) -> Arc<AppState> {
    let vendor = executor::vendor_backend();
    let toolkit = Arc::new(SqlxBackend::new(config.db_scheme.as_str()));

    tracing::info!(
        vendor = vendor.name(),
        vendor_available = vendor.is_available(),
        scheme = %toolkit.scheme(),
        toolkit_available = toolkit.is_available(),
        db_configured = db.is_some(),
        "query backends initialised"
    );

    Arc::new(AppState::new(db, vendor, toolkit))
}
