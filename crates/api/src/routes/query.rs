//! Fixed-query endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use executor::{DbConfig, QueryBackend, QueryBackendExt, ResultSet};
use serde::Serialize;

use crate::error::ApiError;

/// Statement run by `POST /query`.
pub const QUERY_SQL: &str = "SELECT * FROM DB2INST1.USERS";

/// Statement run by `GET /get_users`.
pub const USERS_SQL: &str = "SELECT ID, NAME, EMAIL FROM DB2INST1.USERS";

/// Shared application state accessible from all handlers.
///
/// Built once at startup and never mutated.
pub struct AppState {
    /// `None` when the environment does not carry all five credentials.
    pub db: Option<DbConfig>,
    /// Serves `POST /query`.
    pub vendor: Arc<dyn QueryBackend>,
    /// Serves `GET /get_users`.
    pub toolkit: Arc<dyn QueryBackend>,
    pub query_sql: String,
    pub users_sql: String,
}

impl AppState {
    /// Creates state running the default fixed statements.
    pub fn new(
        db: Option<DbConfig>,
        vendor: Arc<dyn QueryBackend>,
        toolkit: Arc<dyn QueryBackend>,
    ) -> Self {
        Self {
            db,
            vendor,
            toolkit,
            query_sql: QUERY_SQL.to_string(),
            users_sql: USERS_SQL.to_string(),
        }
    }

    /// Replaces the statement run by `POST /query`.
    pub fn with_query_sql(mut self, sql: impl Into<String>) -> Self {
        self.query_sql = sql.into();
        self
    }
}

#[derive(Serialize)]
pub struct RowsResponse {
    pub rows: ResultSet,
}

/// POST /query — run the fixed statement through the vendor backend.
///
/// The request body is never read.
#[tracing::instrument(skip(state))]
pub async fn query(State(state): State<Arc<AppState>>) -> Result<Json<RowsResponse>, ApiError> {
    let sql = state.query_sql.as_str();
    if sql.is_empty() {
        return Err(ApiError::MissingSql);
    }
    if !is_select(sql) {
        return Err(ApiError::DisallowedStatement);
    }

    run(state.vendor.as_ref(), state.db.as_ref(), sql).await
}

/// GET /get_users — run the fixed three-column statement through the toolkit backend.
#[tracing::instrument(skip(state))]
pub async fn get_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RowsResponse>, ApiError> {
    run(state.toolkit.as_ref(), state.db.as_ref(), &state.users_sql).await
}

async fn run(
    backend: &dyn QueryBackend,
    db: Option<&DbConfig>,
    sql: &str,
) -> Result<Json<RowsResponse>, ApiError> {
    if !backend.is_available() {
        return Err(ApiError::DriverUnavailable(backend.unavailable_reason()));
    }
    let db = db.ok_or(ApiError::ConfigurationMissing)?;

    let rows = backend.execute_recorded(sql, db).await?;
    Ok(Json(RowsResponse { rows }))
}

/// True when the trimmed statement starts with `select`, ignoring case.
pub fn is_select(sql: &str) -> bool {
    sql.trim().to_lowercase().starts_with("select")
}
