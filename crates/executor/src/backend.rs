use std::time::Instant;

use async_trait::async_trait;

use crate::{DbConfig, ExecutorError, ResultSet, Result};

/// Core trait for query backends.
///
/// A backend owns one connectivity path to the database. Each call to
/// [`QueryBackend::execute`] opens its own connection and closes it before
/// returning, on success and on failure alike.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Short identifier used in logs and metric labels.
    fn name(&self) -> &'static str;

    /// Whether the driver behind this backend can be used.
    ///
    /// Decided when the backend is constructed and never changes afterwards.
    fn is_available(&self) -> bool;

    /// Message returned to clients when the backend is unavailable.
    fn unavailable_reason(&self) -> String;

    /// Runs `sql` as a single immediate statement and collects every row.
    ///
    /// Any failure discards rows already fetched.
    async fn execute(&self, sql: &str, config: &DbConfig) -> Result<ResultSet>;
}

/// Extension trait providing convenience methods for backends.
#[async_trait]
pub trait QueryBackendExt: QueryBackend {
    /// Executes the statement and records count, failure and latency metrics.
    async fn execute_recorded(&self, sql: &str, config: &DbConfig) -> Result<ResultSet> {
        let backend = self.name();
        metrics::counter!("queries_total", "backend" => backend).increment(1);

        let start = Instant::now();
        let result = self.execute(sql, config).await;
        metrics::histogram!("query_duration_seconds", "backend" => backend)
            .record(start.elapsed().as_secs_f64());

        match &result {
            Ok(rows) => tracing::debug!(backend, rows = rows.len(), "query completed"),
            Err(e) => {
                metrics::counter!("query_failures_total", "backend" => backend).increment(1);
                tracing::warn!(backend, error = %e, "query failed");
            }
        }
        result
    }
}

// Blanket implementation for all QueryBackend implementations
impl<T: QueryBackend + ?Sized> QueryBackendExt for T {}

/// Stand-in for a driver that is not part of this build.
#[derive(Debug, Clone)]
pub struct UnavailableBackend {
    name: &'static str,
    driver: String,
}

impl UnavailableBackend {
    pub fn new(name: &'static str, driver: impl Into<String>) -> Self {
        Self {
            name,
            driver: driver.into(),
        }
    }
}

#[async_trait]
impl QueryBackend for UnavailableBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_available(&self) -> bool {
        false
    }

    fn unavailable_reason(&self) -> String {
        format!("{} not installed in environment", self.driver)
    }

    async fn execute(&self, _sql: &str, _config: &DbConfig) -> Result<ResultSet> {
        Err(ExecutorError::Unavailable(self.unavailable_reason()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DbConfig {
        DbConfig {
            host: "localhost".into(),
            port: "50000".into(),
            database: "SAMPLE".into(),
            user: "u".into(),
            password: "p".into(),
        }
    }

    #[tokio::test]
    async fn test_unavailable_backend_refuses_to_execute() {
        let backend = UnavailableBackend::new("vendor", "ibm_db");
        assert!(!backend.is_available());
        assert_eq!(
            backend.unavailable_reason(),
            "ibm_db not installed in environment"
        );

        let err = backend
            .execute_recorded("SELECT 1", &config())
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutorError::Unavailable(_)));
        assert_eq!(err.to_string(), "ibm_db not installed in environment");
    }
}
