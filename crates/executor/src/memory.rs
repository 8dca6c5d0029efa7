use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::{DbConfig, ExecutorError, QueryBackend, Result, ResultSet};

#[derive(Debug, Clone)]
enum Outcome {
    Rows(ResultSet),
    ConnectionFailure(String),
    ExecutionFailure(String),
}

/// In-memory backend for testing.
///
/// Returns a fixed result for every statement and counts how many times it
/// was asked to execute. Clones share the counter.
#[derive(Debug, Clone)]
pub struct StaticBackend {
    outcome: Outcome,
    available: bool,
    executions: Arc<AtomicUsize>,
}

impl StaticBackend {
    /// A backend that answers every statement with `rows`.
    pub fn with_rows(rows: ResultSet) -> Self {
        Self::from_outcome(Outcome::Rows(rows))
    }

    /// A backend whose connection attempts always fail with `message`.
    pub fn failing_connection(message: impl Into<String>) -> Self {
        Self::from_outcome(Outcome::ConnectionFailure(message.into()))
    }

    /// A backend that connects but rejects every statement with `message`.
    pub fn failing_execution(message: impl Into<String>) -> Self {
        Self::from_outcome(Outcome::ExecutionFailure(message.into()))
    }

    /// Marks the backend as missing its driver.
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Number of `execute` calls so far.
    pub fn executions(&self) -> usize {
        self.executions.load(Ordering::SeqCst)
    }

    fn from_outcome(outcome: Outcome) -> Self {
        Self {
            outcome,
            available: true,
            executions: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl QueryBackend for StaticBackend {
    fn name(&self) -> &'static str {
        "static"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn unavailable_reason(&self) -> String {
        "static driver not installed in environment".to_string()
    }

    async fn execute(&self, _sql: &str, _config: &DbConfig) -> Result<ResultSet> {
        self.executions.fetch_add(1, Ordering::SeqCst);

        if !self.available {
            return Err(ExecutorError::Unavailable(self.unavailable_reason()));
        }

        match &self.outcome {
            Outcome::Rows(rows) => Ok(rows.clone()),
            Outcome::ConnectionFailure(msg) => Err(ExecutorError::Connection(msg.clone())),
            Outcome::ExecutionFailure(msg) => Err(ExecutorError::Execution(msg.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CellValue, Row};

    fn config() -> DbConfig {
        DbConfig {
            host: "h".into(),
            port: "1".into(),
            database: "d".into(),
            user: "u".into(),
            password: "p".into(),
        }
    }

    #[tokio::test]
    async fn test_returns_rows_and_counts_calls() {
        let row: Row = [("ID", CellValue::Integer(1))].into_iter().collect();
        let backend = StaticBackend::with_rows(vec![row.clone()]);
        let shared = backend.clone();

        assert_eq!(backend.execute("SELECT 1", &config()).await.unwrap(), vec![row]);
        assert_eq!(backend.execute("SELECT 1", &config()).await.unwrap().len(), 1);
        assert_eq!(shared.executions(), 2);
    }

    #[tokio::test]
    async fn test_failures_map_to_error_kinds() {
        let err = StaticBackend::failing_connection("refused")
            .execute("SELECT 1", &config())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Connection error: refused");

        let err = StaticBackend::failing_execution("SQL0204N")
            .execute("SELECT 1", &config())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Execution error: SQL0204N");
    }
}
