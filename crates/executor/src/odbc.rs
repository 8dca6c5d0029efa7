//! Vendor-driver connectivity path: IBM DB2 through ODBC.

use async_trait::async_trait;
use odbc_api::{ConnectionOptions, Cursor, DataType, Environment, ResultSetMetadata};

use crate::{CellValue, DbConfig, ExecutorError, QueryBackend, Result, ResultSet, Row, VENDOR_DRIVER};

/// Backend that talks to DB2 using the semicolon-delimited vendor descriptor.
#[derive(Debug, Clone)]
pub struct OdbcBackend {
    available: bool,
}

impl OdbcBackend {
    /// Probes the ODBC driver manager once; the result fixes availability.
    pub fn new() -> Self {
        let available = match Environment::new() {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "ODBC environment unavailable, vendor backend disabled");
                false
            }
        };
        Self { available }
    }
}

impl Default for OdbcBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueryBackend for OdbcBackend {
    fn name(&self) -> &'static str {
        "odbc"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn unavailable_reason(&self) -> String {
        format!("{VENDOR_DRIVER} not installed in environment")
    }

    #[tracing::instrument(skip(self, config), fields(db = %config.display_string()))]
    async fn execute(&self, sql: &str, config: &DbConfig) -> Result<ResultSet> {
        if !self.available {
            return Err(ExecutorError::Unavailable(self.unavailable_reason()));
        }

        let descriptor = config.vendor_descriptor();
        let sql = sql.to_string();

        // odbc-api handles are not Send across awaits, so the whole session runs on a blocking thread
        tokio::task::spawn_blocking(move || run_session(&descriptor, &sql)).await?
    }
}

fn execution_error(e: odbc_api::Error) -> ExecutorError {
    ExecutorError::Execution(e.to_string())
}

/// Connects, runs `sql` and drains the cursor. The connection is released
/// when it goes out of scope, whichever way this function returns.
fn run_session(descriptor: &str, sql: &str) -> Result<ResultSet> {
    let env = Environment::new()
        .map_err(|e| ExecutorError::Connection(format!("ODBC environment error: {e}")))?;

    let conn = env
        .connect_with_connection_string(descriptor, ConnectionOptions::default())
        .map_err(|e| ExecutorError::Connection(e.to_string()))?;

    let Some(mut cursor) = conn.execute(sql, (), None).map_err(execution_error)? else {
        return Ok(ResultSet::new());
    };

    let names = cursor
        .column_names()
        .map_err(execution_error)?
        .collect::<std::result::Result<Vec<String>, _>>()
        .map_err(execution_error)?;

    let mut kinds = Vec::with_capacity(names.len());
    for column in 1..=names.len() as u16 {
        kinds.push(ColumnKind::from(
            cursor.col_data_type(column).map_err(execution_error)?,
        ));
    }

    let mut rows = ResultSet::new();
    let mut buf = Vec::new();
    while let Some(mut cursor_row) = cursor.next_row().map_err(execution_error)? {
        let mut row = Row::with_capacity(names.len());
        for (index, (name, kind)) in names.iter().zip(&kinds).enumerate() {
            buf.clear();
            let present = cursor_row
                .get_text(index as u16 + 1, &mut buf)
                .map_err(execution_error)?;
            let value = if present {
                kind.parse(&String::from_utf8_lossy(&buf))
            } else {
                CellValue::Null
            };
            row.push(name.as_str(), value);
        }
        rows.push(row);
    }
    Ok(rows)
}

/// How a column's text representation is turned into a JSON value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Integer,
    Float,
    Text,
}

impl From<DataType> for ColumnKind {
    fn from(data_type: DataType) -> Self {
        match data_type {
            DataType::TinyInt | DataType::SmallInt | DataType::Integer | DataType::BigInt => {
                ColumnKind::Integer
            }
            DataType::Real | DataType::Double | DataType::Float { .. } => ColumnKind::Float,
            _ => ColumnKind::Text,
        }
    }
}

impl ColumnKind {
    fn parse(self, text: &str) -> CellValue {
        let trimmed = text.trim();
        match self {
            ColumnKind::Integer => trimmed
                .parse()
                .map(CellValue::Integer)
                .unwrap_or_else(|_| CellValue::Text(text.to_string())),
            ColumnKind::Float => trimmed
                .parse()
                .map(CellValue::Float)
                .unwrap_or_else(|_| CellValue::Text(text.to_string())),
            ColumnKind::Text => CellValue::Text(text.to_string()),
        }
    }
}
