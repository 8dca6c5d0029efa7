//! Generic-toolkit connectivity path built on sqlx's `Any` driver.

use async_trait::async_trait;
use futures_util::TryStreamExt;
use sqlx::AnyConnection;
use sqlx::any::AnyRow;
use sqlx::{Column, Connection, Row as _, TypeInfo};

use crate::{CellValue, DbConfig, ExecutorError, QueryBackend, Result, ResultSet, Row};

/// URL schemes served by the sqlx drivers compiled into this crate.
pub const SUPPORTED_SCHEMES: &[&str] = &["postgres", "postgresql", "mysql", "mariadb"];

/// Default URL scheme when none is configured.
pub const DEFAULT_SCHEME: &str = "postgres";

/// Backend that connects through a `<scheme>://user:pwd@host:port/db` URL.
#[derive(Debug, Clone)]
pub struct SqlxBackend {
    scheme: String,
    available: bool,
}

impl SqlxBackend {
    /// Creates a backend for `scheme`.
    ///
    /// The backend is unavailable when no compiled driver handles the scheme.
    pub fn new(scheme: impl Into<String>) -> Self {
        sqlx::any::install_default_drivers();

        let scheme = scheme.into();
        let available = SUPPORTED_SCHEMES.contains(&scheme.as_str());
        if !available {
            tracing::warn!(%scheme, "no sqlx driver for scheme, toolkit backend disabled");
        }
        Self { scheme, available }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }
}

impl Default for SqlxBackend {
    fn default() -> Self {
        Self::new(DEFAULT_SCHEME)
    }
}

#[async_trait]
impl QueryBackend for SqlxBackend {
    fn name(&self) -> &'static str {
        "sqlx"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn unavailable_reason(&self) -> String {
        format!("sqlx {} driver not installed in environment", self.scheme)
    }

    #[tracing::instrument(skip(self, config), fields(scheme = %self.scheme, db = %config.display_string()))]
    async fn execute(&self, sql: &str, config: &DbConfig) -> Result<ResultSet> {
        if !self.available {
            return Err(ExecutorError::Unavailable(self.unavailable_reason()));
        }

        let url = config.url_descriptor(&self.scheme);
        let mut conn = AnyConnection::connect(&url)
            .await
            .map_err(|e| ExecutorError::Connection(e.to_string()))?;

        let result = fetch_rows(&mut conn, sql).await;

        if let Err(e) = conn.close().await {
            tracing::warn!(error = %e, "failed to close connection cleanly");
        }
        result
    }
}

async fn fetch_rows(conn: &mut AnyConnection, sql: &str) -> Result<ResultSet> {
    let mut stream = sqlx::query(sql).fetch(conn);
    let mut rows = ResultSet::new();

    while let Some(row) = stream
        .try_next()
        .await
        .map_err(|e| ExecutorError::Execution(e.to_string()))?
    {
        rows.push(convert_row(&row)?);
    }
    Ok(rows)
}

/// How a column is decoded, chosen from the `Any` driver's type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Null,
    Bool,
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    Blob,
    Text,
}

impl ColumnKind {
    fn from_type_name(type_name: &str) -> Self {
        match type_name {
            "NULL" => ColumnKind::Null,
            "BOOLEAN" => ColumnKind::Bool,
            "SMALLINT" => ColumnKind::SmallInt,
            "INTEGER" => ColumnKind::Integer,
            "BIGINT" => ColumnKind::BigInt,
            "REAL" => ColumnKind::Real,
            "DOUBLE" => ColumnKind::Double,
            "BLOB" => ColumnKind::Blob,
            _ => ColumnKind::Text,
        }
    }
}

/// Converts a sqlx AnyRow to our Row type.
fn convert_row(row: &AnyRow) -> Result<Row> {
    let mut converted = Row::with_capacity(row.len());
    for col in row.columns() {
        let kind = ColumnKind::from_type_name(col.type_info().name());
        converted.push(col.name(), convert_value(row, col.ordinal(), kind)?);
    }
    Ok(converted)
}

/// Decodes a single column. SQL NULL is the only source of `CellValue::Null`;
/// a value that does not decode as `kind` fails the whole statement.
fn convert_value(row: &AnyRow, index: usize, kind: ColumnKind) -> Result<CellValue> {
    let value = match kind {
        ColumnKind::Null => None,
        ColumnKind::Bool => decode::<bool>(row, index)?.map(|v| CellValue::Integer(i64::from(v))),
        ColumnKind::SmallInt => decode::<i16>(row, index)?.map(|v| CellValue::Integer(v.into())),
        ColumnKind::Integer => decode::<i32>(row, index)?.map(|v| CellValue::Integer(v.into())),
        ColumnKind::BigInt => decode::<i64>(row, index)?.map(CellValue::Integer),
        ColumnKind::Real => decode::<f32>(row, index)?.map(|v| CellValue::Float(v.into())),
        ColumnKind::Double => decode::<f64>(row, index)?.map(CellValue::Float),
        ColumnKind::Blob => decode::<Vec<u8>>(row, index)?
            .map(|v| CellValue::Text(String::from_utf8_lossy(&v).into_owned())),
        ColumnKind::Text => decode::<String>(row, index)?.map(CellValue::Text),
    };
    Ok(value.unwrap_or(CellValue::Null))
}

fn decode<T>(row: &AnyRow, index: usize) -> Result<Option<T>>
where
    for<'r> T: sqlx::Decode<'r, sqlx::Any> + sqlx::Type<sqlx::Any>,
{
    row.try_get::<Option<T>, _>(index)
        .map_err(|e| ExecutorError::Execution(e.to_string()))
}
