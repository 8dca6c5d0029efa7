//! Query executor for the fixed-query service.
//!
//! Turns database credentials into a connection descriptor, opens one
//! connection per call, runs a single statement and materialises every row
//! as an ordered column-to-value map. Two connectivity paths are provided
//! behind [`QueryBackend`]: the DB2 vendor driver over ODBC (cargo feature
//! `odbc`) and sqlx's generic `Any` driver.

pub mod backend;
pub mod config;
pub mod error;
pub mod memory;
#[cfg(feature = "odbc")]
pub mod odbc;
pub mod row;
pub mod toolkit;

use std::sync::Arc;

pub use backend::{QueryBackend, QueryBackendExt, UnavailableBackend};
pub use config::DbConfig;
pub use error::{ExecutorError, Result};
pub use memory::StaticBackend;
#[cfg(feature = "odbc")]
pub use odbc::OdbcBackend;
pub use row::{CellValue, ResultSet, Row};
pub use toolkit::SqlxBackend;

/// Name of the vendor client reported when the ODBC path is not compiled in.
pub const VENDOR_DRIVER: &str = "ibm_db";

/// Creates the vendor-driver backend for this build.
///
/// Without the `odbc` feature the returned backend is permanently unavailable.
pub fn vendor_backend() -> Arc<dyn QueryBackend> {
    #[cfg(feature = "odbc")]
    {
        Arc::new(OdbcBackend::new())
    }
    #[cfg(not(feature = "odbc"))]
    {
        Arc::new(UnavailableBackend::new("odbc", VENDOR_DRIVER))
    }
}
