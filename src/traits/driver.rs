use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ConnectOptions;
use crate::error::DriverResult;
use crate::types::{ColumnMetadata, DriverValue};

/// Trait for driver implementations.
/// A driver opens sessions against the remote query service; everything
/// about how it gets there (JDBC bridge, wire protocol, HTTP) is its own
/// business.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Open a session scoped to `options.schema_name`.
    async fn connect(&self, options: &ConnectOptions) -> DriverResult<Arc<dyn DriverSession>>;
}

/// An open driver session.
/// The connection serializes calls, so implementations never see two
/// statements in flight at once.
#[async_trait]
pub trait DriverSession: Send + Sync {
    /// Submit a statement and wait for its initial metadata.
    async fn execute_statement(&self, sql: &str) -> DriverResult<Box<dyn ResultSet>>;

    /// Release the session. Called at most once.
    async fn close(&self) -> DriverResult<()>;
}

/// The result handle of one executed statement.
#[async_trait]
pub trait ResultSet: Send {
    /// Column metadata; empty for statements that produce no result set.
    fn columns(&self) -> &[ColumnMetadata];

    /// Fetch up to `max_rows` rows. `None` signals the end of the result.
    async fn fetch_rows(&mut self, max_rows: usize) -> DriverResult<Option<Vec<Vec<DriverValue>>>>;

    /// Release the statement handle. Called at most once.
    async fn close(&mut self) -> DriverResult<()>;
}
