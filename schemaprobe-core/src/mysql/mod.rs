//! MySQL backend.
//!
//! # Module Structure
//! - `connection`: connect options, session setup, error classification
//! - `schema`: column metadata from `INFORMATION_SCHEMA.COLUMNS`
//! - `sampling`: bounded row queries and value decoding
//!
//! # Guarantees
//! - Sessions are switched to read-only transactions by default
//! - Every statement is bounded by `max_execution_time`
//! - Table names are bound as parameters or backtick-quoted, never spliced raw

mod connection;
mod sampling;
mod schema;


pub use connection::classify_connect_error;
pub use sampling::{build_sample_query, quote_identifier};

use crate::config::{ConnectionConfig, Credentials};
use crate::connection::{Connector, DatabaseSession, RowSet};
use crate::error::{ConnectionError, SchemaError};
use crate::models::ColumnDescriptor;
use async_trait::async_trait;
use sqlx::{Connection, MySqlConnection};

/// Opens single MySQL connections (no pool: one run, one connection).
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlConnector;

impl MySqlConnector {
    /// Creates a connector.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for MySqlConnector {
    async fn connect(
        &self,
        config: &ConnectionConfig,
        credentials: &Credentials,
    ) -> Result<Box<dyn DatabaseSession>, ConnectionError> {
        let conn = connection::open(config, credentials).await?;
        Ok(Box::new(MySqlSession { conn }))
    }
}

/// A live MySQL connection.
pub struct MySqlSession {
    conn: MySqlConnection,
}

impl std::fmt::Debug for MySqlSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlSession").finish_non_exhaustive()
    }
}

#[async_trait]
impl DatabaseSession for MySqlSession {
    async fn fetch_columns(&mut self, table: &str) -> Result<Vec<ColumnDescriptor>, SchemaError> {
        schema::fetch_columns(&mut self.conn, table).await
    }

    async fn fetch_rows(
        &mut self,
        table: &str,
        limit: u32,
        order_by: Option<&str>,
    ) -> Result<RowSet, SchemaError> {
        sampling::fetch_rows(&mut self.conn, table, limit, order_by).await
    }

    async fn close(self: Box<Self>) -> Result<(), ConnectionError> {
        let session = *self;
        session
            .conn
            .close()
            .await
            .map_err(|e| ConnectionError::unreachable("closing connection", e))
    }
}
