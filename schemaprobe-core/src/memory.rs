//! In-memory backend with call counters.
//!
//! Tables live in a `Vec`, limits are applied inside the "server" exactly as
//! a real backend would, and every connect, describe, sample and release is
//! counted so tests can assert on resource handling. Failures can be
//! injected at any stage.

use crate::config::{ConnectionConfig, Credentials};
use crate::connection::{Connector, DatabaseSession, RowSet};
use crate::error::{ConnectionError, SchemaError, Stage};
use crate::models::{ColumnDescriptor, SampleRow};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A table held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    /// Table name
    pub name: String,
    /// Columns in physical order
    pub columns: Vec<ColumnDescriptor>,
    /// Stored rows
    pub rows: Vec<SampleRow>,
}

impl MemoryTable {
    /// Creates an empty table with the given columns.
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Builder method appending a row given as `(column, value)` pairs.
    pub fn with_row<I, K>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, serde_json::Value)>,
        K: Into<String>,
    {
        self.rows
            .push(values.into_iter().map(|(k, v)| (k.into(), v)).collect());
        self
    }
}

/// Counts of backend calls made through a [`MemoryConnector`].
#[derive(Debug, Default)]
pub struct CallCounts {
    connects: AtomicUsize,
    describes: AtomicUsize,
    samples: AtomicUsize,
    releases: AtomicUsize,
}

impl CallCounts {
    /// Successful connects.
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Column metadata queries.
    pub fn describes(&self) -> usize {
        self.describes.load(Ordering::SeqCst)
    }

    /// Row queries.
    pub fn samples(&self) -> usize {
        self.samples.load(Ordering::SeqCst)
    }

    /// Session closes.
    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

/// Injected connection failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectFailure {
    /// Server unreachable
    Unreachable,
    /// Credentials rejected
    Authentication,
}

/// Connector over an in-memory set of tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    tables: Arc<Vec<MemoryTable>>,
    counts: Arc<CallCounts>,
    connect_failure: Option<ConnectFailure>,
    query_failure: Option<Stage>,
}

impl MemoryConnector {
    /// Creates a connector serving `tables`.
    pub fn new(tables: Vec<MemoryTable>) -> Self {
        Self {
            tables: Arc::new(tables),
            ..Default::default()
        }
    }

    /// Builder method making every connect attempt fail.
    pub fn failing_connect(mut self, failure: ConnectFailure) -> Self {
        self.connect_failure = Some(failure);
        self
    }

    /// Builder method making queries of one stage fail with `QueryFailed`.
    pub fn failing_query(mut self, stage: Stage) -> Self {
        self.query_failure = Some(stage);
        self
    }

    /// Shared call counters.
    pub fn counts(&self) -> Arc<CallCounts> {
        Arc::clone(&self.counts)
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(
        &self,
        config: &ConnectionConfig,
        _credentials: &Credentials,
    ) -> Result<Box<dyn DatabaseSession>, ConnectionError> {
        match self.connect_failure {
            Some(ConnectFailure::Unreachable) => Err(ConnectionError::unreachable(
                config.to_string(),
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused"),
            )),
            Some(ConnectFailure::Authentication) => Err(ConnectionError::authentication(
                config.to_string(),
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied"),
            )),
            None => {
                self.counts.connects.fetch_add(1, Ordering::SeqCst);
                Ok(Box::new(MemorySession {
                    tables: Arc::clone(&self.tables),
                    counts: Arc::clone(&self.counts),
                    query_failure: self.query_failure,
                }))
            }
        }
    }
}

struct MemorySession {
    tables: Arc<Vec<MemoryTable>>,
    counts: Arc<CallCounts>,
    query_failure: Option<Stage>,
}

impl MemorySession {
    fn fail_if(&self, stage: Stage, table: &str) -> Result<(), SchemaError> {
        if self.query_failure == Some(stage) {
            return Err(SchemaError::query_failed(
                table,
                format!("Injected {stage} failure"),
                std::io::Error::other("simulated driver error"),
            ));
        }
        Ok(())
    }

    fn table(&self, name: &str) -> Option<&MemoryTable> {
        self.tables.iter().find(|t| t.name == name)
    }
}

#[async_trait]
impl DatabaseSession for MemorySession {
    async fn fetch_columns(&mut self, table: &str) -> Result<Vec<ColumnDescriptor>, SchemaError> {
        self.counts.describes.fetch_add(1, Ordering::SeqCst);
        self.fail_if(Stage::Describe, table)?;
        Ok(self.table(table).map(|t| t.columns.clone()).unwrap_or_default())
    }

    async fn fetch_rows(
        &mut self,
        table: &str,
        limit: u32,
        order_by: Option<&str>,
    ) -> Result<RowSet, SchemaError> {
        self.counts.samples.fetch_add(1, Ordering::SeqCst);
        self.fail_if(Stage::Sample, table)?;
        let Some(stored) = self.table(table) else {
            return Err(SchemaError::table_not_found(table));
        };

        let mut rows = stored.rows.clone();
        if let Some(column) = order_by {
            rows.sort_by_key(|row| row.get(column).map(ToString::to_string));
        }
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));

        Ok(RowSet {
            columns: stored.columns.iter().map(|c| c.name.clone()).collect(),
            rows,
            warnings: Vec::new(),
        })
    }

    async fn close(self: Box<Self>) -> Result<(), ConnectionError> {
        self.counts.releases.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
