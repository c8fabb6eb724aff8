//! Connection acquisition and release.
//!
//! The database is reached through two object-safe traits:
//! - [`Connector`] opens a session for a configuration
//! - [`DatabaseSession`] runs the metadata and sample queries and closes itself
//!
//! [`ConnectionManager`] wraps a connector, applies the connect timeout and
//! hands out [`ConnectionHandle`]s. A handle owns exactly one session and is
//! released exactly once; releasing again is a no-op and using a released
//! handle is an error.

use crate::config::{ConnectionConfig, Credentials};
use crate::error::{ConnectionError, SchemaError};
use crate::models::{ColumnDescriptor, SampleRow};
use async_trait::async_trait;

/// Raw result of a bounded row query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    /// Column names in result order
    pub columns: Vec<String>,
    /// Decoded rows
    pub rows: Vec<SampleRow>,
    /// Decoding notes, e.g. values of types that could not be represented
    pub warnings: Vec<String>,
}

/// One live database session.
///
/// Implementations must apply `limit` on the server and pass the table name
/// through the driver's parameter binding or identifier quoting, never by
/// plain concatenation.
#[async_trait]
pub trait DatabaseSession: Send {
    /// Column metadata for `table`, ordered by ordinal position.
    ///
    /// Returns an empty vector when the table does not exist.
    async fn fetch_columns(&mut self, table: &str) -> Result<Vec<ColumnDescriptor>, SchemaError>;

    /// At most `limit` rows of `table`, optionally ordered by one column.
    async fn fetch_rows(
        &mut self,
        table: &str,
        limit: u32,
        order_by: Option<&str>,
    ) -> Result<RowSet, SchemaError>;

    /// Closes the session gracefully.
    async fn close(self: Box<Self>) -> Result<(), ConnectionError>;
}

/// Opens database sessions.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens one session. No retries.
    async fn connect(
        &self,
        config: &ConnectionConfig,
        credentials: &Credentials,
    ) -> Result<Box<dyn DatabaseSession>, ConnectionError>;
}

/// Exclusive ownership of one open session.
pub struct ConnectionHandle {
    session: Option<Box<dyn DatabaseSession>>,
    target: String,
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("target", &self.target)
            .field("released", &self.is_released())
            .finish_non_exhaustive()
    }
}

impl ConnectionHandle {
    /// Wraps an open session.
    pub fn new(session: Box<dyn DatabaseSession>, target: impl Into<String>) -> Self {
        Self {
            session: Some(session),
            target: target.into(),
        }
    }

    /// Whether the session has been handed back.
    pub fn is_released(&self) -> bool {
        self.session.is_none()
    }

    /// Borrows the live session for a query against `table`.
    ///
    /// # Errors
    /// Returns `QueryFailed` if the handle was already released
    pub fn session(
        &mut self,
        table: &str,
    ) -> Result<&mut (dyn DatabaseSession + 'static), SchemaError> {
        match self.session.as_deref_mut() {
            Some(session) => Ok(session),
            None => Err(SchemaError::invalid_request(
                table,
                "connection already released",
            )),
        }
    }

    /// Closes the session. Calling this on a released handle does nothing.
    ///
    /// Close failures are logged and swallowed: the session is gone either
    /// way and the run's outcome is already decided.
    pub async fn release(&mut self) {
        if let Some(session) = self.session.take() {
            match session.close().await {
                Ok(()) => tracing::debug!("Released connection to {}", self.target),
                Err(e) => tracing::debug!("Connection to {} closed uncleanly: {}", self.target, e),
            }
        }
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        if self.session.is_some() {
            tracing::warn!(
                "Connection to {} dropped without release; closing without handshake",
                self.target
            );
        }
    }
}

/// Acquires and releases the single connection of a run.
pub struct ConnectionManager<C> {
    connector: C,
    config: ConnectionConfig,
    credentials: Credentials,
}

impl<C> std::fmt::Debug for ConnectionManager<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("config", &self.config)
            .field("username", &self.credentials.username())
            .finish_non_exhaustive()
    }
}

impl<C: Connector> ConnectionManager<C> {
    /// Creates a manager. Nothing is opened until [`acquire`](Self::acquire).
    pub fn new(connector: C, config: ConnectionConfig, credentials: Credentials) -> Self {
        Self {
            connector,
            config,
            credentials,
        }
    }

    /// Opens a connection, bounded by the configured connect timeout.
    ///
    /// # Errors
    /// Returns `Unreachable` on network failure or timeout and
    /// `Authentication` when the server rejects the credentials
    pub async fn acquire(&self) -> Result<ConnectionHandle, ConnectionError> {
        let target = self.config.to_string();
        tracing::info!("Connecting to {}", target);

        let attempt = self.connector.connect(&self.config, &self.credentials);
        let session = match tokio::time::timeout(self.config.connect_timeout, attempt).await {
            Ok(Ok(session)) => session,
            Ok(Err(e)) => {
                tracing::debug!("Connection to {} failed: {:?}", target, e);
                return Err(e);
            }
            Err(_) => {
                tracing::debug!(
                    "Connection to {} timed out after {:?}",
                    target,
                    self.config.connect_timeout
                );
                return Err(ConnectionError::timed_out(
                    target,
                    self.config.connect_timeout,
                ));
            }
        };

        tracing::debug!("Connected to {}", target);
        Ok(ConnectionHandle::new(session, target))
    }

    /// Releases a handle. Safe to call on an already released handle.
    pub async fn release(&self, handle: &mut ConnectionHandle) {
        handle.release().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingSession {
        closes: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl DatabaseSession for CountingSession {
        async fn fetch_columns(
            &mut self,
            _table: &str,
        ) -> Result<Vec<ColumnDescriptor>, SchemaError> {
            Ok(vec![ColumnDescriptor::new("id", "int")])
        }

        async fn fetch_rows(
            &mut self,
            _table: &str,
            _limit: u32,
            _order_by: Option<&str>,
        ) -> Result<RowSet, SchemaError> {
            Ok(RowSet::default())
        }

        async fn close(self: Box<Self>) -> Result<(), ConnectionError> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct CountingConnector {
        closes: Arc<AtomicUsize>,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl Connector for CountingConnector {
        async fn connect(
            &self,
            _config: &ConnectionConfig,
            _credentials: &Credentials,
        ) -> Result<Box<dyn DatabaseSession>, ConnectionError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(Box::new(CountingSession {
                closes: Arc::clone(&self.closes),
            }))
        }
    }

    fn manager(
        delay: Option<Duration>,
    ) -> (ConnectionManager<CountingConnector>, Arc<AtomicUsize>) {
        let closes = Arc::new(AtomicUsize::new(0));
        let connector = CountingConnector {
            closes: Arc::clone(&closes),
            delay,
        };
        let config = ConnectionConfig::new("localhost", "inventory")
            .with_connect_timeout(Duration::from_secs(1));
        (
            ConnectionManager::new(connector, config, Credentials::new("app", None)),
            closes,
        )
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let (manager, closes) = manager(None);
        let mut handle = manager.acquire().await.unwrap();
        assert!(!handle.is_released());

        manager.release(&mut handle).await;
        manager.release(&mut handle).await;

        assert!(handle.is_released());
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_released_handle_rejects_queries() {
        let (manager, _closes) = manager(None);
        let mut handle = manager.acquire().await.unwrap();
        handle.release().await;

        let err = handle.session("products").err().unwrap();
        assert!(err.to_string().contains("already released"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_times_out() {
        let (manager, closes) = manager(Some(Duration::from_secs(60)));
        let err = manager.acquire().await.unwrap_err();

        assert!(matches!(err, ConnectionError::Unreachable { .. }));
        assert!(err.to_string().contains("timed out"));
        assert_eq!(closes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_manager_debug_hides_password() {
        let config = ConnectionConfig::new("localhost", "inventory");
        let connector = CountingConnector {
            closes: Arc::new(AtomicUsize::new(0)),
            delay: None,
        };
        let credentials = Credentials::new("app", Some("pw-xyz".into()));
        let manager = ConnectionManager::new(connector, config, credentials);
        let debug = format!("{manager:?}");
        assert!(!debug.contains("pw-xyz"));
    }
}
