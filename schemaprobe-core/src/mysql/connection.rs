//! MySQL connection setup.
//!
//! # Security Features
//! - Password passed through connect options, never through a URL string
//! - Read-only session and statement timeout set right after connecting
//! - Driver statement logging disabled so queries never reach the logs

use crate::config::{ConnectionConfig, Credentials};
use crate::error::ConnectionError;
use sqlx::error::DatabaseError;
use sqlx::mysql::{MySqlConnectOptions, MySqlDatabaseError};
use sqlx::{ConnectOptions, Connection, MySqlConnection};

/// Server error numbers for a refused login or database grant:
/// 1044 (no access to the database), 1045 (bad user or password),
/// 1698 (plugin authentication refused).
const ACCESS_DENIED_ERRORS: [u16; 3] = [1044, 1045, 1698];
/// SQLSTATE of errors 1045 and 1698.
const SQLSTATE_ACCESS_DENIED: &str = "28000";
/// SQLSTATE of error 1044, shared with syntax errors.
const SQLSTATE_SYNTAX_OR_ACCESS: &str = "42000";

/// Builds connect options from config and credentials.
pub(super) fn connect_options(
    config: &ConnectionConfig,
    credentials: &Credentials,
) -> MySqlConnectOptions {
    let mut options = MySqlConnectOptions::new()
        .host(&config.host)
        .username(credentials.username())
        .database(&config.database)
        .disable_statement_logging();

    if let Some(port) = config.port {
        options = options.port(port);
    }
    if let Some(password) = credentials.password() {
        options = options.password(password);
    }
    options
}

/// Opens a connection and prepares the session.
///
/// If session setup fails, the freshly opened connection is closed before
/// the error is returned.
pub(super) async fn open(
    config: &ConnectionConfig,
    credentials: &Credentials,
) -> Result<MySqlConnection, ConnectionError> {
    let target = config.to_string();
    let mut conn = connect_options(config, credentials)
        .connect()
        .await
        .map_err(|e| classify_connect_error(&target, e))?;

    if let Err(e) = prepare_session(&mut conn, config).await {
        tracing::debug!("Session setup on {} failed: {}", target, e);
        if let Err(close_err) = conn.close().await {
            tracing::debug!("Closing half-open connection failed: {}", close_err);
        }
        return Err(ConnectionError::unreachable(target, e));
    }

    Ok(conn)
}

/// Applies per-session settings.
///
/// The statement timeout is best effort: servers without
/// `max_execution_time` (MariaDB, MySQL before 5.7.8) keep their default.
async fn prepare_session(
    conn: &mut MySqlConnection,
    config: &ConnectionConfig,
) -> Result<(), sqlx::Error> {
    let timeout_ms = config.query_timeout.as_millis().min(u128::from(u32::MAX));
    let set_timeout = format!("SET SESSION max_execution_time = {timeout_ms}");
    if let Err(e) = sqlx::query(&set_timeout).execute(&mut *conn).await {
        tracing::debug!("Server does not accept a statement timeout: {}", e);
    }

    if config.read_only {
        sqlx::query("SET SESSION TRANSACTION READ ONLY")
            .execute(&mut *conn)
            .await?;
    }

    // UTC so sampled TIMESTAMP values are unambiguous
    sqlx::query("SET time_zone = '+00:00'")
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Maps a driver error from the connect phase onto the two reportable cases.
pub fn classify_connect_error(target: &str, error: sqlx::Error) -> ConnectionError {
    let denied = match &error {
        sqlx::Error::Database(db_err) => is_access_denied(&**db_err),
        _ => false,
    };

    if denied {
        ConnectionError::authentication(target, error)
    } else {
        ConnectionError::unreachable(target, error)
    }
}

fn is_access_denied(db_err: &dyn DatabaseError) -> bool {
    if let Some(mysql_err) = db_err.try_downcast_ref::<MySqlDatabaseError>() {
        return ACCESS_DENIED_ERRORS.contains(&mysql_err.number());
    }
    match db_err.code().as_deref() {
        Some(SQLSTATE_ACCESS_DENIED) => true,
        Some(SQLSTATE_SYNTAX_OR_ACCESS) => db_err.message().starts_with("Access denied"),
        _ => false,
    }
}
