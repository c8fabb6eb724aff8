//! Connection configuration and credentials.
//!
//! [`ConnectionConfig`] intentionally does NOT store the username or password.
//! Those live in [`Credentials`], whose buffers are zeroed on drop and which
//! never prints the password in `Debug` output.

use crate::error::ProbeError;
use percent_encoding::percent_decode_str;
use serde::Serialize;
use std::time::Duration;
use url::Url;
use zeroize::{Zeroize, Zeroizing};

/// Default connection establishment bound.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default server-side statement bound.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);
/// Longest database name MySQL accepts.
const MAX_DATABASE_NAME: usize = 64;
/// Longest user name MySQL accepts.
const MAX_USERNAME: usize = 32;

/// Where to connect and how long to wait.
///
/// # Example
/// ```rust
/// use schemaprobe_core::config::ConnectionConfig;
///
/// let config = ConnectionConfig::new("db.internal", "inventory").with_port(3307);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.to_string(), "db.internal:3307/inventory");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionConfig {
    /// Database host address
    pub host: String,
    /// Port, `None` for the driver default (3306)
    pub port: Option<u16>,
    /// Database (schema) holding the inspected table
    pub database: String,
    /// Bound on connection establishment
    pub connect_timeout: Duration,
    /// Server-side bound on each statement
    pub query_timeout: Duration,
    /// Whether the session is switched to read-only transactions
    pub read_only: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: None,
            database: String::new(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            read_only: true,
        }
    }
}

impl std::fmt::Display for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}/{}",
            self.host,
            self.port.map_or_else(String::new, |p| format!(":{p}")),
            self.database
        )
    }
}

impl ConnectionConfig {
    /// Creates a config for `host`/`database` with default timeouts.
    pub fn new(host: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            database: database.into(),
            ..Default::default()
        }
    }

    /// Builder method to set the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Builder method to set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Builder method to set the query timeout.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Validates connection configuration parameters.
    ///
    /// # Errors
    /// Returns an argument error if a value is missing or out of range
    pub fn validate(&self) -> Result<(), ProbeError> {
        if self.host.trim().is_empty() {
            return Err(ProbeError::argument("host cannot be empty"));
        }

        if self.port == Some(0) {
            return Err(ProbeError::argument("port must be greater than 0"));
        }

        if self.database.trim().is_empty() {
            return Err(ProbeError::argument(
                "database is required (--database, SCHEMAPROBE_DATABASE or DATABASE_URL)",
            ));
        }

        if self.database.len() > MAX_DATABASE_NAME {
            return Err(ProbeError::argument(format!(
                "database name too long: maximum {MAX_DATABASE_NAME} characters"
            )));
        }

        if self.connect_timeout.is_zero() {
            return Err(ProbeError::argument("connect timeout must be greater than 0"));
        }

        if self.query_timeout.is_zero() {
            return Err(ProbeError::argument("query timeout must be greater than 0"));
        }

        Ok(())
    }
}

/// Secure credential container that zeroes memory on drop.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct Credentials {
    username: Zeroizing<String>,
    password: Zeroizing<Option<String>>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username.as_str())
            .field("password", &self.password.as_ref().map(|_| "****"))
            .finish()
    }
}

impl Credentials {
    /// Creates new credentials.
    pub fn new(username: impl Into<String>, password: Option<String>) -> Self {
        Self {
            username: Zeroizing::new(username.into()),
            password: Zeroizing::new(password),
        }
    }

    /// The login name.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The password, if one was supplied.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Checks if a password is present without exposing it.
    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }

    /// Validates the credentials.
    ///
    /// # Errors
    /// Returns an argument error if the username is missing or too long
    pub fn validate(&self) -> Result<(), ProbeError> {
        if self.username.trim().is_empty() {
            return Err(ProbeError::argument(
                "user is required (--user, SCHEMAPROBE_USER or DATABASE_URL)",
            ));
        }
        if self.username.len() > MAX_USERNAME {
            return Err(ProbeError::argument(format!(
                "user name too long: maximum {MAX_USERNAME} characters for MySQL"
            )));
        }
        Ok(())
    }
}

/// Pieces of a `mysql://` URL. Any part may be absent.
#[derive(Debug, Default)]
pub struct UrlParts {
    /// Host, if present
    pub host: Option<String>,
    /// Port, if present
    pub port: Option<u16>,
    /// Database from the path, if present
    pub database: Option<String>,
    /// Username, if present
    pub username: Option<String>,
    /// Password, if present
    pub password: Option<Zeroizing<String>>,
}

/// Splits a MySQL connection URL into its parts.
///
/// Percent-encoded user and password are decoded.
///
/// # Errors
/// Returns an argument error for malformed URLs or a scheme other than `mysql`.
/// The message never echoes the URL itself.
pub fn parse_mysql_url(connection_string: &str) -> Result<UrlParts, ProbeError> {
    let url = Url::parse(connection_string)
        .map_err(|e| ProbeError::argument(format!("invalid database URL: {e}")))?;

    if url.scheme() != "mysql" {
        return Err(ProbeError::argument(
            "database URL must use the mysql:// scheme",
        ));
    }

    let mut parts = UrlParts {
        host: url.host_str().filter(|h| !h.is_empty()).map(str::to_string),
        port: url.port(),
        ..Default::default()
    };

    if parts.port == Some(0) {
        return Err(ProbeError::argument(
            "invalid port number: must be greater than 0",
        ));
    }

    let database = url.path().trim_start_matches('/');
    if !database.is_empty() {
        parts.database = Some(percent_decode(database)?);
    }

    if !url.username().is_empty() {
        parts.username = Some(percent_decode(url.username())?);
    }

    if let Some(password) = url.password() {
        parts.password = Some(Zeroizing::new(percent_decode(password)?));
    }

    Ok(parts)
}

fn percent_decode(raw: &str) -> Result<String, ProbeError> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| ProbeError::argument("database URL contains invalid UTF-8 escapes"))
}
