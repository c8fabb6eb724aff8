//! Core library for schemaprobe.
//!
//! This crate holds everything one inspection run needs: configuration,
//! connection acquisition with guaranteed release, column metadata queries,
//! bounded row sampling and report rendering. The `schemaprobe` binary is a
//! thin argument-parsing layer on top of it.
//!
//! # Security Guarantees
//! - No credentials in error messages, logs or `Debug` output
//! - Passwords are zeroed on drop
//! - Sessions are read-only by default and every statement is time bounded
//! - Table and column names never reach SQL unquoted
//!
//! # Architecture
//! - [`connection::Connector`] and [`connection::DatabaseSession`] are the
//!   database seam; [`mysql`] implements them for MySQL
//! - [`inspection::Inspection`] drives acquire, describe, sample and release
//! - [`reporter::Reporter`] is the only writer of stdout

pub mod config;
pub mod connection;
pub mod error;
pub mod inspection;
pub mod inspector;
pub mod logging;
pub mod models;
pub mod reporter;
pub mod sampler;

#[cfg(any(test, feature = "testing"))]
pub mod memory;

#[cfg(feature = "mysql")]
pub mod mysql;

// Re-export commonly used types
pub use config::{ConnectionConfig, Credentials, parse_mysql_url};
pub use connection::{ConnectionHandle, ConnectionManager, Connector, DatabaseSession, RowSet};
pub use error::{ConnectionError, ErrorKind, ProbeError, SchemaError, Stage};
pub use inspection::{Inspection, InspectionRequest};
pub use inspector::SchemaInspector;
pub use models::{
    ColumnDescriptor, ErrorInfo, InspectionReport, KeyKind, SampleRow, SamplingOptions,
    TableSample,
};
pub use reporter::{OutputFormat, Reporter};
pub use sampler::DataSampler;

#[cfg(feature = "mysql")]
pub use mysql::MySqlConnector;
