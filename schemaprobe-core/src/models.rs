//! Data produced by an inspection run.

use crate::error::{ConnectionError, ErrorKind, SchemaError, Stage, exit_code_for};
use serde::Serialize;
use serde_json::{Map, Value};

/// Role a column plays in the table's keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    /// Not part of any key
    #[default]
    None,
    /// Part of the primary key
    Primary,
    /// First column of a unique index
    Unique,
    /// First column of a non-unique index
    Index,
}

impl KeyKind {
    /// Maps MySQL's `COLUMN_KEY` value (`PRI`, `UNI`, `MUL`, empty).
    pub fn from_mysql(column_key: &str) -> Self {
        match column_key.trim().to_ascii_uppercase().as_str() {
            "PRI" => Self::Primary,
            "UNI" => Self::Unique,
            "MUL" => Self::Index,
            _ => Self::None,
        }
    }

    /// Label used in tabular output.
    pub fn label(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Primary => "primary",
            Self::Unique => "unique",
            Self::Index => "index",
        }
    }
}

/// Structure of one column, in table order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDescriptor {
    /// Column name
    pub name: String,
    /// Full column type as the server reports it, e.g. `decimal(10,2)`
    pub data_type: String,
    /// Whether NULL is allowed
    pub nullable: bool,
    /// Key role
    pub key: KeyKind,
    /// Default expression, `None` when the default is NULL or absent
    pub default_value: Option<String>,
    /// Extra attributes such as `auto_increment`
    pub extra: Option<String>,
}

impl ColumnDescriptor {
    /// Creates a nullable, unkeyed column with no default.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            key: KeyKind::None,
            default_value: None,
            extra: None,
        }
    }

    /// Builder method marking the column NOT NULL.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Builder method to set the key role.
    pub fn with_key(mut self, key: KeyKind) -> Self {
        self.key = key;
        self
    }

    /// Builder method to set the default.
    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    /// Builder method to set extra attributes.
    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = Some(extra.into());
        self
    }
}

/// One sampled row: column name to loosely typed value, in column order.
pub type SampleRow = Map<String, Value>;

/// Options controlling how rows are sampled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplingOptions {
    /// Maximum number of rows, applied server side
    pub limit: u32,
    /// Column to order by; no ordering is implied without it
    pub order_by: Option<String>,
    /// Add warnings for columns whose names look sensitive
    pub warn_sensitive: bool,
    /// Replace values of sensitive-looking columns with `****`
    pub mask_sensitive: bool,
}

/// Row limit used when the operator does not pass `--sample`.
pub const DEFAULT_SAMPLE_LIMIT: u32 = 3;

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_SAMPLE_LIMIT,
            order_by: None,
            warn_sensitive: true,
            mask_sensitive: false,
        }
    }
}

impl SamplingOptions {
    /// Creates options with the given limit and defaults otherwise.
    pub fn with_limit(limit: u32) -> Self {
        Self {
            limit,
            ..Default::default()
        }
    }
}

/// A bounded, best-effort set of rows from one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSample {
    /// Table the rows came from
    pub table_name: String,
    /// Column names in result order
    pub columns: Vec<String>,
    /// Rows, at most `limit` of them
    pub rows: Vec<SampleRow>,
    /// Limit the rows were requested with
    pub limit: u32,
    /// Sampling notes (sensitive columns, undecodable values)
    pub warnings: Vec<String>,
    /// When the sample was taken
    pub collected_at: chrono::DateTime<chrono::Utc>,
}

impl TableSample {
    /// Number of rows in the sample.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the sample has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Reportable description of a failed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    /// Stage that failed
    pub stage: Stage,
    /// Error kind
    pub kind: ErrorKind,
    /// Detail, may be empty
    pub message: String,
}

impl ErrorInfo {
    /// Builds error info for a failed connection attempt.
    pub fn from_connection(error: &ConnectionError) -> Self {
        Self {
            stage: Stage::Connect,
            kind: error.kind(),
            message: error.detail(),
        }
    }

    /// Builds error info for a failed describe or sample step.
    pub fn from_schema(stage: Stage, error: &SchemaError) -> Self {
        Self {
            stage,
            kind: error.kind(),
            message: error.detail(),
        }
    }

    /// Exit code for this error.
    pub fn exit_code(&self) -> u8 {
        exit_code_for(self.kind)
    }
}

/// Result of one invocation, consumed by the reporter and then discarded.
///
/// Only constructible through [`InspectionReport::succeeded`] and
/// [`InspectionReport::failed`], so a failed report never carries partial
/// columns or a sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InspectionReport {
    table_name: String,
    columns: Vec<ColumnDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sample: Option<TableSample>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorInfo>,
}

impl InspectionReport {
    /// A successful report.
    pub fn succeeded(
        table_name: impl Into<String>,
        columns: Vec<ColumnDescriptor>,
        sample: Option<TableSample>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            columns,
            sample,
            error: None,
        }
    }

    /// A failed report. No columns, no sample.
    pub fn failed(table_name: impl Into<String>, error: ErrorInfo) -> Self {
        Self {
            table_name: table_name.into(),
            columns: Vec::new(),
            sample: None,
            error: Some(error),
        }
    }

    /// The inspected table.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Column metadata, empty for failed reports.
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Sampled rows, if sampling was requested and succeeded.
    pub fn sample(&self) -> Option<&TableSample> {
        self.sample.as_ref()
    }

    /// Failure, if the run failed.
    pub fn error(&self) -> Option<&ErrorInfo> {
        self.error.as_ref()
    }

    /// Whether the run succeeded.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Exit code for this report.
    pub fn exit_code(&self) -> u8 {
        self.error
            .as_ref()
            .map_or(crate::error::EXIT_SUCCESS, ErrorInfo::exit_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_kind_from_mysql() {
        assert_eq!(KeyKind::from_mysql("PRI"), KeyKind::Primary);
        assert_eq!(KeyKind::from_mysql("UNI"), KeyKind::Unique);
        assert_eq!(KeyKind::from_mysql("MUL"), KeyKind::Index);
        assert_eq!(KeyKind::from_mysql(""), KeyKind::None);
        assert_eq!(KeyKind::from_mysql("pri"), KeyKind::Primary);
    }

    #[test]
    fn test_failed_report_has_no_partial_results() {
        let info = ErrorInfo::from_schema(Stage::Describe, &SchemaError::table_not_found("ghost"));
        let report = InspectionReport::failed("ghost", info);

        assert!(!report.is_success());
        assert!(report.columns().is_empty());
        assert!(report.sample().is_none());
        assert_eq!(report.exit_code(), crate::error::EXIT_SCHEMA);
    }

    #[test]
    fn test_successful_report_exit_code() {
        let report = InspectionReport::succeeded(
            "products",
            vec![ColumnDescriptor::new("id", "int").not_null()],
            None,
        );
        assert!(report.is_success());
        assert_eq!(report.exit_code(), crate::error::EXIT_SUCCESS);
    }

    #[test]
    fn test_report_serialization_omits_absent_parts() {
        let report = InspectionReport::succeeded(
            "products",
            vec![ColumnDescriptor::new("id", "int").with_key(KeyKind::Primary)],
            None,
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["table_name"], "products");
        assert_eq!(json["columns"][0]["key"], "primary");
        assert!(json.get("sample").is_none());
        assert!(json.get("error").is_none());
    }
}
