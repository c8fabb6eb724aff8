//! Bounded row sampling.
//!
//! Samples are best effort: rows are whatever the server returns first for
//! the query (or the first rows by the caller's `order_by` column). They are
//! not random, not representative and not stable across runs. Reads take no
//! locks and are not isolated from concurrent writers, so a sample may mix
//! states of a table that is being modified.

use crate::connection::ConnectionHandle;
use crate::error::SchemaError;
use crate::models::{ColumnDescriptor, SamplingOptions, TableSample};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Replacement for values of masked columns.
pub const MASK: &str = "****";

/// Column-name patterns that suggest sensitive content.
struct SensitivePatterns {
    patterns: Vec<(Regex, &'static str)>,
}

impl SensitivePatterns {
    fn instance() -> &'static Self {
        static PATTERNS: OnceLock<SensitivePatterns> = OnceLock::new();
        PATTERNS.get_or_init(Self::compile)
    }

    fn compile() -> Self {
        let sources: [(&str, &'static str); 6] = [
            (r"(?i)(password|passwd|pwd|pass_hash)", "password"),
            (r"(?i)(secret|api_?key)", "secret"),
            (r"(?i)(token|bearer)", "token"),
            (r"(?i)(email|e_mail)", "email address"),
            (r"(?i)(ssn|social_security)", "social security number"),
            (r"(?i)(credit_card|card_number|cvv)", "card number"),
        ];
        let patterns = sources
            .into_iter()
            .filter_map(|(pattern, label)| Regex::new(pattern).ok().map(|re| (re, label)))
            .collect();
        Self { patterns }
    }

    fn classify(&self, column: &str) -> Option<&'static str> {
        self.patterns
            .iter()
            .find(|(re, _)| re.is_match(column))
            .map(|(_, label)| *label)
    }
}

/// Returns a description of why `column` looks sensitive, if it does.
pub fn sensitive_reason(column: &str) -> Option<&'static str> {
    SensitivePatterns::instance().classify(column)
}

/// Fetches a bounded sample of rows from a named table.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataSampler;

impl DataSampler {
    /// Creates a sampler.
    pub fn new() -> Self {
        Self
    }

    /// Samples at most `options.limit` rows of `table`.
    ///
    /// `known_columns` are the described columns when available; they are
    /// used to validate `order_by` before a query is sent.
    ///
    /// # Errors
    /// - `TableNotFound` if the table does not exist
    /// - `QueryFailed` for an unknown `order_by` column, a released handle
    ///   or a driver failure
    pub async fn sample(
        &self,
        handle: &mut ConnectionHandle,
        table: &str,
        known_columns: Option<&[ColumnDescriptor]>,
        options: &SamplingOptions,
    ) -> Result<TableSample, SchemaError> {
        // Column names are case-insensitive; order by the described spelling
        let order_by = match (options.order_by.as_deref(), known_columns) {
            (Some(requested), Some(columns)) => {
                match columns.iter().find(|c| c.name.eq_ignore_ascii_case(requested)) {
                    Some(column) => Some(column.name.as_str()),
                    None => {
                        return Err(SchemaError::invalid_request(
                            table,
                            format!("cannot order by unknown column '{requested}'"),
                        ));
                    }
                }
            }
            (requested, _) => requested,
        };

        tracing::debug!("Sampling up to {} rows from '{}'", options.limit, table);
        let row_set = handle
            .session(table)?
            .fetch_rows(table, options.limit, order_by)
            .await?;

        let mut warnings = row_set.warnings;
        let mut rows = row_set.rows;
        // An empty result carries no column names; use the described ones
        let columns = match known_columns {
            Some(known) if row_set.columns.is_empty() => {
                known.iter().map(|c| c.name.clone()).collect()
            }
            _ => row_set.columns,
        };

        // The limit is applied by the server; this only guards against a
        // backend that ignores it.
        let limit = usize::try_from(options.limit).unwrap_or(usize::MAX);
        if rows.len() > limit {
            tracing::warn!(
                "Backend returned {} rows for limit {}; truncating",
                rows.len(),
                options.limit
            );
            rows.truncate(limit);
        }

        for column in &columns {
            let Some(reason) = sensitive_reason(column) else {
                continue;
            };
            if options.mask_sensitive {
                for row in &mut rows {
                    if let Some(value) = row.get_mut(column)
                        && !value.is_null()
                    {
                        *value = Value::String(MASK.to_string());
                    }
                }
                warnings.push(format!("column '{column}' masked ({reason})"));
            } else if options.warn_sensitive {
                warnings.push(format!("column '{column}' may contain sensitive data ({reason})"));
            }
        }

        tracing::info!("Sampled {} rows from '{}'", rows.len(), table);
        Ok(TableSample {
            table_name: table.to_string(),
            columns,
            rows,
            limit: options.limit,
            warnings,
            collected_at: chrono::Utc::now(),
        })
    }
}
