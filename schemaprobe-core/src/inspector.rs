//! Column metadata for a single table.

use crate::connection::ConnectionHandle;
use crate::error::SchemaError;
use crate::models::ColumnDescriptor;

/// Reads the column structure of a named table.
///
/// Table names are operator supplied and trusted, but they still go through
/// parameter binding in the backend so that names with reserved characters
/// do not break the query.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaInspector;

impl SchemaInspector {
    /// Creates an inspector.
    pub fn new() -> Self {
        Self
    }

    /// Describes `table`, columns ordered by their physical position.
    ///
    /// # Errors
    /// - `TableNotFound` if the table does not exist in the connected database
    /// - `QueryFailed` for an empty name, a released handle or a driver failure
    pub async fn describe(
        &self,
        handle: &mut ConnectionHandle,
        table: &str,
    ) -> Result<Vec<ColumnDescriptor>, SchemaError> {
        if table.trim().is_empty() {
            return Err(SchemaError::invalid_request(table, "table name is empty"));
        }

        tracing::debug!("Describing table '{}'", table);
        let columns = handle.session(table)?.fetch_columns(table).await?;

        if columns.is_empty() {
            return Err(SchemaError::table_not_found(table));
        }

        tracing::info!("Table '{}' has {} columns", table, columns.len());
        Ok(columns)
    }
}
