//! Column metadata from `INFORMATION_SCHEMA.COLUMNS`.

use super::sampling::map_query_error;
use crate::error::SchemaError;
use crate::models::{ColumnDescriptor, KeyKind};
use sqlx::{MySqlConnection, Row};

/// Columns of `table` in the connected database, by ordinal position.
///
/// Values are cast to CHAR to avoid VARBINARY decoding issues in MySQL 8.0+.
const COLUMNS_QUERY: &str = r#"
    SELECT
        CAST(COLUMN_NAME AS CHAR) AS COLUMN_NAME,
        CAST(COLUMN_TYPE AS CHAR) AS COLUMN_TYPE,
        CAST(IS_NULLABLE AS CHAR) AS IS_NULLABLE,
        CAST(COLUMN_KEY AS CHAR) AS COLUMN_KEY,
        CAST(COLUMN_DEFAULT AS CHAR) AS COLUMN_DEFAULT,
        CAST(EXTRA AS CHAR) AS EXTRA
    FROM INFORMATION_SCHEMA.COLUMNS
    WHERE TABLE_SCHEMA = DATABASE()
    AND TABLE_NAME = ?
    ORDER BY ORDINAL_POSITION
"#;

/// Reads the columns of `table`. An empty result means the table is missing.
pub(super) async fn fetch_columns(
    conn: &mut MySqlConnection,
    table: &str,
) -> Result<Vec<ColumnDescriptor>, SchemaError> {
    let rows = sqlx::query(COLUMNS_QUERY)
        .bind(table)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| map_query_error(table, "Failed to read column metadata", e))?;

    let mut columns = Vec::with_capacity(rows.len());
    for row in &rows {
        let name: String = row
            .try_get("COLUMN_NAME")
            .map_err(|e| SchemaError::query_failed(table, "Failed to parse column name", e))?;
        let data_type: String = row.try_get("COLUMN_TYPE").unwrap_or_default();
        let is_nullable: String = row.try_get("IS_NULLABLE").unwrap_or_default();
        let column_key: String = row.try_get("COLUMN_KEY").unwrap_or_default();
        let default_value: Option<String> = row.try_get("COLUMN_DEFAULT").unwrap_or(None);
        let extra: Option<String> = row.try_get("EXTRA").unwrap_or(None);

        columns.push(ColumnDescriptor {
            name,
            data_type,
            nullable: is_nullable.eq_ignore_ascii_case("YES"),
            key: KeyKind::from_mysql(&column_key),
            default_value,
            // MySQL reports an empty string when there is nothing extra
            extra: extra.filter(|e| !e.trim().is_empty()),
        });
    }

    Ok(columns)
}
