//! Bounded row queries and value decoding.

use crate::connection::RowSet;
use crate::error::SchemaError;
use crate::models::SampleRow;
use base64::Engine;
use serde_json::Value as JsonValue;
use sqlx::mysql::MySqlRow;
use sqlx::{Column, MySqlConnection, Row, TypeInfo};

/// SQLSTATE MySQL reports for a missing table (error 1146).
const SQLSTATE_NO_SUCH_TABLE: &str = "42S02";
/// ISO 8601 without an offset; DATETIME values carry no time zone.
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Maps a query failure, recognising the server's "no such table" state.
pub(super) fn map_query_error(table: &str, context: &str, error: sqlx::Error) -> SchemaError {
    if let sqlx::Error::Database(db_err) = &error
        && db_err.code().as_deref() == Some(SQLSTATE_NO_SUCH_TABLE)
    {
        return SchemaError::table_not_found(table);
    }
    SchemaError::query_failed(table, context, error)
}

/// Quotes a MySQL identifier with backticks, doubling embedded backticks.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Builds the sample query. The row limit is left as a bind parameter.
pub fn build_sample_query(table: &str, order_by: Option<&str>) -> String {
    match order_by {
        Some(column) => format!(
            "SELECT * FROM {} ORDER BY {} LIMIT ?",
            quote_identifier(table),
            quote_identifier(column)
        ),
        None => format!("SELECT * FROM {} LIMIT ?", quote_identifier(table)),
    }
}

/// Fetches at most `limit` rows of `table`.
pub(super) async fn fetch_rows(
    conn: &mut MySqlConnection,
    table: &str,
    limit: u32,
    order_by: Option<&str>,
) -> Result<RowSet, SchemaError> {
    let query = build_sample_query(table, order_by);
    let rows = sqlx::query(&query)
        .bind(i64::from(limit))
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| map_query_error(table, "Failed to sample rows", e))?;

    let columns: Vec<String> = rows
        .first()
        .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
        .unwrap_or_default();

    let mut warnings = Vec::new();
    let mut decoded = Vec::with_capacity(rows.len());
    for row in &rows {
        decoded.push(row_to_json(row, &mut warnings));
    }

    Ok(RowSet {
        columns,
        rows: decoded,
        warnings,
    })
}

fn row_to_json(row: &MySqlRow, warnings: &mut Vec<String>) -> SampleRow {
    let mut map = SampleRow::new();
    for (index, column) in row.columns().iter().enumerate() {
        let type_name = column.type_info().name();
        let value = decode_typed(row, index, type_name)
            .or_else(|| decode_fallback(row, index))
            .unwrap_or_else(|| {
                let note = format!(
                    "column '{}' has values of type {} that cannot be shown",
                    column.name(),
                    type_name
                );
                if !warnings.contains(&note) {
                    warnings.push(note);
                }
                JsonValue::Null
            });
        map.insert(column.name().to_string(), value);
    }
    map
}

/// Decodes `Option<T>` at `index`, `None` if the driver rejects the type.
fn get<'r, T>(row: &'r MySqlRow, index: usize) -> Option<Option<T>>
where
    T: sqlx::Decode<'r, sqlx::MySql> + sqlx::Type<sqlx::MySql>,
{
    row.try_get::<Option<T>, _>(index).ok()
}

fn or_null<T>(value: Option<T>, convert: impl FnOnce(T) -> JsonValue) -> JsonValue {
    value.map_or(JsonValue::Null, convert)
}

/// Decoding driven by the column's reported type.
fn decode_typed(row: &MySqlRow, index: usize, type_name: &str) -> Option<JsonValue> {
    match type_name {
        "BOOLEAN" => get::<bool>(row, index).map(|v| or_null(v, JsonValue::Bool)),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
            get::<i64>(row, index).map(|v| or_null(v, JsonValue::from))
        }
        name if name.ends_with("UNSIGNED") => {
            get::<u64>(row, index).map(|v| or_null(v, JsonValue::from))
        }
        "FLOAT" => get::<f32>(row, index).map(|v| or_null(v, |f| float(f64::from(f)))),
        "DOUBLE" => get::<f64>(row, index).map(|v| or_null(v, float)),
        "DECIMAL" => get::<sqlx::types::BigDecimal>(row, index)
            .map(|v| or_null(v, |d| JsonValue::String(d.to_string()))),
        "DATE" => get::<chrono::NaiveDate>(row, index)
            .map(|v| or_null(v, |d| JsonValue::String(d.to_string()))),
        "TIME" => get::<chrono::NaiveTime>(row, index)
            .map(|v| or_null(v, |t| JsonValue::String(t.to_string()))),
        "DATETIME" => get::<chrono::NaiveDateTime>(row, index)
            .map(|v| or_null(v, |dt| JsonValue::String(dt.format(DATETIME_FORMAT).to_string()))),
        "TIMESTAMP" => get::<chrono::DateTime<chrono::Utc>>(row, index)
            .map(|v| or_null(v, |ts| JsonValue::String(ts.to_rfc3339()))),
        "JSON" => get::<sqlx::types::JsonValue>(row, index).map(|v| v.unwrap_or(JsonValue::Null)),
        "BINARY" | "VARBINARY" | "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT" => {
            get::<Vec<u8>>(row, index).map(|v| or_null(v, binary))
        }
        _ => None,
    }
}

/// Text first, then raw bytes.
fn decode_fallback(row: &MySqlRow, index: usize) -> Option<JsonValue> {
    if let Some(v) = get::<String>(row, index) {
        return Some(or_null(v, JsonValue::String));
    }
    get::<Vec<u8>>(row, index).map(|v| or_null(v, binary))
}

fn float(value: f64) -> JsonValue {
    // NaN and infinities have no JSON number form
    serde_json::Number::from_f64(value)
        .map_or_else(|| JsonValue::String(value.to_string()), JsonValue::Number)
}

fn binary(bytes: Vec<u8>) -> JsonValue {
    JsonValue::String(base64::engine::general_purpose::STANDARD.encode(bytes))
}
