//! Report rendering.
//!
//! The reporter is the only component that writes to stdout. A successful
//! report goes to stdout as bordered text tables or pretty JSON; a failed
//! report becomes exactly one line on stderr:
//!
//! ```text
//! <stage>: table '<table>': <kind>[: <detail>]
//! ```

use crate::models::{ColumnDescriptor, ErrorInfo, InspectionReport, TableSample};
use serde_json::Value;
use std::io::{self, Write};
use std::str::FromStr;

/// Cells longer than this are cut and suffixed with `...`.
const MAX_CELL_WIDTH: usize = 48;

/// Rendering of successful reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Bordered tables for humans
    #[default]
    Text,
    /// The report serialized as pretty-printed JSON
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown format '{other}', expected 'text' or 'json'")),
        }
    }
}

/// Writes reports to an output and an error sink.
#[derive(Debug)]
pub struct Reporter<O, E> {
    out: O,
    err: E,
    format: OutputFormat,
}

impl<O: Write, E: Write> Reporter<O, E> {
    /// Creates a reporter over the given sinks.
    pub fn new(out: O, err: E, format: OutputFormat) -> Self {
        Self { out, err, format }
    }

    /// Renders a report. Failed reports produce one stderr line and nothing
    /// on stdout.
    pub fn render(&mut self, report: &InspectionReport) -> io::Result<()> {
        if let Some(error) = report.error() {
            return self.render_failure(report.table_name(), error);
        }
        match self.format {
            OutputFormat::Text => self.render_text(report),
            OutputFormat::Json => self.render_json(report),
        }
    }

    /// Reports unusable operator input.
    pub fn render_argument_error(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.err, "arguments: {message}")?;
        self.err.flush()
    }

    fn render_failure(&mut self, table: &str, error: &ErrorInfo) -> io::Result<()> {
        writeln!(self.err, "{}", failure_line(table, error))?;
        self.err.flush()
    }

    fn render_json(&mut self, report: &InspectionReport) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut self.out, report).map_err(io::Error::other)?;
        writeln!(self.out)?;
        self.out.flush()
    }

    fn render_text(&mut self, report: &InspectionReport) -> io::Result<()> {
        writeln!(self.out, "Table: {}", report.table_name())?;
        write_table(&mut self.out, &column_headers(), &column_rows(report.columns()))?;

        if let Some(sample) = report.sample() {
            writeln!(self.out)?;
            writeln!(
                self.out,
                "Sample ({} rows, limit {}):",
                sample.len(),
                sample.limit
            )?;
            if sample.is_empty() {
                writeln!(self.out, "(no rows)")?;
            } else {
                write_table(&mut self.out, &sample.columns, &sample_rows(sample))?;
            }
            for warning in &sample.warnings {
                writeln!(self.out, "note: {warning}")?;
            }
        }
        self.out.flush()
    }
}

/// The one-line description of a failed run.
pub fn failure_line(table: &str, error: &ErrorInfo) -> String {
    if error.message.is_empty() {
        format!("{}: table '{}': {}", error.stage, table, error.kind)
    } else {
        format!(
            "{}: table '{}': {}: {}",
            error.stage,
            table,
            error.kind,
            single_line(&error.message)
        )
    }
}

fn column_headers() -> Vec<String> {
    ["name", "type", "nullable", "key", "default", "extra"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn column_rows(columns: &[ColumnDescriptor]) -> Vec<Vec<String>> {
    columns
        .iter()
        .map(|c| {
            vec![
                c.name.clone(),
                c.data_type.clone(),
                if c.nullable { "YES" } else { "NO" }.to_string(),
                c.key.label().to_string(),
                c.default_value.clone().unwrap_or_default(),
                c.extra.clone().unwrap_or_default(),
            ]
        })
        .collect()
}

fn sample_rows(sample: &TableSample) -> Vec<Vec<String>> {
    sample
        .rows
        .iter()
        .map(|row| {
            sample
                .columns
                .iter()
                .map(|column| row.get(column).map_or_else(String::new, cell))
                .collect()
        })
        .collect()
}

fn cell(value: &Value) -> String {
    let text = match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => single_line(s),
        other => other.to_string(),
    };
    truncate(text)
}

fn single_line(text: &str) -> String {
    text.replace('\r', "\\r")
        .replace('\n', "\\n")
        .replace('\t', "\\t")
}

fn truncate(text: String) -> String {
    if text.chars().count() <= MAX_CELL_WIDTH {
        return text;
    }
    let mut cut: String = text.chars().take(MAX_CELL_WIDTH - 3).collect();
    cut.push_str("...");
    cut
}

fn write_table<W: Write>(out: &mut W, headers: &[String], rows: &[Vec<String>]) -> io::Result<()> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, value) in widths.iter_mut().zip(row) {
            *width = (*width).max(value.chars().count());
        }
    }

    let border = format!(
        "+{}+",
        widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("+")
    );

    writeln!(out, "{border}")?;
    write_row(out, headers, &widths)?;
    writeln!(out, "{border}")?;
    for row in rows {
        write_row(out, row, &widths)?;
    }
    writeln!(out, "{border}")
}

fn write_row<W: Write>(out: &mut W, values: &[String], widths: &[usize]) -> io::Result<()> {
    let cells: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(i, width)| {
            let value = values.get(i).map_or("", String::as_str);
            let pad = width.saturating_sub(value.chars().count());
            format!(" {}{} ", value, " ".repeat(pad))
        })
        .collect();
    writeln!(out, "|{}|", cells.join("|"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConnectionError, SchemaError, Stage};
    use crate::models::KeyKind;
    use serde_json::json;

    fn products_report(rows: Vec<crate::models::SampleRow>, limit: u32) -> InspectionReport {
        let columns = vec![
            ColumnDescriptor::new("id", "int")
                .not_null()
                .with_key(KeyKind::Primary)
                .with_extra("auto_increment"),
            ColumnDescriptor::new("name", "varchar(100)"),
            ColumnDescriptor::new("price", "decimal(10,2)").with_default("0.00"),
        ];
        let sample = TableSample {
            table_name: "products".to_string(),
            columns: vec!["id".into(), "name".into(), "price".into()],
            rows,
            limit,
            warnings: Vec::new(),
            collected_at: chrono::Utc::now(),
        };
        InspectionReport::succeeded("products", columns, Some(sample))
    }

    fn render(report: &InspectionReport, format: OutputFormat) -> (String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        Reporter::new(&mut out, &mut err, format)
            .render(report)
            .unwrap();
        (
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn test_text_report_lists_columns_in_order() {
        let (out, err) = render(&products_report(Vec::new(), 0), OutputFormat::Text);

        assert!(err.is_empty());
        assert!(out.starts_with("Table: products\n"));
        assert!(out.contains("| nullable |"));
        let id = out.find("| id ").unwrap();
        let name = out.find("| name  | varchar").unwrap();
        let price = out.find("| price ").unwrap();
        assert!(id < name && name < price);
        assert!(out.contains("primary"));
        assert!(out.contains("Sample (0 rows, limit 0):\n(no rows)\n"));
    }

    #[test]
    fn test_text_report_renders_sample_values() {
        let row = json!({"id": 1, "name": null, "price": "9.99"});
        let serde_json::Value::Object(row) = row else {
            unreachable!()
        };
        let (out, _) = render(&products_report(vec![row], 3), OutputFormat::Text);

        assert!(out.contains("Sample (1 rows, limit 3):"));
        assert!(out.contains("| 1  | NULL | 9.99  |"));
    }

    #[test]
    fn test_text_report_without_sample() {
        let report = InspectionReport::succeeded(
            "users",
            vec![ColumnDescriptor::new("id", "int")],
            None,
        );
        let (out, _) = render(&report, OutputFormat::Text);
        assert!(!out.contains("Sample"));
    }

    #[test]
    fn test_sample_warnings_become_notes() {
        let sample = TableSample {
            table_name: "users".to_string(),
            columns: vec!["email".into()],
            rows: Vec::new(),
            limit: 3,
            warnings: vec!["column 'email' may contain sensitive data (email address)".into()],
            collected_at: chrono::Utc::now(),
        };
        let report = InspectionReport::succeeded(
            "users",
            vec![ColumnDescriptor::new("email", "varchar(255)")],
            Some(sample),
        );
        let (out, _) = render(&report, OutputFormat::Text);
        assert!(out.contains("note: column 'email' may contain sensitive data (email address)\n"));
    }

    #[test]
    fn test_json_report_is_parseable() {
        let (out, err) = render(&products_report(Vec::new(), 0), OutputFormat::Json);
        assert!(err.is_empty());

        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["table_name"], "products");
        assert_eq!(parsed["columns"].as_array().unwrap().len(), 3);
        assert_eq!(parsed["sample"]["rows"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_failure_is_one_stderr_line() {
        let info = ErrorInfo::from_schema(
            Stage::Describe,
            &SchemaError::table_not_found("nonexistent_table"),
        );
        let report = InspectionReport::failed("nonexistent_table", info);

        for format in [OutputFormat::Text, OutputFormat::Json] {
            let (out, err) = render(&report, format);
            assert!(out.is_empty());
            assert_eq!(err, "describe: table 'nonexistent_table': table not found\n");
        }
    }

    #[test]
    fn test_connection_failure_line_has_detail() {
        let error = ConnectionError::unreachable(
            "db.internal/inventory",
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused"),
        );
        let line = failure_line("products", &ErrorInfo::from_connection(&error));
        assert_eq!(
            line,
            "connect: table 'products': connection failed: \
             db.internal/inventory: connection refused"
        );
    }

    #[test]
    fn test_argument_error_line() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        Reporter::new(&mut out, &mut err, OutputFormat::Text)
            .render_argument_error("--user is required")
            .unwrap();
        assert!(out.is_empty());
        assert_eq!(String::from_utf8(err).unwrap(), "arguments: --user is required\n");
    }

    #[test]
    fn test_long_and_multiline_cells() {
        assert_eq!(cell(&json!("a\nb")), "a\\nb");
        let long = "x".repeat(100);
        let shown = cell(&Value::String(long));
        assert_eq!(shown.chars().count(), MAX_CELL_WIDTH);
        assert!(shown.ends_with("..."));
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("text".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
