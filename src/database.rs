//! Database handle: schema introspection and query execution.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::mysql::{MySql, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, Decode, Row, Type, TypeInfo, ValueRef};
use tracing::{debug, info, warn};

use crate::connection::ConnectionParams;
use crate::error::{ConnectError, DbError};

/// Longest value shown in a query result before truncation.
pub const MAX_RESULT_VALUE_CHARS: usize = 300;
/// Longest value shown in a schema sample row.
pub const MAX_SAMPLE_VALUE_CHARS: usize = 100;

/// An open database handle.
#[async_trait]
pub trait SqlDatabase: Send + Sync {
    /// Schema text for every table, used to ground prompts.
    async fn table_info(&self) -> Result<String, DbError>;

    /// Execute literal SQL and render the rows as text.
    async fn run(&self, sql: &str) -> Result<String, DbError>;
}

pub struct MySqlDatabase {
    pool: MySqlPool,
    sample_rows: u32,
}

impl MySqlDatabase {
    /// Open a single-connection handle with the given credentials.
    pub async fn connect(params: &ConnectionParams, sample_rows: u32) -> Result<Self, ConnectError> {
        let options = params.connect_options()?;
        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        info!(url = %params.redacted_url(), "connected to database");

        Ok(Self { pool, sample_rows })
    }

    async fn table_names(&self) -> Result<Vec<String>, DbError> {
        let rows = sqlx::query(
            "SELECT CAST(table_name AS CHAR) AS table_name FROM information_schema.tables \
             WHERE table_schema = DATABASE() AND table_type = 'BASE TABLE' ORDER BY table_name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().filter_map(|row| value_to_string(row, 0)).collect())
    }

    async fn create_statement(&self, table: &str) -> Result<String, DbError> {
        let row = sqlx::query(&format!("SHOW CREATE TABLE {}", quote_ident(table)))
            .fetch_one(&self.pool)
            .await?;

        let ddl = value_to_string(&row, 1)
            .ok_or_else(|| DbError::Other(format!("no CREATE TABLE statement for {table}")))?;
        Ok(strip_table_options(&ddl))
    }

    async fn sample_block(&self, table: &str) -> Result<String, DbError> {
        let rows = sqlx::query(&format!(
            "SELECT * FROM {} LIMIT {}",
            quote_ident(table),
            self.sample_rows
        ))
        .fetch_all(&self.pool)
        .await?;

        let columns: Vec<String> = rows
            .first()
            .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();

        let values: Vec<Vec<String>> = rows
            .iter()
            .map(|row| {
                (0..row.len())
                    .map(|i| display_value(value_to_string(row, i), MAX_SAMPLE_VALUE_CHARS))
                    .collect()
            })
            .collect();

        Ok(format_sample_block(table, self.sample_rows, &columns, &values))
    }
}

#[async_trait]
impl SqlDatabase for MySqlDatabase {
    async fn table_info(&self) -> Result<String, DbError> {
        let mut tables_info = Vec::new();

        for table in self.table_names().await? {
            let mut info = self.create_statement(&table).await?;

            if self.sample_rows > 0 {
                let block = self.sample_block(&table).await;
                append_sample_block(&mut info, &table, self.sample_rows, block);
            }
            tables_info.push(info);
        }

        debug!(tables = tables_info.len(), "loaded schema");
        Ok(tables_info.join("\n\n"))
    }

    async fn run(&self, sql: &str) -> Result<String, DbError> {
        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;

        debug!(rows = rows.len(), "query returned");

        let rendered: Vec<String> = rows
            .iter()
            .map(|row| {
                let cells: Vec<(String, Option<String>)> = row
                    .columns()
                    .iter()
                    .enumerate()
                    .map(|(i, column)| (column.name().to_string(), value_to_string(row, i)))
                    .collect();
                format_row(&cells)
            })
            .collect();

        Ok(rendered.join("\n"))
    }
}

fn decode<'r, T>(row: &'r MySqlRow, index: usize) -> Option<T>
where
    T: Decode<'r, MySql> + Type<MySql>,
{
    row.try_get::<T, _>(index).ok()
}

/// How a column's value is decoded, by its MySQL type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    Decimal,
    Bool,
    Signed,
    Unsigned,
    Year,
    Float,
    Double,
    Date,
    Time,
    DateTime,
    Timestamp,
    Text,
}

fn value_kind(type_name: &str) -> ValueKind {
    match type_name {
        "DECIMAL" => ValueKind::Decimal,
        "BOOLEAN" => ValueKind::Bool,
        // sqlx only accepts YEAR and BIT as unsigned integers.
        "YEAR" => ValueKind::Year,
        "BIT" => ValueKind::Unsigned,
        name if name.ends_with("UNSIGNED") => ValueKind::Unsigned,
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => ValueKind::Signed,
        "FLOAT" => ValueKind::Float,
        "DOUBLE" => ValueKind::Double,
        "DATE" => ValueKind::Date,
        "TIME" => ValueKind::Time,
        "DATETIME" => ValueKind::DateTime,
        "TIMESTAMP" => ValueKind::Timestamp,
        _ => ValueKind::Text,
    }
}

/// Decode a column to text by its declared type. `None` means SQL `NULL`.
fn value_to_string(row: &MySqlRow, index: usize) -> Option<String> {
    match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return None,
        Ok(_) => {}
        Err(_) => return Some("<unreadable>".to_string()),
    }

    let text = match value_kind(row.column(index).type_info().name()) {
        ValueKind::Decimal => row.try_get_unchecked::<String, _>(index).ok(),
        ValueKind::Bool => decode::<bool>(row, index).map(|v| v.to_string()),
        ValueKind::Signed => decode::<i64>(row, index).map(|v| v.to_string()),
        ValueKind::Unsigned => decode::<u64>(row, index).map(|v| v.to_string()),
        ValueKind::Year => decode::<u16>(row, index).map(|v| v.to_string()),
        ValueKind::Float => decode::<f32>(row, index).map(|v| v.to_string()),
        ValueKind::Double => decode::<f64>(row, index).map(|v| v.to_string()),
        ValueKind::Date => decode::<NaiveDate>(row, index).map(|v| v.to_string()),
        ValueKind::Time => decode::<NaiveTime>(row, index).map(|v| v.to_string()),
        ValueKind::DateTime => decode::<NaiveDateTime>(row, index).map(|v| v.to_string()),
        ValueKind::Timestamp => {
            decode::<DateTime<Utc>>(row, index).map(|v| v.naive_utc().to_string())
        }
        ValueKind::Text => decode::<String>(row, index),
    };

    let text = text.or_else(|| {
        row.try_get_unchecked::<Vec<u8>, _>(index)
            .ok()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    });

    Some(text.unwrap_or_else(|| "<unreadable>".to_string()))
}

fn display_value(value: Option<String>, max_chars: usize) -> String {
    match value {
        Some(v) => truncate(v, max_chars),
        None => "NULL".to_string(),
    }
}

fn truncate(value: String, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value;
    }
    let mut cut: String = value.chars().take(max_chars).collect();
    cut.push_str("...");
    cut
}

/// `{ name: Apple, price: 1.50 }`
fn format_row(cells: &[(String, Option<String>)]) -> String {
    let body = cells
        .iter()
        .map(|(name, value)| format!("{}: {}", name, display_value(value.clone(), MAX_RESULT_VALUE_CHARS)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{ {} }}", body)
}

fn format_sample_block(table: &str, limit: u32, columns: &[String], rows: &[Vec<String>]) -> String {
    let mut block = format!("/*\n{limit} rows from {table} table:\n");
    if !columns.is_empty() {
        block.push_str(&columns.join("\t"));
        block.push('\n');
    }
    for row in rows {
        block.push_str(&row.join("\t"));
        block.push('\n');
    }
    block.push_str("*/");
    block
}

/// Unreadable sample rows leave an empty block rather than failing the schema.
fn append_sample_block(info: &mut String, table: &str, limit: u32, block: Result<String, DbError>) {
    let block = block.unwrap_or_else(|e| {
        warn!(table = %table, error = %e, "could not read sample rows");
        format_sample_block(table, limit, &[], &[])
    });
    info.push_str("\n\n");
    info.push_str(&block);
}

/// Drop the `ENGINE=... DEFAULT CHARSET=...` tail of `SHOW CREATE TABLE`.
fn strip_table_options(ddl: &str) -> String {
    match ddl.rfind("\n)") {
        Some(pos) => format!("{}\n)", &ddl[..pos]),
        None => ddl.trim_end().to_string(),
    }
}

fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}
