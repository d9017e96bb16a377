//! SQLite implementation of the `Store` contract.
//!
//! # Responsibility
//! - Translate row-level store calls into single SQL statements.
//! - Map SQLite values to and from `Value`.
//! - Validate rows against the live table schema.
//!
//! # Invariants
//! - Table and column names are checked against `IDENTIFIER_RE` and quoted
//!   before being spliced into SQL; values are always bound.
//! - The primary key column is named `id`.

use super::{Store, StoreError, StoreResult, ValidationOptions, ValidationReport};
use crate::model::column_values::ColumnValues;
use crate::model::value::Value;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef};
use rusqlite::{params, params_from_iter, Connection};
use std::iter;

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

const PRIMARY_KEY_COLUMN: &str = "id";

/// SQLite-backed store over a borrowed connection.
pub struct SqliteStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn table_columns(&self, table: &str) -> StoreResult<Vec<SchemaColumn>> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({});", quote_identifier(table)?))?;
        let mut rows = stmt.query([])?;
        let mut columns = Vec::new();

        while let Some(row) = rows.next()? {
            columns.push(SchemaColumn {
                name: row.get::<_, String>("name")?.to_lowercase(),
                not_null: row.get::<_, i64>("notnull")? != 0,
                has_default: !matches!(row.get_ref("dflt_value")?, ValueRef::Null),
                primary_key: row.get::<_, i64>("pk")? != 0,
            });
        }

        Ok(columns)
    }
}

struct SchemaColumn {
    name: String,
    not_null: bool,
    has_default: bool,
    primary_key: bool,
}

impl Store for SqliteStore<'_> {
    fn select_row(&self, table: &str, id: &Value) -> StoreResult<Option<ColumnValues>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT * FROM {} WHERE {} = ?1 LIMIT 1;",
            quote_identifier(table)?,
            quote_identifier(PRIMARY_KEY_COLUMN)?
        ))?;
        let column_names: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut rows = stmt.query(params![id])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };

        let mut values = ColumnValues::new();
        for (index, column) in column_names.iter().enumerate() {
            let value = value_from_sql(row.get_ref(index)?).map_err(|kind| {
                StoreError::InvalidData(format!("unsupported {kind} value in {table}.{column}"))
            })?;
            values.insert(column.as_str(), value);
        }

        Ok(Some(values))
    }

    fn insert_row(&self, table: &str, values: &ColumnValues) -> StoreResult<Value> {
        let table_sql = quote_identifier(table)?;

        if values.is_empty() {
            self.conn
                .execute(&format!("INSERT INTO {table_sql} DEFAULT VALUES;"), [])?;
        } else {
            let columns = values
                .keys()
                .map(quote_identifier)
                .collect::<StoreResult<Vec<_>>>()?;
            let placeholders = (1..=columns.len())
                .map(|index| format!("?{index}"))
                .collect::<Vec<_>>();
            self.conn.execute(
                &format!(
                    "INSERT INTO {table_sql} ({}) VALUES ({});",
                    columns.join(", "),
                    placeholders.join(", ")
                ),
                params_from_iter(values.values()),
            )?;
        }

        let id = match values.get(PRIMARY_KEY_COLUMN) {
            Some(id) if !id.is_null() => id.clone(),
            _ => Value::Integer(self.conn.last_insert_rowid()),
        };
        debug!("event=row_insert module=store status=ok table={table} id={id}");
        Ok(id)
    }

    fn update_row(&self, table: &str, id: &Value, values: &ColumnValues) -> StoreResult<()> {
        let table_sql = quote_identifier(table)?;
        let id_sql = quote_identifier(PRIMARY_KEY_COLUMN)?;

        let changed = if values.is_empty() {
            // Nothing to write; still report a missing row.
            self.conn.query_row(
                &format!("SELECT COUNT(*) FROM {table_sql} WHERE {id_sql} = ?1;"),
                params![id],
                |row| row.get::<_, usize>(0),
            )?
        } else {
            let assignments = values
                .keys()
                .enumerate()
                .map(|(index, column)| {
                    quote_identifier(column).map(|column| format!("{column} = ?{}", index + 1))
                })
                .collect::<StoreResult<Vec<_>>>()?;
            self.conn.execute(
                &format!(
                    "UPDATE {table_sql} SET {} WHERE {id_sql} = ?{};",
                    assignments.join(", "),
                    values.len() + 1
                ),
                params_from_iter(values.values().chain(iter::once(id))),
            )?
        };

        if changed == 0 {
            return Err(StoreError::NotFound {
                table: table.to_string(),
                id: id.clone(),
            });
        }

        debug!("event=row_update module=store status=ok table={table} id={id}");
        Ok(())
    }

    fn delete_row(&self, table: &str, id: &Value) -> StoreResult<()> {
        let deleted = self.conn.execute(
            &format!(
                "DELETE FROM {} WHERE {} = ?1;",
                quote_identifier(table)?,
                quote_identifier(PRIMARY_KEY_COLUMN)?
            ),
            params![id],
        )?;

        debug!("event=row_delete module=store status=ok table={table} id={id} deleted={deleted}");
        Ok(())
    }

    fn validate_row(
        &self,
        table: &str,
        values: &ColumnValues,
        options: Option<&ValidationOptions>,
    ) -> StoreResult<ValidationReport> {
        let schema = self.table_columns(table)?;
        if schema.is_empty() {
            return Err(StoreError::UnknownTable(table.to_string()));
        }

        let defaults = ValidationOptions::default();
        let options = options.unwrap_or(&defaults);
        let mut report = ValidationReport::default();

        for (column, value) in values.iter() {
            if column.contains('.') {
                continue;
            }
            let lowered = column.to_lowercase();
            if !schema.iter().any(|schema_column| schema_column.name == lowered) {
                report.push(column, "unknown column");
                continue;
            }
            if let (Some(max_len), Value::Text(text)) = (options.max_text_len, value) {
                if text.chars().count() > max_len {
                    report.push(column, format!("value exceeds {max_len} characters"));
                }
            }
        }

        if !options.partial {
            for schema_column in &schema {
                let required =
                    schema_column.not_null && !schema_column.has_default && !schema_column.primary_key;
                if required && is_missing(values, &schema_column.name) {
                    report.push(schema_column.name.as_str(), "required column is missing");
                }
            }
        }

        for column in &options.required {
            let column = column.to_lowercase();
            if is_missing(values, &column) && !report.has_issue_for(&column) {
                report.push(column, "required column is missing");
            }
        }

        debug!(
            "event=row_validate module=store status=ok table={} valid={} issues={}",
            table,
            report.is_valid(),
            report.issues.len()
        );
        Ok(report)
    }

    fn debug(&self, message: &str) {
        debug!("event=store_debug module=store backend=sqlite message={message}");
    }
}

// Bool and Timestamp are stored as INTEGER and read back as `Value::Integer`.
impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Null => ToSqlOutput::Owned(SqlValue::Null),
            Self::Bool(value) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*value))),
            Self::Integer(value) | Self::Timestamp(value) => {
                ToSqlOutput::Owned(SqlValue::Integer(*value))
            }
            Self::Float(value) => ToSqlOutput::Owned(SqlValue::Real(*value)),
            Self::Text(value) => ToSqlOutput::Borrowed(ValueRef::Text(value.as_bytes())),
        })
    }
}

/// Maps one SQLite cell to a `Value`; blobs have no `Value` counterpart.
fn value_from_sql(value: ValueRef<'_>) -> Result<Value, &'static str> {
    match value {
        ValueRef::Null => Ok(Value::Null),
        ValueRef::Integer(value) => Ok(Value::Integer(value)),
        ValueRef::Real(value) => Ok(Value::Float(value)),
        ValueRef::Text(bytes) => Ok(Value::Text(String::from_utf8_lossy(bytes).into_owned())),
        ValueRef::Blob(_) => Err("blob"),
    }
}

fn is_missing(values: &ColumnValues, column: &str) -> bool {
    values
        .iter()
        .find(|(key, _)| key.to_lowercase() == column)
        .map_or(true, |(_, value)| value.is_null())
}

fn quote_identifier(name: &str) -> StoreResult<String> {
    if !IDENTIFIER_RE.is_match(name) {
        return Err(StoreError::InvalidIdentifier(name.to_string()));
    }
    Ok(format!("\"{name}\""))
}
