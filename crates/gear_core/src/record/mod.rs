//! Active-record style row wrapper.
//!
//! # Responsibility
//! - Hold one table row's column values in memory.
//! - Normalize column names before every lookup and write.
//! - Delegate load/save/delete/validate to an injected `Store`.
//!
//! # Invariants
//! - Column keys are lowercase and never contain `"<table>."`.
//! - The `id` column is only written by load (primary-key extraction) and by
//!   save (insert result); `set("id", ..)` is a logged no-op.
//! - The table name is resolved once at construction.
//! - A failed store call leaves column values as they were before the call.

use crate::model::column_values::ColumnValues;
use crate::model::value::Value;
use crate::store::{Store, StoreError, ValidationOptions, ValidationReport};
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;

mod table;

pub use table::{default_table_name, Table, TABLE_PREFIX};

/// Reserved primary key column.
pub const PRIMARY_KEY: &str = "id";

pub type RecordResult<T> = Result<T, RecordError>;

/// Record-level failure.
#[derive(Debug)]
pub enum RecordError {
    /// `get`/`output` on a column the record does not hold.
    NoSuchColumn { table: String, column: String },
    /// Load by primary key found no row. The record is left empty.
    RowNotFound { table: String, id: Value },
    Store(StoreError),
}

impl Display for RecordError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSuchColumn { table, column } => {
                write!(f, "no such column `{column}` on {table} record")
            }
            Self::RowNotFound { table, id } => write!(f, "no {table} row with id {id}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RecordError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::NoSuchColumn { .. } | Self::RowNotFound { .. } => None,
        }
    }
}

impl From<StoreError> for RecordError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// What a record is loaded from.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadSource {
    /// Start from an empty row.
    Empty,
    /// Fetch the row with this primary key from the store.
    Id(Value),
    /// Use these column values as-is.
    Columns(ColumnValues),
}

impl From<ColumnValues> for LoadSource {
    fn from(value: ColumnValues) -> Self {
        Self::Columns(value)
    }
}

impl From<Value> for LoadSource {
    fn from(value: Value) -> Self {
        if value.is_null() {
            Self::Empty
        } else {
            Self::Id(value)
        }
    }
}

impl From<i32> for LoadSource {
    fn from(value: i32) -> Self {
        Self::Id(Value::from(value))
    }
}

impl From<i64> for LoadSource {
    fn from(value: i64) -> Self {
        Self::Id(Value::from(value))
    }
}

impl From<&str> for LoadSource {
    fn from(value: &str) -> Self {
        Self::Id(Value::from(value))
    }
}

impl<T: Into<LoadSource>> From<Option<T>> for LoadSource {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}

/// One row of the table `T` maps to, persisted through `S`.
///
/// Mutators return `&mut Self` (or `RecordResult<&mut Self>` when they reach
/// the store) so calls chain:
///
/// ```ignore
/// Record::<Load, _>::empty(&store)
///     .set("origin", "Denver")
///     .set("weight_lbs", 42_000)
///     .save()?;
/// ```
pub struct Record<'s, T: Table, S: Store + ?Sized> {
    store: &'s S,
    table: String,
    column_values: ColumnValues,
    _table: PhantomData<T>,
}

impl<'s, T: Table, S: Store + ?Sized> Record<'s, T, S> {
    /// Creates a record of type `T` and loads it from `source`.
    ///
    /// # Errors
    /// - `RowNotFound` when `source` is an id with no matching row.
    /// - `Store` when the store lookup fails.
    pub fn new(store: &'s S, source: impl Into<LoadSource>) -> RecordResult<Self> {
        let mut record = Self::empty(store);
        record.load(source)?;
        Ok(record)
    }

    /// Creates an empty, unsaved record.
    pub fn empty(store: &'s S) -> Self {
        Self {
            store,
            table: T::table_name(),
            column_values: ColumnValues::new(),
            _table: PhantomData,
        }
    }

    /// Builds one record per row, preserving input order.
    ///
    /// Stops at the first row that fails to load.
    pub fn create_multiple<I>(store: &'s S, rows: I) -> RecordResult<Vec<Self>>
    where
        I: IntoIterator,
        I::Item: Into<LoadSource>,
    {
        rows.into_iter().map(|row| Self::new(store, row)).collect()
    }

    /// Replaces this record's values with the row described by `source`.
    ///
    /// The first source key that case-insensitively equals `id` or
    /// `<table>.id` (in the source's insertion order) becomes the primary
    /// key; any later id-like keys go through `set` and are ignored.
    pub fn load(&mut self, source: impl Into<LoadSource>) -> RecordResult<&mut Self> {
        self.column_values.clear();

        let mut source = match source.into() {
            LoadSource::Empty => return Ok(self),
            LoadSource::Columns(values) => values,
            LoadSource::Id(id) => match self.store.select_row(&self.table, &id)? {
                Some(row) => row,
                None => {
                    debug!(
                        "event=record_load module=record status=not_found table={} id={}",
                        self.table, id
                    );
                    return Err(RecordError::RowNotFound {
                        table: self.table.clone(),
                        id,
                    });
                }
            },
        };

        let qualified_id = format!("{}.{PRIMARY_KEY}", self.table.to_lowercase());
        let id_column = source
            .keys()
            .find(|column| {
                let lowered = column.to_lowercase();
                lowered == PRIMARY_KEY || lowered == qualified_id
            })
            .map(str::to_string);
        if let Some(id_column) = id_column {
            if let Some(id) = source.remove(&id_column) {
                self.column_values.insert(PRIMARY_KEY, id);
            }
        }

        self.set_multiple(source);
        debug!(
            "event=record_load module=record status=ok table={} columns={}",
            self.table,
            self.column_values.len()
        );
        Ok(self)
    }

    /// Inserts the record when it has no id, updates it otherwise.
    pub fn save(&mut self) -> RecordResult<&mut Self> {
        self.save_with(ColumnValues::new())
    }

    /// Merges `updated` into the record, then saves it.
    ///
    /// Columns whose key contains `.` (qualified columns from other tables)
    /// are kept in memory but never persisted.
    pub fn save_with<I, K, V>(&mut self, updated: I) -> RecordResult<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.set_multiple(updated);

        let payload: ColumnValues = self
            .column_values
            .iter()
            .filter(|(column, _)| !column.contains('.'))
            .map(|(column, value)| (column, value.clone()))
            .collect();

        match self.id().cloned() {
            Some(id) => {
                self.store.update_row(&self.table, &id, &payload)?;
                debug!(
                    "event=record_save module=record status=ok mode=update table={} id={}",
                    self.table, id
                );
            }
            None => {
                let id = self.store.insert_row(&self.table, &payload)?;
                debug!(
                    "event=record_save module=record status=ok mode=insert table={} id={}",
                    self.table, id
                );
                self.column_values.insert(PRIMARY_KEY, id);
            }
        }

        Ok(self)
    }

    /// Deletes the stored row (when the record has an id) and clears all
    /// values.
    pub fn delete(&mut self) -> RecordResult<&mut Self> {
        if let Some(id) = self.id().cloned() {
            self.store.delete_row(&self.table, &id)?;
            debug!(
                "event=record_delete module=record status=ok table={} id={}",
                self.table, id
            );
        }

        self.column_values.clear();
        Ok(self)
    }

    /// Sets one column.
    ///
    /// Setting `id` is a no-op: the attempt is reported to the store's debug
    /// sink and logged, and the stored id is left unchanged.
    pub fn set(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        let column = self.normalize_column(column);

        if column == PRIMARY_KEY {
            warn!(
                "event=record_set module=record status=rejected table={} column={} reason=primary_key_immutable",
                self.table, PRIMARY_KEY
            );
            self.store.debug("You are not allowed to change the id.");
            return self;
        }

        self.column_values.insert(column, value);
        self
    }

    /// Applies `set` to every entry, in iteration order.
    pub fn set_multiple<I, K, V>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        for (column, value) in values {
            self.set(column.as_ref(), value);
        }
        self
    }

    /// Returns one column's value.
    ///
    /// # Errors
    /// - `NoSuchColumn` when the record does not hold `column`.
    pub fn get(&self, column: &str) -> RecordResult<&Value> {
        let column = self.normalize_column(column);
        self.column_values
            .get(&column)
            .ok_or_else(|| RecordError::NoSuchColumn {
                table: self.table.clone(),
                column,
            })
    }

    /// Primary key, `None` for unsaved records (absent or `Null` id).
    pub fn id(&self) -> Option<&Value> {
        self.column_values
            .get(PRIMARY_KEY)
            .filter(|id| !id.is_null())
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn column_values(&self) -> &ColumnValues {
        &self.column_values
    }

    /// Display value of one column, as formatted by [`Table::output`].
    pub fn output(&self, column: &str) -> RecordResult<Value> {
        T::output(self, column)
    }

    /// Asks the store whether the current values are valid for the table.
    pub fn validate(&self, options: Option<&ValidationOptions>) -> RecordResult<ValidationReport> {
        Ok(self
            .store
            .validate_row(&self.table, &self.column_values, options)?)
    }

    /// Dumps table, id and column values to the store's debug sink.
    pub fn debug(&self) -> &Self {
        let id = self
            .column_values
            .get(PRIMARY_KEY)
            .filter(|id| !id.is_null())
            .map_or_else(String::new, Value::to_string);
        let columns = self
            .column_values
            .iter()
            .map(|(column, value)| format!("{column}={value}"))
            .collect::<Vec<_>>()
            .join(", ");

        self.store
            .debug("#################### START ####################");
        self.store.debug(&format!("Table: {}", self.table));
        self.store.debug(&format!("id: {id}"));
        self.store.debug("Column Values:");
        self.store.debug(&format!("{{{columns}}}"));
        self.store
            .debug("##################### END #####################");
        self
    }

    fn normalize_column(&self, column: &str) -> String {
        normalize_column(&self.table, column)
    }
}

impl<T: Table, S: Store + ?Sized> Clone for Record<'_, T, S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store,
            table: self.table.clone(),
            column_values: self.column_values.clone(),
            _table: PhantomData,
        }
    }
}

impl<T: Table, S: Store + ?Sized> std::fmt::Debug for Record<'_, T, S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Record")
            .field("table", &self.table)
            .field("column_values", &self.column_values)
            .finish()
    }
}

/// Lowercases `column` and removes every `"<table>."` qualifier in it.
///
/// The qualifier match ignores the table name's case, since the column is
/// lowercased first.
pub fn normalize_column(table: &str, column: &str) -> String {
    let qualifier = format!("{}.", table.to_lowercase());
    column.to_lowercase().replace(&qualifier, "")
}

#[cfg(test)]
mod tests {
    use super::{normalize_column, LoadSource};
    use crate::model::value::Value;

    #[test]
    fn normalize_lowercases_and_strips_table_prefix() {
        assert_eq!(normalize_column("wp_ttg_loads", "Origin"), "origin");
        assert_eq!(
            normalize_column("wp_ttg_loads", "WP_TTG_LOADS.Origin"),
            "origin"
        );
    }

    #[test]
    fn normalize_keeps_other_table_qualifiers() {
        assert_eq!(
            normalize_column("wp_ttg_loads", "wp_ttg_stops.city"),
            "wp_ttg_stops.city"
        );
    }

    #[test]
    fn normalize_removes_every_table_qualifier() {
        assert_eq!(normalize_column("t", "x.t.name"), "x.name");
        let normalized = normalize_column("wp_ttg_loads", "WP_TTG_LOADS.wp_ttg_loads.origin");
        assert_eq!(normalized, "origin");
        assert!(!normalized.contains("wp_ttg_loads."));
    }

    #[test]
    fn null_and_none_sources_load_empty() {
        assert_eq!(LoadSource::from(Value::Null), LoadSource::Empty);
        assert_eq!(LoadSource::from(None::<i64>), LoadSource::Empty);
        assert_eq!(LoadSource::from(Some(3)), LoadSource::Id(Value::Integer(3)));
    }
}
