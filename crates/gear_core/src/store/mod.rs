//! Persistence collaborator contract.
//!
//! # Responsibility
//! - Define the row-level operations a record delegates to (`Store`).
//! - Define the validation request/report shapes stores exchange.
//! - Provide the SQLite-backed implementation.
//!
//! # Invariants
//! - Records never issue SQL themselves; every persistence effect goes
//!   through one `Store` call.
//! - Store errors reach callers unchanged.

use crate::db::DbError;
use crate::model::column_values::ColumnValues;
use crate::model::value::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod sqlite_store;

pub use sqlite_store::SqliteStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure reported by a [`Store`] implementation.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// Table or column name rejected before reaching SQL.
    InvalidIdentifier(String),
    UnknownTable(String),
    /// Update targeted a row that does not exist.
    NotFound {
        table: String,
        id: Value,
    },
    /// Persisted data cannot be represented as a [`Value`].
    InvalidData(String),
    /// Failure from a non-SQLite backend.
    Backend(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidIdentifier(name) => write!(f, "invalid sql identifier `{name}`"),
            Self::UnknownTable(table) => write!(f, "table `{table}` does not exist"),
            Self::NotFound { table, id } => write!(f, "row not found: {table}.id={id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted row data: {message}"),
            Self::Backend(message) => write!(f, "store backend error: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Caller-supplied knobs for [`Store::validate_row`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Columns that must be present and non-null, on top of schema rules.
    pub required: Vec<String>,
    /// Skip schema `NOT NULL` checks, for validating partial updates.
    pub partial: bool,
    /// Maximum character length for text values.
    pub max_text_len: Option<usize>,
}

/// One failed rule for one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub column: String,
    pub message: String,
}

/// Pass/fail outcome of [`Store::validate_row`] with per-column detail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn push(&mut self, column: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            column: column.into(),
            message: message.into(),
        });
    }

    /// Returns whether any issue was reported for `column`.
    pub fn has_issue_for(&self, column: &str) -> bool {
        self.issues.iter().any(|issue| issue.column == column)
    }
}

/// Row-level persistence operations a record delegates to.
///
/// Implementations own all persistent data. Methods take `&self`; stores that
/// need mutable state use interior mutability.
pub trait Store {
    /// Fetches one row by primary key, `None` when it does not exist.
    fn select_row(&self, table: &str, id: &Value) -> StoreResult<Option<ColumnValues>>;
    /// Inserts one row and returns its primary key.
    fn insert_row(&self, table: &str, values: &ColumnValues) -> StoreResult<Value>;
    fn update_row(&self, table: &str, id: &Value, values: &ColumnValues) -> StoreResult<()>;
    fn delete_row(&self, table: &str, id: &Value) -> StoreResult<()>;
    fn validate_row(
        &self,
        table: &str,
        values: &ColumnValues,
        options: Option<&ValidationOptions>,
    ) -> StoreResult<ValidationReport>;

    /// Diagnostic sink.
    fn debug(&self, message: &str) {
        log::debug!("event=store_debug module=store message={message}");
    }
}
