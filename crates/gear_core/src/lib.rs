//! Active-record style row persistence.
//!
//! A [`Record`] holds one table row in memory and delegates every persistence
//! effect to an injected [`Store`]. [`SqliteStore`] is the bundled store.

pub mod db;
pub mod logging;
pub mod model;
pub mod record;
pub mod store;

pub use logging::{default_log_level, init_logging, logging_status, LogConfig, LoggingError};
pub use model::column_values::ColumnValues;
pub use model::value::Value;
pub use record::{
    default_table_name, normalize_column, LoadSource, Record, RecordError, RecordResult, Table,
    PRIMARY_KEY, TABLE_PREFIX,
};
pub use store::{
    SqliteStore, Store, StoreError, StoreResult, ValidationIssue, ValidationOptions,
    ValidationReport,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
