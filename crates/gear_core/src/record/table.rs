//! Per-type table capability.
//!
//! # Responsibility
//! - Name the table a record type maps to.
//! - Provide the per-column display hook record types may override.
//!
//! # Invariants
//! - The default table name is `"<TABLE_PREFIX>_" + lowercase(TYPE_NAME) + "s"`.
//! - Table names are resolved once, when a record is constructed.

use super::{Record, RecordResult};
use crate::model::value::Value;
use crate::store::Store;

/// Namespace token prepended to every derived table name.
pub const TABLE_PREFIX: &str = "wp_ttg";

/// Capability every record type implements.
///
/// ```
/// use gear_core::Table;
///
/// struct Load;
///
/// impl Table for Load {
///     const TYPE_NAME: &'static str = "Load";
/// }
///
/// assert_eq!(Load::table_name(), "wp_ttg_loads");
/// ```
pub trait Table: Sized {
    /// Short type name the default table name is derived from.
    const TYPE_NAME: &'static str;

    /// Table this type maps to. Override for tables that do not follow the
    /// naming convention.
    fn table_name() -> String {
        default_table_name(Self::TYPE_NAME)
    }

    /// Display value for one column. Defaults to the stored value.
    fn output<S: Store + ?Sized>(record: &Record<'_, Self, S>, column: &str) -> RecordResult<Value> {
        record.get(column).cloned()
    }
}

/// Derives the conventional table name for a type name.
///
/// Pluralization appends `s` unconditionally.
pub fn default_table_name(type_name: &str) -> String {
    format!("{TABLE_PREFIX}_{}s", type_name.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::{default_table_name, Table};

    struct Person;

    impl Table for Person {
        const TYPE_NAME: &'static str = "Person";
    }

    struct Legacy;

    impl Table for Legacy {
        const TYPE_NAME: &'static str = "Legacy";

        fn table_name() -> String {
            "legacy_rows".to_string()
        }
    }

    #[test]
    fn default_table_name_lowercases_and_appends_s() {
        assert_eq!(default_table_name("Load"), "wp_ttg_loads");
        assert_eq!(default_table_name("LoadStop"), "wp_ttg_loadstops");
    }

    #[test]
    fn pluralization_is_not_irregular_aware() {
        assert_eq!(Person::table_name(), "wp_ttg_persons");
    }

    #[test]
    fn override_replaces_convention() {
        assert_eq!(Legacy::table_name(), "legacy_rows");
    }
}
