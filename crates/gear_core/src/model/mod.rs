//! Row-level data model shared by records and stores.
//!
//! # Responsibility
//! - Define the typed `Value` every column holds.
//! - Define the ordered `ColumnValues` map a row is carried in.
//!
//! # Invariants
//! - Column order is insertion order everywhere a row is iterated.

pub mod column_values;
pub mod value;
