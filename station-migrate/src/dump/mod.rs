//! Dump module - parsing legacy SQL dumps and loading typed legacy rows
pub mod loader;
pub mod parser;

pub use loader::{load_legacy_data, load_row_set, merge_records, LegacyTable, RowSet};
pub use parser::{parse_sql, parse_sql_file, InsertRecord};
