use thiserror::Error;

/// Represents errors that can occur within a registry store.
///
/// This enum consolidates database failures together with the contract
/// violations the writer relies on, such as a bulk insert that returned a
/// different number of ids than rows it was given.
#[derive(Debug, Error)]
pub enum RegistryStoreError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Insert into {table} returned {actual} ids for {expected} rows")]
    ResultCountMismatch {
        table: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Insert into {table} returned no id for key {key}")]
    UnmatchedKey { table: &'static str, key: String },

    #[error("Unique constraint violated on {table}: {key}")]
    DuplicateKey { table: &'static str, key: String },

    #[error("No row with id {id} in {table}")]
    UnknownId { table: &'static str, id: i64 },

    #[error("Store rejected the write: {0}")]
    Rejected(String),
}
