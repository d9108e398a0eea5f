//! # Station Registry Repository
//! This crate provides the write-side boundary of the normalized cellular
//! station registry. It includes the canonical row types, the
//! [`RegistryStore`] trait consumed by the migration writer, and concrete
//! implementations for PostgreSQL and for an in-memory store used by tests and
//! dry runs.
pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod postgres;
pub mod types;

pub use errors::RegistryStoreError;
pub use interfaces::RegistryStore;
pub use memory::InMemoryRegistryStore;
pub use postgres::PostgresRegistryStore;
