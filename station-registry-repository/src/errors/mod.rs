//! Error types for the station registry repository.
mod registry_store;

pub use registry_store::RegistryStoreError;
