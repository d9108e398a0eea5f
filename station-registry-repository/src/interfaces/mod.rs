//! This module defines and re-exports the interfaces for the registry store.
mod registry_store;

pub use registry_store::RegistryStore;
