//! Error types for the stage sync repository.

mod store_error;

pub use store_error::StoreError;
