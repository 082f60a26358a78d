//! # Stage Sync Repository
//!
//! This crate provides the document store abstraction used by the stage
//! uploader, together with a concrete implementation backed by Firestore.

pub mod config;
pub mod errors;
pub mod firestore;
pub mod interfaces;

pub use config::FirestoreConfig;
pub use errors::StoreError;
pub use firestore::FirestoreClient;
pub use interfaces::DocumentStore;
