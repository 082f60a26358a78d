//! Document store trait definition.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::errors::StoreError;

/// Abstract interface for the write side of a document store.
///
/// The uploader only ever overwrites whole documents, so this is the one
/// operation a backend has to provide. Implementations are injected into the
/// loader, which keeps the loader testable with an in-memory store.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` so a single handle can be
/// shared behind an `Arc`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Write a document, replacing any existing document with the same id.
    ///
    /// Fields present in the stored document but absent from `fields` are
    /// removed; this is a set, not a merge.
    ///
    /// # Arguments
    ///
    /// * `collection` - The collection the document belongs to
    /// * `document_id` - The document key within the collection
    /// * `fields` - The full document body
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the document was written
    /// * `Err(StoreError)` - If encoding or the write fails
    async fn set_document(
        &self,
        collection: &str,
        document_id: &str,
        fields: &Map<String, Value>,
    ) -> Result<(), StoreError>;
}
