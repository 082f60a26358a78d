//! Document store error types.
//!
//! This module defines the error types that can occur while authenticating
//! against, or writing to, the document store.

use thiserror::Error;

/// Errors that can occur during document store operations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The service-account key file is missing or malformed.
    #[error("Credentials error: {0}")]
    Credentials(String),

    /// Failed to reach the document store or the token endpoint.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The token endpoint refused the signed assertion.
    #[error("Auth error: {0}")]
    Auth(String),

    /// Failed to encode a document for the wire.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An array was found directly inside another array.
    #[error("Nested array at '{0}' is not supported by the document store")]
    NestedArray(String),

    /// The document id cannot be used as a single path segment.
    #[error("Invalid document id: {0}")]
    InvalidDocumentId(String),

    /// The store rejected the write.
    #[error("Write error: {0}")]
    Write(String),
}

impl StoreError {
    /// Create a credentials error.
    pub fn credentials(msg: impl Into<String>) -> Self {
        Self::Credentials(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create an auth error.
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Create an invalid document id error.
    pub fn invalid_document_id(msg: impl Into<String>) -> Self {
        Self::InvalidDocumentId(msg.into())
    }

    /// Create a write error.
    pub fn write(msg: impl Into<String>) -> Self {
        Self::Write(msg.into())
    }
}
