//! Firestore implementation of the document store.

mod client;
pub mod credentials;
pub mod value;

pub use client::FirestoreClient;

#[cfg(test)]
mod test_support;
