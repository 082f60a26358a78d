//! Processor module for the stage sync ingest.
//!
//! Turns raw stage JSON into documents the store accepts.

mod stage_document;

pub use stage_document::{StageDocument, FLATTENED_FIELDS};
