//! # Stage Sync Ingest
//!
//! This crate reads puzzle stage definitions from local JSON files and
//! writes them into the document store.
//!
//! ## Architecture
//!
//! 1. **Processor**: Parses a stage file and flattens fields the store cannot hold
//! 2. **Loader**: Walks the stage directory and writes each stage

pub mod errors;
pub mod loader;
pub mod processor;

pub use errors::IngestError;
pub use loader::{LoaderConfig, StageLoader, UploadOutcome, UploadSummary};
pub use processor::StageDocument;
