//! Types module
//!
//! Contains core data structures used throughout the pipeline.
//! This module organizes types into logical submodules:
//! - `record`: source rows, entity projections and the run summary
//! - `error`: error types for a refresh run

pub mod error;
pub mod record;

pub use error::IngestError;
pub use record::{
    CustomerRow, EntityKind, NormalizedRecord, OrderRow, ProductRow, RefreshSummary, SourceRow,
};
