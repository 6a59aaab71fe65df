//! Core refresh pipeline
//!
//! This module contains the components of a refresh run:
//! - `normalizer` - Projects source rows into customer, product and order rows
//! - `accumulator` - Buffers projections into bounded batches
//! - `upsert` - Set-based insert-or-update statements per batch
//! - `orchestrator` - Transaction lifecycle and the run state machine
//! - `coordinator` - Serialized entry point shared by every trigger

pub mod accumulator;
pub mod coordinator;
pub mod normalizer;
pub mod orchestrator;
pub mod upsert;

pub use accumulator::{Batch, BatchAccumulator, BatchConfig, DEFAULT_BATCH_SIZE, MAX_BATCH_SIZE};
pub use coordinator::{report_outcome, RefreshCoordinator, Trigger};
pub use normalizer::{normalize, strip_currency};
pub use orchestrator::{RefreshOrchestrator, RefreshState};
pub use upsert::upsert_batch;
