//! Sales Ingest Library
//! # Overview
//!
//! This library loads a delimited sales file into a relational store of
//! customers, products and orders. Each refresh streams the file once,
//! batches the records and upserts them inside a single transaction, so a
//! run either lands completely or not at all.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Record projections, run summary and the error taxonomy
//! - [`io`] - Streaming CSV reader with header-driven column layout
//! - [`core`] - Refresh pipeline:
//!   - [`core::normalizer`] - Source row to customer/product/order projections
//!   - [`core::accumulator`] - Bounded batches of projections
//!   - [`core::upsert`] - Set-based insert-or-update per entity
//!   - [`core::orchestrator`] - Transaction lifecycle and run state machine
//!   - [`core::coordinator`] - Serialized entry point for every trigger
//! - [`db`] - Pool setup and schema migrations
//! - [`config`], [`logging`], [`cli`] - Ambient setup for the binary
//! - [`server`] - HTTP refresh trigger and startup task
//!
//! # Refresh Semantics
//!
//! - Upserts are idempotent: re-running on an unchanged file changes nothing
//! - Customers and products are written before the orders that reference them
//! - Any failure rolls back every batch of the run

// Module declarations
pub mod cli;
pub mod config;
pub mod core;
pub mod db;
pub mod io;
pub mod logging;
pub mod server;
pub mod types;

pub use crate::core::{BatchConfig, RefreshCoordinator, RefreshOrchestrator, RefreshState, Trigger};
pub use types::{
    CustomerRow, EntityKind, IngestError, NormalizedRecord, OrderRow, ProductRow, RefreshSummary,
    SourceRow,
};
