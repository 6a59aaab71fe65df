//! I/O module
//!
//! Handles reading the sales file.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (column layout, row extraction)
//! - `async_reader` - Asynchronous reader yielding one row at a time

pub mod async_reader;
pub mod csv_format;

pub use async_reader::SalesReader;
pub use csv_format::{ColumnLayout, SourceColumn};
