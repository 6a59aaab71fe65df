//! Batch accumulator
//!
//! Buffers normalized records until a batch is full. The three buffers
//! always hold the same number of rows; the order buffer decides when a
//! flush is due.

use crate::types::{CustomerRow, NormalizedRecord, OrderRow, ProductRow};
use tracing::warn;

/// Default number of records per batch
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Largest accepted batch size
///
/// The order statement binds 10 parameters per row; this keeps it below
/// SQLite's limit of 32,766 bound parameters.
pub const MAX_BATCH_SIZE: usize = 3000;

/// Configuration for batch processing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of records per batch
    pub batch_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig with a custom batch size
    ///
    /// Zero falls back to the default and sizes above `MAX_BATCH_SIZE` are
    /// clamped; both cases log a warning.
    pub fn new(batch_size: usize) -> Self {
        let batch_size = if batch_size == 0 {
            warn!(
                batch_size,
                default = DEFAULT_BATCH_SIZE,
                "Invalid batch size, using default"
            );
            DEFAULT_BATCH_SIZE
        } else if batch_size > MAX_BATCH_SIZE {
            warn!(
                batch_size,
                max = MAX_BATCH_SIZE,
                "Batch size too large, clamping"
            );
            MAX_BATCH_SIZE
        } else {
            batch_size
        };

        Self { batch_size }
    }
}

/// A borrowed view of the rows waiting to be flushed
#[derive(Debug, Clone, Copy)]
pub struct Batch<'a> {
    pub customers: &'a [CustomerRow],
    pub products: &'a [ProductRow],
    pub orders: &'a [OrderRow],
}

impl Batch<'_> {
    /// Number of source records in the batch
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

/// Accumulates normalized records into fixed-size batches
#[derive(Debug)]
pub struct BatchAccumulator {
    capacity: usize,
    customers: Vec<CustomerRow>,
    products: Vec<ProductRow>,
    orders: Vec<OrderRow>,
}

impl BatchAccumulator {
    /// Create an empty accumulator for the configured batch size
    pub fn new(config: BatchConfig) -> Self {
        let capacity = config.batch_size.max(1);
        Self {
            capacity,
            customers: Vec::with_capacity(capacity),
            products: Vec::with_capacity(capacity),
            orders: Vec::with_capacity(capacity),
        }
    }

    /// Append one record to all three buffers
    ///
    /// Returns `true` when the batch has reached capacity and must be
    /// flushed before the next push.
    pub fn push(&mut self, record: NormalizedRecord) -> bool {
        self.customers.push(record.customer);
        self.products.push(record.product);
        self.orders.push(record.order);
        self.is_full()
    }

    pub fn is_full(&self) -> bool {
        self.orders.len() >= self.capacity
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Rows currently buffered
    pub fn batch(&self) -> Batch<'_> {
        Batch {
            customers: &self.customers,
            products: &self.products,
            orders: &self.orders,
        }
    }

    /// Empty all buffers, keeping their allocations
    pub fn reset(&mut self) {
        self.customers.clear();
        self.products.clear();
        self.orders.clear();
    }
}
