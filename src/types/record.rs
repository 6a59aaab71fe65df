//! Record types for the sales ingestion pipeline
//!
//! A source row is read once from the delimited file and projected into
//! three entity rows: customer, product and order. Every field is carried
//! as an opaque string; the store decides how to type it.

use serde::Serialize;
use std::fmt;

/// One data line of the sales file, addressed by column name
///
/// Produced by the parser after the column layout has been applied, so
/// the normalizer never needs to know where a column sits in the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceRow {
    pub order_id: String,
    pub product_id: String,
    pub customer_id: String,
    pub product_name: String,
    pub category: String,
    pub region: String,
    pub sale_date: String,
    pub quantity: String,
    pub unit_price: String,
    pub discount: String,
    pub shipping_cost: String,
    pub payment_method: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_address: String,
}

/// Customer projection (4 fields)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub address: String,
}

/// Product projection (3 fields)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub category: String,
}

/// Order projection (10 fields)
///
/// `unit_price` and `shipping_cost` never carry a currency prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRow {
    pub id: String,
    pub customer_id: String,
    pub product_id: String,
    pub region: String,
    pub sale_date: String,
    pub quantity: String,
    pub unit_price: String,
    pub discount: String,
    pub shipping_cost: String,
    pub payment_method: String,
}

/// The three projections of a single source row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    pub customer: CustomerRow,
    pub product: ProductRow,
    pub order: OrderRow,
}

/// Entity types written by the upsert executor, in write order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Customers,
    Products,
    Orders,
}

impl EntityKind {
    /// Table the entity is stored in
    pub fn table(self) -> &'static str {
        match self {
            EntityKind::Customers => "customers",
            EntityKind::Products => "products",
            EntityKind::Orders => "orders",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// Outcome of a committed refresh run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    /// Data rows read from the source
    pub records: u64,
    /// Number of flushes executed
    pub batches: usize,
    /// Size of the final flush (0 when nothing was flushed)
    pub last_batch_len: usize,
}
