//! Record normalizer
//!
//! Projects one source row into its customer, product and order rows.
//! The mapping is pure and never fails; arity problems are caught by the
//! reader before a row gets here.

use crate::types::{CustomerRow, NormalizedRecord, OrderRow, ProductRow, SourceRow};

/// Currency symbol stripped from monetary fields
pub const CURRENCY_PREFIX: char = '$';

/// Remove one leading currency symbol, if present
pub fn strip_currency(value: &str) -> &str {
    value.strip_prefix(CURRENCY_PREFIX).unwrap_or(value)
}

/// Normalize a source row into its three entity projections
pub fn normalize(row: SourceRow) -> NormalizedRecord {
    let unit_price = strip_currency(&row.unit_price).to_string();
    let shipping_cost = strip_currency(&row.shipping_cost).to_string();

    NormalizedRecord {
        customer: CustomerRow {
            id: row.customer_id.clone(),
            name: row.customer_name,
            email: row.customer_email,
            address: row.customer_address,
        },
        product: ProductRow {
            id: row.product_id.clone(),
            name: row.product_name,
            category: row.category,
        },
        order: OrderRow {
            id: row.order_id,
            customer_id: row.customer_id,
            product_id: row.product_id,
            region: row.region,
            sale_date: row.sale_date,
            quantity: row.quantity,
            unit_price,
            discount: row.discount,
            shipping_cost,
            payment_method: row.payment_method,
        },
    }
}
