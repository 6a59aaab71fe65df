//! Upsert executor
//!
//! Writes one batch inside the caller's transaction as three set-based
//! statements, one per entity, in the order customers, products, orders.
//! Each statement inserts every row of the batch in a single round trip and
//! overwrites all non-key columns when the primary key already exists.
//!
//! The executor never begins, commits or rolls back; the orchestrator owns
//! the transaction.

use crate::core::accumulator::Batch;
use crate::types::{CustomerRow, EntityKind, IngestError, OrderRow, ProductRow};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::debug;

/// Build the customer upsert for a slice of rows
pub fn customers_statement(rows: &[CustomerRow]) -> QueryBuilder<'_, Sqlite> {
    let mut builder = QueryBuilder::new("INSERT INTO customers (id, name, email, address) ");
    builder.push_values(rows, |mut b, row| {
        b.push_bind(row.id.as_str())
            .push_bind(row.name.as_str())
            .push_bind(row.email.as_str())
            .push_bind(row.address.as_str());
    });
    builder.push(
        " ON CONFLICT (id) DO UPDATE SET \
         name = excluded.name, \
         email = excluded.email, \
         address = excluded.address",
    );
    builder
}

/// Build the product upsert for a slice of rows
pub fn products_statement(rows: &[ProductRow]) -> QueryBuilder<'_, Sqlite> {
    let mut builder = QueryBuilder::new("INSERT INTO products (id, name, category) ");
    builder.push_values(rows, |mut b, row| {
        b.push_bind(row.id.as_str())
            .push_bind(row.name.as_str())
            .push_bind(row.category.as_str());
    });
    builder.push(
        " ON CONFLICT (id) DO UPDATE SET \
         name = excluded.name, \
         category = excluded.category",
    );
    builder
}

/// Build the order upsert for a slice of rows
pub fn orders_statement(rows: &[OrderRow]) -> QueryBuilder<'_, Sqlite> {
    let mut builder = QueryBuilder::new(
        "INSERT INTO orders (id, customer_id, product_id, region, sale_date, quantity, \
         unit_price, discount, shipping_cost, payment_method) ",
    );
    builder.push_values(rows, |mut b, row| {
        b.push_bind(row.id.as_str())
            .push_bind(row.customer_id.as_str())
            .push_bind(row.product_id.as_str())
            .push_bind(row.region.as_str())
            .push_bind(row.sale_date.as_str())
            .push_bind(row.quantity.as_str())
            .push_bind(row.unit_price.as_str())
            .push_bind(row.discount.as_str())
            .push_bind(row.shipping_cost.as_str())
            .push_bind(row.payment_method.as_str());
    });
    builder.push(
        " ON CONFLICT (id) DO UPDATE SET \
         customer_id = excluded.customer_id, \
         product_id = excluded.product_id, \
         region = excluded.region, \
         sale_date = excluded.sale_date, \
         quantity = excluded.quantity, \
         unit_price = excluded.unit_price, \
         discount = excluded.discount, \
         shipping_cost = excluded.shipping_cost, \
         payment_method = excluded.payment_method",
    );
    builder
}

/// Run one built statement, tagging any failure with its entity and batch
async fn run_statement(
    conn: &mut SqliteConnection,
    mut builder: QueryBuilder<'_, Sqlite>,
    entity: EntityKind,
    batch_number: usize,
) -> Result<u64, IngestError> {
    let result = builder
        .build()
        .execute(conn)
        .await
        .map_err(|e| IngestError::upsert_failure(entity, batch_number, e))?;

    debug!(
        %entity,
        batch = batch_number,
        rows_affected = result.rows_affected(),
        "Upsert statement applied"
    );
    Ok(result.rows_affected())
}

/// Apply one batch to the store
///
/// # Arguments
///
/// * `conn` - Connection of the caller's open transaction
/// * `batch` - Rows to write; an empty batch issues no statements
/// * `batch_number` - 1-based number used in errors and logs
///
/// # Returns
///
/// * `Ok(u64)` - Total rows affected across the three statements
/// * `Err(UpsertFailure)` - The first statement that failed; later
///   statements are not attempted
pub async fn upsert_batch(
    conn: &mut SqliteConnection,
    batch: &Batch<'_>,
    batch_number: usize,
) -> Result<u64, IngestError> {
    if batch.is_empty() {
        return Ok(0);
    }

    let mut affected = run_statement(
        &mut *conn,
        customers_statement(batch.customers),
        EntityKind::Customers,
        batch_number,
    )
    .await?;
    affected += run_statement(
        &mut *conn,
        products_statement(batch.products),
        EntityKind::Products,
        batch_number,
    )
    .await?;
    affected += run_statement(
        &mut *conn,
        orders_statement(batch.orders),
        EntityKind::Orders,
        batch_number,
    )
    .await?;

    Ok(affected)
}
