//! End-to-end integration tests
//!
//! These tests drive complete refresh runs against a temporary SQLite store.
//! Each test:
//! 1. Creates a fresh database file and applies the migrations
//! 2. Uses a fixture from tests/fixtures/ or generates a source file
//! 3. Runs one or more refreshes through the public API
//! 4. Inspects the store contents
//!
//! Covered:
//! - Projection of fixture rows, including currency stripping
//! - Batch counts for a range of sizes
//! - Idempotence and referential ordering
//! - All-or-nothing behaviour on malformed records and upsert failures

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use sales_ingest::db;
    use sales_ingest::{
        BatchConfig, EntityKind, IngestError, RefreshCoordinator, RefreshOrchestrator,
        RefreshState, Trigger,
    };
    use sqlx::SqlitePool;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;

    const HEADER: [&str; 15] = [
        "Order ID",
        "Product ID",
        "Customer ID",
        "Product Name",
        "Category",
        "Region",
        "Date of Sale",
        "Quantity Sold",
        "Unit Price",
        "Discount",
        "Shipping Cost",
        "Payment Method",
        "Customer Name",
        "Customer Email",
        "Customer Address",
    ];

    type OrderSnapshot = (
        String,
        String,
        String,
        String,
        String,
        i64,
        String,
        String,
        String,
        String,
    );

    /// Temporary store plus a directory for generated sources
    struct TestEnv {
        dir: TempDir,
        pool: SqlitePool,
    }

    impl TestEnv {
        async fn new() -> Self {
            let dir = tempfile::tempdir().expect("Failed to create temp dir");
            let url = format!("sqlite://{}", dir.path().join("sales.db").display());
            let pool = db::connect(&url, 2).await.expect("Failed to connect");
            db::migrate(&pool).await.expect("Failed to migrate");
            Self { dir, pool }
        }

        /// Write a generated source with `rows` data rows
        ///
        /// Customers and products repeat so batches carry duplicate keys.
        /// `short_row` replaces that 1-based record with a three-field line.
        fn generate_source(&self, rows: usize, short_row: Option<usize>) -> PathBuf {
            let path = self.dir.path().join(format!("source_{}.csv", rows));
            let mut writer = csv::WriterBuilder::new()
                .flexible(true)
                .from_path(&path)
                .expect("Failed to create source");

            writer.write_record(HEADER).expect("Failed to write header");
            for i in 1..=rows {
                if short_row == Some(i) {
                    writer
                        .write_record([format!("O{}", i), "P1".to_string(), "C1".to_string()])
                        .expect("Failed to write row");
                    continue;
                }

                let customer = i % 97;
                let product = i % 13;
                writer
                    .write_record([
                        format!("O{}", i),
                        format!("P{}", product),
                        format!("C{}", customer),
                        format!("Product {}", product),
                        "Category".to_string(),
                        ["East", "West", "North", "South"][i % 4].to_string(),
                        format!("2024-01-{:02}", i % 28 + 1),
                        (i % 5 + 1).to_string(),
                        format!("${}.99", i % 50),
                        "0.1".to_string(),
                        format!("${}.00", i % 7),
                        "card".to_string(),
                        format!("Customer {}", customer),
                        format!("c{}@example.com", customer),
                        format!("{} Market St, Springfield", customer),
                    ])
                    .expect("Failed to write row");
            }
            writer.flush().expect("Failed to flush source");
            path
        }

        async fn count(&self, table: &str) -> i64 {
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
                .fetch_one(&self.pool)
                .await
                .expect("Failed to count rows")
        }

        async fn total_rows(&self) -> i64 {
            self.count("customers").await + self.count("products").await + self.count("orders").await
        }

        async fn orders(&self) -> Vec<OrderSnapshot> {
            sqlx::query_as(
                "SELECT id, customer_id, product_id, region, sale_date, quantity, unit_price, \
                 discount, shipping_cost, payment_method FROM orders ORDER BY id",
            )
            .fetch_all(&self.pool)
            .await
            .expect("Failed to read orders")
        }

        async fn customers(&self) -> Vec<(String, String, String, String)> {
            sqlx::query_as("SELECT id, name, email, address FROM customers ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .expect("Failed to read customers")
        }

        async fn products(&self) -> Vec<(String, String, String)> {
            sqlx::query_as("SELECT id, name, category FROM products ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .expect("Failed to read products")
        }
    }

    fn fixture(name: &str) -> PathBuf {
        let path = Path::new("tests/fixtures").join(name);
        assert!(path.exists(), "Fixture not found: {}", path.display());
        path
    }

    async fn refresh(
        env: &TestEnv,
        source: &Path,
        batch_size: usize,
    ) -> Result<sales_ingest::RefreshSummary, IngestError> {
        RefreshOrchestrator::new(source, BatchConfig::new(batch_size))
            .run(&env.pool, &CancellationToken::new())
            .await
    }

    #[tokio::test]
    async fn test_sample_fixture_projections() {
        let env = TestEnv::new().await;
        let summary = refresh(&env, &fixture("sample.csv"), 1000).await.unwrap();

        assert_eq!(summary.records, 4);
        assert_eq!(summary.batches, 1);

        let orders = env.orders().await;
        assert_eq!(orders.len(), 4);
        assert_eq!(
            orders[0],
            (
                "O1".to_string(),
                "C1".to_string(),
                "P1".to_string(),
                "East".to_string(),
                "2024-01-01".to_string(),
                2,
                "9.50".to_string(),
                "0.1".to_string(),
                "2.00".to_string(),
                "card".to_string(),
            )
        );

        let customers = env.customers().await;
        assert_eq!(
            customers,
            vec![
                (
                    "C1".to_string(),
                    "Ada Lovelace".to_string(),
                    "ada@example.com".to_string(),
                    "12 Analytical Row, London".to_string()
                ),
                (
                    "C2".to_string(),
                    "Grace Hopper".to_string(),
                    "grace@example.com".to_string(),
                    "1 Compiler Way, Arlington".to_string()
                ),
                (
                    "C3".to_string(),
                    "Alan Turing".to_string(),
                    "alan@example.com".to_string(),
                    "Bletchley Park, Milton Keynes".to_string()
                ),
            ]
        );

        let products = env.products().await;
        assert_eq!(products.len(), 3);
        assert_eq!(
            products[0],
            ("P1".to_string(), "Widget".to_string(), "Tools".to_string())
        );
    }

    #[rstest]
    #[case::prefixed("O3", "19.99", "0.00")]
    #[case::unprefixed("O2", "19.99", "5.00")]
    #[tokio::test]
    async fn test_currency_stripping(
        #[case] order_id: &str,
        #[case] unit_price: &str,
        #[case] shipping_cost: &str,
    ) {
        let env = TestEnv::new().await;
        refresh(&env, &fixture("sample.csv"), 1000).await.unwrap();

        let (price, shipping): (String, String) =
            sqlx::query_as("SELECT unit_price, shipping_cost FROM orders WHERE id = ?")
                .bind(order_id)
                .fetch_one(&env.pool)
                .await
                .unwrap();
        assert_eq!(price, unit_price);
        assert_eq!(shipping, shipping_cost);
    }

    #[tokio::test]
    async fn test_reordered_header_maps_by_name() {
        let env = TestEnv::new().await;
        refresh(&env, &fixture("reordered.csv"), 1000).await.unwrap();

        let orders = env.orders().await;
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].0, "O1");
        assert_eq!(orders[0].1, "C1");
        assert_eq!(orders[0].2, "P1");
        assert_eq!(orders[0].6, "9.50");
        assert_eq!(orders[0].8, "2.00");
        assert_eq!(
            env.customers().await[0].2,
            "ada@example.com".to_string()
        );
    }

    #[tokio::test]
    async fn test_scenario_2500_rows_cap_1000() {
        let env = TestEnv::new().await;
        let source = env.generate_source(2500, None);

        let summary = refresh(&env, &source, 1000).await.unwrap();

        assert_eq!(summary.records, 2500);
        assert_eq!(summary.batches, 3);
        assert_eq!(summary.last_batch_len, 500);
        assert_eq!(env.count("orders").await, 2500);
        assert!(env.count("customers").await <= 2500);
        assert!(env.count("products").await <= 2500);
    }

    #[rstest]
    #[case::empty(0, 100, 0, 0)]
    #[case::single_row(1, 100, 1, 1)]
    #[case::below_cap(99, 100, 1, 99)]
    #[case::exact_cap(100, 100, 1, 100)]
    #[case::one_over(101, 100, 2, 1)]
    #[case::exact_multiple(300, 100, 3, 100)]
    #[case::remainder(250, 100, 3, 50)]
    #[case::cap_of_one(5, 1, 5, 1)]
    #[tokio::test]
    async fn test_batch_size_invariant(
        #[case] rows: usize,
        #[case] cap: usize,
        #[case] expected_batches: usize,
        #[case] expected_last: usize,
    ) {
        let env = TestEnv::new().await;
        let source = env.generate_source(rows, None);

        let summary = refresh(&env, &source, cap).await.unwrap();

        assert_eq!(summary.batches, rows.div_ceil(cap));
        assert_eq!(summary.batches, expected_batches);
        assert_eq!(summary.last_batch_len, expected_last);
        assert_eq!(env.count("orders").await, rows as i64);
    }

    #[tokio::test]
    async fn test_idempotent_refresh() {
        let env = TestEnv::new().await;
        let source = env.generate_source(1234, None);

        refresh(&env, &source, 500).await.unwrap();
        let orders = env.orders().await;
        let customers = env.customers().await;
        let products = env.products().await;

        refresh(&env, &source, 500).await.unwrap();

        assert_eq!(env.orders().await, orders);
        assert_eq!(env.customers().await, customers);
        assert_eq!(env.products().await, products);
        assert_eq!(orders.len(), 1234);
    }

    #[tokio::test]
    async fn test_referential_ordering() {
        let env = TestEnv::new().await;
        let source = env.generate_source(700, None);
        refresh(&env, &source, 64).await.unwrap();

        let orphans: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders o \
             LEFT JOIN customers c ON c.id = o.customer_id \
             LEFT JOIN products p ON p.id = o.product_id \
             WHERE c.id IS NULL OR p.id IS NULL",
        )
        .fetch_one(&env.pool)
        .await
        .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn test_existing_rows_outside_source_are_kept() {
        let env = TestEnv::new().await;
        sqlx::query("INSERT INTO customers (id, name, email, address) VALUES ('C-keep', 'Kept', 'k@example.com', 'Here')")
            .execute(&env.pool)
            .await
            .unwrap();

        refresh(&env, &fixture("sample.csv"), 1000).await.unwrap();

        assert_eq!(env.count("customers").await, 4);
    }

    #[tokio::test]
    async fn test_malformed_record_rolls_back_everything() {
        let env = TestEnv::new().await;
        let source = env.generate_source(2500, Some(1200));

        let mut orchestrator = RefreshOrchestrator::new(&source, BatchConfig::new(1000));
        let error = orchestrator
            .run(&env.pool, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(
            matches!(
                error,
                IngestError::MalformedRecord {
                    record: 1200,
                    ..
                }
            ),
            "unexpected error: {:?}",
            error
        );
        assert!(matches!(orchestrator.state(), RefreshState::Failed { .. }));
        assert_eq!(env.total_rows().await, 0);
    }

    #[tokio::test]
    async fn test_upsert_failure_in_later_batch_rolls_back_earlier_batches() {
        let env = TestEnv::new().await;
        let source = env.generate_source(2500, None);
        sqlx::query(
            "CREATE TRIGGER reject_order BEFORE INSERT ON orders \
             WHEN NEW.id = 'O1500' BEGIN SELECT RAISE(ABORT, 'order rejected'); END",
        )
        .execute(&env.pool)
        .await
        .unwrap();

        let error = refresh(&env, &source, 1000).await.unwrap_err();

        match error {
            IngestError::UpsertFailure { entity, batch, .. } => {
                assert_eq!(entity, EntityKind::Orders);
                assert_eq!(batch, 2);
            }
            other => panic!("expected UpsertFailure, got {:?}", other),
        }
        assert_eq!(env.total_rows().await, 0);
    }

    #[tokio::test]
    async fn test_failed_run_keeps_previous_contents() {
        let env = TestEnv::new().await;
        refresh(&env, &fixture("sample.csv"), 1000).await.unwrap();
        let before = env.orders().await;

        let broken = env.generate_source(50, Some(30));
        refresh(&env, &broken, 10).await.unwrap_err();

        assert_eq!(env.orders().await, before);
    }

    #[tokio::test]
    async fn test_empty_source_is_header_error() {
        let env = TestEnv::new().await;
        let path = env.dir.path().join("empty.csv");
        std::fs::write(&path, "").unwrap();

        let error = refresh(&env, &path, 1000).await.unwrap_err();
        assert!(matches!(error, IngestError::HeaderReadError { .. }));
    }

    #[tokio::test]
    async fn test_reordered_header_with_renamed_column_writes_nothing() {
        let env = TestEnv::new().await;
        let reordered = std::fs::read_to_string(fixture("reordered.csv")).unwrap();
        let renamed = reordered.replacen("unit_price", "price", 1);
        let path = env.dir.path().join("renamed.csv");
        std::fs::write(&path, renamed).unwrap();

        let error = refresh(&env, &path, 1000).await.unwrap_err();
        assert_eq!(
            error,
            IngestError::header_read("header is missing columns: Unit Price")
        );
        assert_eq!(env.total_rows().await, 0);
    }

    #[tokio::test]
    async fn test_missing_source_is_unavailable() {
        let env = TestEnv::new().await;
        let path = env.dir.path().join("absent.csv");

        let error = refresh(&env, &path, 1000).await.unwrap_err();
        assert!(matches!(error, IngestError::SourceUnavailable { .. }));
        assert_eq!(env.total_rows().await, 0);
    }

    #[tokio::test]
    async fn test_coordinator_serializes_overlapping_triggers() {
        let env = TestEnv::new().await;
        let source = env.generate_source(900, None);
        let coordinator = std::sync::Arc::new(RefreshCoordinator::new(
            env.pool.clone(),
            source,
            BatchConfig::new(100),
        ));

        let background = std::sync::Arc::clone(&coordinator).spawn_background(CancellationToken::new());
        let on_demand = coordinator
            .refresh(Trigger::OnDemand, &CancellationToken::new())
            .await
            .unwrap();
        let startup = background.await.unwrap().unwrap();

        assert_eq!(on_demand, startup);
        assert_eq!(on_demand.batches, 9);
        assert_eq!(env.count("orders").await, 900);
    }

    #[tokio::test]
    async fn test_cancelled_refresh_leaves_store_untouched() {
        let env = TestEnv::new().await;
        let source = env.generate_source(300, None);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let error = RefreshOrchestrator::new(&source, BatchConfig::new(100))
            .run(&env.pool, &cancel)
            .await
            .unwrap_err();

        assert_eq!(error, IngestError::Cancelled);
        assert_eq!(env.total_rows().await, 0);
    }
}
