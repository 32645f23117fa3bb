//! Seeding tests.
//!
//! The Postgres test requires `TEST_DATABASE_URL`; it is skipped otherwise.

use std::sync::Arc;

use catalog_chat::catalog::{
    CatalogStore, MemoryCatalogStore, PgCatalogStore, ProductGenerator, is_valid_ean13,
    seed_catalog,
};
use catalog_chat::config::{DatabaseConfig, DatabaseProvider};
use serial_test::serial;

// =============================================================================
// Test Utilities
// =============================================================================

/// Get the database URL from environment, or skip test if not set.
fn get_database_url() -> Option<String> {
    std::env::var("TEST_DATABASE_URL").ok()
}

async fn setup_postgres(batch_size: usize) -> Option<PgCatalogStore> {
    let cfg = DatabaseConfig {
        provider: DatabaseProvider::Postgres,
        url: get_database_url()?,
        max_connections: 2,
        run_migrations: true,
    };
    PgCatalogStore::connect(&cfg, batch_size).await.ok()
}

// =============================================================================
// Memory store
// =============================================================================

#[tokio::test]
async fn test_seed_zero_leaves_store_untouched() {
    let store = MemoryCatalogStore::new();
    let mut generator = ProductGenerator::with_seed(10.0, 30.0, 7).unwrap();

    let written = seed_catalog(&store, &mut generator, 0).await.unwrap();
    assert_eq!(written, 0);
    assert_eq!(store.count_products().await.unwrap(), 0);
}

#[tokio::test]
async fn test_seed_writes_valid_products() {
    let store = MemoryCatalogStore::new();
    let mut generator = ProductGenerator::with_seed(10.0, 30.0, 7).unwrap();

    let written = seed_catalog(&store, &mut generator, 250).await.unwrap();
    assert_eq!(written, 250);
    assert_eq!(store.count_products().await.unwrap(), 250);

    let rows = store.list_products(1000).await.unwrap();
    assert_eq!(rows.len(), 250);
    for row in &rows {
        assert!(!row.name.trim().is_empty());
        assert!(is_valid_ean13(&row.barcode), "bad barcode {}", row.barcode);
        assert!((10.0..30.0).contains(&row.price), "price {} out of range", row.price);
    }

    let summary = store.price_summary().await.unwrap();
    assert_eq!(summary.count, 250);
    assert!(summary.min.unwrap() >= 10.0);
    assert!(summary.max.unwrap() < 30.0);
}

#[tokio::test]
async fn test_seed_accumulates_across_runs() {
    let store = MemoryCatalogStore::new();
    let mut generator = ProductGenerator::with_seed(10.0, 30.0, 3).unwrap();

    seed_catalog(&store, &mut generator, 10).await.unwrap();
    seed_catalog(&store, &mut generator, 5).await.unwrap();
    assert_eq!(store.count_products().await.unwrap(), 15);

    let ids: Vec<i64> = store
        .list_products(100)
        .await
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
}

// =============================================================================
// Postgres store
// =============================================================================

#[tokio::test]
#[serial]
async fn test_postgres_bulk_insert_spans_batches() {
    let Some(store) = setup_postgres(64).await else {
        eprintln!("Skipping test: TEST_DATABASE_URL not set");
        return;
    };
    let store: Arc<dyn CatalogStore> = Arc::new(store);
    let mut generator = ProductGenerator::with_seed(10.0, 30.0, 99).unwrap();

    let before = store.count_products().await.unwrap();
    let written = seed_catalog(store.as_ref(), &mut generator, 200).await.unwrap();
    assert_eq!(written, 200);
    assert_eq!(store.count_products().await.unwrap(), before + 200);

    let summary = store.price_summary().await.unwrap();
    assert!(summary.count >= 200);
}

#[tokio::test]
#[serial]
async fn test_postgres_lookups() {
    let Some(store) = setup_postgres(1000).await else {
        eprintln!("Skipping test: TEST_DATABASE_URL not set");
        return;
    };
    let mut generator = ProductGenerator::with_seed(10.0, 30.0, 1234).unwrap();
    let products = generator.generate(3);
    store.insert_products(&products).await.unwrap();

    let found = store
        .find_by_barcode(&products[1].barcode)
        .await
        .unwrap()
        .expect("inserted barcode should be found");
    assert_eq!(found.barcode, products[1].barcode);

    // ILIKE wildcards in user text match literally
    let none = store.search_products("%_%", 10).await.unwrap();
    assert!(none.iter().all(|p| p.name.contains("%_%")));

    let word = products[0].name.split_whitespace().last().unwrap().to_uppercase();
    let hits = store.search_products(&word, 10).await.unwrap();
    assert!(!hits.is_empty());
}
