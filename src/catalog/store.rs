use std::sync::Arc;

use async_trait::async_trait;

use super::generator::ProductGenerator;
use super::memory::MemoryCatalogStore;
use super::postgres::PgCatalogStore;
use super::product::{PriceSummary, Product, StoredProduct};
use crate::config::{DatabaseConfig, DatabaseProvider};

#[async_trait]
pub trait CatalogStore: Send + Sync + std::fmt::Debug {
    /// Bulk-insert products, returning the number of rows written.
    async fn insert_products(&self, products: &[Product]) -> anyhow::Result<u64>;

    async fn count_products(&self) -> anyhow::Result<u64>;

    /// First `limit` products in insertion order.
    async fn list_products(&self, limit: usize) -> anyhow::Result<Vec<StoredProduct>>;

    /// Products whose name contains `name_fragment`, ignoring case.
    async fn search_products(
        &self,
        name_fragment: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<StoredProduct>>;

    async fn find_by_barcode(&self, barcode: &str) -> anyhow::Result<Option<StoredProduct>>;

    async fn price_summary(&self) -> anyhow::Result<PriceSummary>;
}

/// Open the catalog store selected by `database.provider`.
pub async fn connect(
    cfg: &DatabaseConfig,
    batch_size: usize,
) -> anyhow::Result<Arc<dyn CatalogStore>> {
    let store: Arc<dyn CatalogStore> = match cfg.provider {
        DatabaseProvider::Postgres => Arc::new(PgCatalogStore::connect(cfg, batch_size).await?),
        DatabaseProvider::Memory => Arc::new(MemoryCatalogStore::new()),
    };

    tracing::info!(provider = ?cfg.provider, "Catalog store ready");
    Ok(store)
}

/// Generate `count` fake products and write them in one bulk insert.
///
/// Nothing touches the store when `count` is zero.
#[tracing::instrument(name = "catalog.seed", skip(store, generator))]
pub async fn seed_catalog(
    store: &dyn CatalogStore,
    generator: &mut ProductGenerator,
    count: usize,
) -> anyhow::Result<u64> {
    if count == 0 {
        return Ok(0);
    }

    let products = generator.generate(count);
    let written = store.insert_products(&products).await?;

    if written != count as u64 {
        tracing::warn!(requested = count, written, "Bulk insert wrote an unexpected row count");
    } else {
        tracing::info!(written, "Catalog seeded");
    }

    Ok(written)
}
