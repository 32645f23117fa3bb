use async_trait::async_trait;
use tokio::sync::RwLock;

use super::product::{PriceSummary, Product, StoredProduct};
use super::store::CatalogStore;

/// In-process catalog, used when no database is configured.
#[derive(Debug, Default)]
pub struct MemoryCatalogStore {
    rows: RwLock<Vec<StoredProduct>>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn insert_products(&self, products: &[Product]) -> anyhow::Result<u64> {
        let mut rows = self.rows.write().await;
        let next_id = rows.last().map_or(1, |p| p.id + 1);
        rows.extend(
            products
                .iter()
                .zip(next_id..)
                .map(|(p, id)| StoredProduct::from_product(id, p)),
        );
        Ok(products.len() as u64)
    }

    async fn count_products(&self) -> anyhow::Result<u64> {
        Ok(self.rows.read().await.len() as u64)
    }

    async fn list_products(&self, limit: usize) -> anyhow::Result<Vec<StoredProduct>> {
        Ok(self.rows.read().await.iter().take(limit).cloned().collect())
    }

    async fn search_products(
        &self,
        name_fragment: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<StoredProduct>> {
        let needle = name_fragment.to_lowercase();
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn find_by_barcode(&self, barcode: &str) -> anyhow::Result<Option<StoredProduct>> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .find(|p| p.barcode == barcode)
            .cloned())
    }

    async fn price_summary(&self) -> anyhow::Result<PriceSummary> {
        let rows = self.rows.read().await;
        if rows.is_empty() {
            return Ok(PriceSummary::default());
        }

        let prices = rows.iter().map(|p| p.price);
        let min = prices.clone().fold(f64::INFINITY, f64::min);
        let max = prices.clone().fold(f64::NEG_INFINITY, f64::max);
        let total: f64 = prices.sum();

        Ok(PriceSummary {
            count: rows.len() as u64,
            min: Some(min),
            max: Some(max),
            average: Some(total / rows.len() as f64),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str, barcode: &str, price: f64) -> Product {
        Product {
            name: name.to_string(),
            barcode: barcode.to_string(),
            price,
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let store = MemoryCatalogStore::new();
        store
            .insert_products(&[product("A", "1", 1.0), product("B", "2", 2.0)])
            .await
            .unwrap();
        store.insert_products(&[product("C", "3", 3.0)]).await.unwrap();

        let ids: Vec<i64> = store
            .list_products(10)
            .await
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let store = MemoryCatalogStore::new();
        store
            .insert_products(&[
                product("Rustic Wooden Chair", "1", 12.0),
                product("Sleek Steel Table", "2", 20.0),
                product("Small Wooden Hat", "3", 11.0),
            ])
            .await
            .unwrap();

        let hits = store.search_products("WOODEN", 10).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(store.search_products("wooden", 1).await.unwrap().len(), 1);
        assert!(store.search_products("granite", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_price_summary() {
        let store = MemoryCatalogStore::new();
        assert_eq!(store.price_summary().await.unwrap(), PriceSummary::default());

        store
            .insert_products(&[product("A", "1", 10.0), product("B", "2", 20.0)])
            .await
            .unwrap();
        let summary = store.price_summary().await.unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.min, Some(10.0));
        assert_eq!(summary.max, Some(20.0));
        assert_eq!(summary.average, Some(15.0));
    }
}
