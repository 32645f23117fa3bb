use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use super::product::{PriceSummary, Product, StoredProduct};
use super::store::CatalogStore;
use crate::config::DatabaseConfig;

/// Postgres caps a statement at 65535 bind parameters; each row binds three.
const MAX_ROWS_PER_STATEMENT: usize = 65_535 / 3;

#[derive(Debug, Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
    batch_size: usize,
}

impl PgCatalogStore {
    pub async fn connect(cfg: &DatabaseConfig, batch_size: usize) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(cfg.max_connections)
            .connect(&cfg.url)
            .await?;

        if cfg.run_migrations {
            sqlx::migrate!("./migrations").run(&pool).await?;
        }

        Ok(Self::from_pool(pool, batch_size))
    }

    pub fn from_pool(pool: PgPool, batch_size: usize) -> Self {
        Self {
            pool,
            batch_size: batch_size.clamp(1, MAX_ROWS_PER_STATEMENT),
        }
    }
}

/// Escape `%`, `_` and `\` so user text matches literally inside ILIKE.
fn like_pattern(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len() + 2);
    escaped.push('%');
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    #[tracing::instrument(
        name = "db.insert_products",
        skip_all,
        fields(db.system = "postgresql", db.operation = "INSERT", rows = products.len())
    )]
    async fn insert_products(&self, products: &[Product]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut written = 0;

        for chunk in products.chunks(self.batch_size) {
            let mut qb: QueryBuilder<Postgres> =
                QueryBuilder::new("INSERT INTO products (name, barcode, price) ");
            qb.push_values(chunk, |mut row, p| {
                row.push_bind(p.name.clone())
                    .push_bind(p.barcode.clone())
                    .push_bind(p.price);
            });
            written += qb.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        Ok(written)
    }

    #[tracing::instrument(
        name = "db.count_products",
        skip_all,
        fields(db.system = "postgresql", db.operation = "SELECT")
    )]
    async fn count_products(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count)?)
    }

    #[tracing::instrument(
        name = "db.list_products",
        skip(self),
        fields(db.system = "postgresql", db.operation = "SELECT")
    )]
    async fn list_products(&self, limit: usize) -> Result<Vec<StoredProduct>> {
        let rows = sqlx::query_as::<_, StoredProduct>(
            "SELECT id, name, barcode, price FROM products ORDER BY id LIMIT $1",
        )
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    #[tracing::instrument(
        name = "db.search_products",
        skip(self),
        fields(db.system = "postgresql", db.operation = "SELECT")
    )]
    async fn search_products(&self, name_fragment: &str, limit: usize) -> Result<Vec<StoredProduct>> {
        let rows = sqlx::query_as::<_, StoredProduct>(
            r"
            SELECT id, name, barcode, price
            FROM products
            WHERE name ILIKE $1
            ORDER BY id
            LIMIT $2
            ",
        )
        .bind(like_pattern(name_fragment))
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    #[tracing::instrument(
        name = "db.find_by_barcode",
        skip(self),
        fields(db.system = "postgresql", db.operation = "SELECT")
    )]
    async fn find_by_barcode(&self, barcode: &str) -> Result<Option<StoredProduct>> {
        let row = sqlx::query_as::<_, StoredProduct>(
            "SELECT id, name, barcode, price FROM products WHERE barcode = $1 ORDER BY id LIMIT 1",
        )
        .bind(barcode)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    #[tracing::instrument(
        name = "db.price_summary",
        skip_all,
        fields(db.system = "postgresql", db.operation = "SELECT")
    )]
    async fn price_summary(&self) -> Result<PriceSummary> {
        let row = sqlx::query(
            r"
            SELECT COUNT(*) AS count, MIN(price) AS min, MAX(price) AS max, AVG(price) AS average
            FROM products
            ",
        )
        .fetch_one(&self.pool)
        .await?;

        let count: i64 = row.try_get("count")?;
        Ok(PriceSummary {
            count: u64::try_from(count)?,
            min: row.try_get("min")?,
            max: row.try_get("max")?,
            average: row.try_get("average")?,
        })
    }
}
