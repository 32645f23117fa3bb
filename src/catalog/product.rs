use serde::{Deserialize, Serialize};

/// A catalog product before it is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    /// EAN-13 barcode, 13 ASCII digits.
    pub barcode: String,
    pub price: f64,
}

/// A product row read back from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoredProduct {
    pub id: i64,
    pub name: String,
    pub barcode: String,
    pub price: f64,
}

impl StoredProduct {
    pub fn from_product(id: i64, product: &Product) -> Self {
        Self {
            id,
            name: product.name.clone(),
            barcode: product.barcode.clone(),
            price: product.price,
        }
    }
}

/// Aggregate prices over the whole catalog. Bounds are `None` when empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSummary {
    pub count: u64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub average: Option<f64>,
}
