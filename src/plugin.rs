//! Catalog plugin: the functions the model can call to look at products.

use std::sync::Arc;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::catalog::CatalogStore;
use crate::tools::{Plugin, Tool};

/// Rows returned when the model does not ask for a specific amount.
pub const DEFAULT_LIMIT: usize = 20;
/// Upper bound on rows returned by a single call.
pub const MAX_LIMIT: usize = 100;

/// Exposes the product catalog to the model.
#[derive(Debug, Clone)]
pub struct CatalogPlugin {
    store: Arc<dyn CatalogStore>,
}

impl CatalogPlugin {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }
}

impl Plugin for CatalogPlugin {
    fn name(&self) -> &str {
        "catalog"
    }

    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        let store = &self.store;
        vec![
            Arc::new(CountProducts(Arc::clone(store))),
            Arc::new(ListProducts(Arc::clone(store))),
            Arc::new(SearchProducts(Arc::clone(store))),
            Arc::new(GetProductByBarcode(Arc::clone(store))),
            Arc::new(PriceSummaryTool(Arc::clone(store))),
        ]
    }
}

fn parse_args<T: for<'de> Deserialize<'de>>(tool: &str, args: Value) -> anyhow::Result<T> {
    // Some models send `null` instead of `{}` for argument-less calls
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args).with_context(|| format!("invalid arguments for {tool}"))
}

fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

fn limit_schema() -> Value {
    json!({
        "type": "integer",
        "description": format!("Maximum number of products to return (default {DEFAULT_LIMIT}, max {MAX_LIMIT})"),
        "minimum": 1,
        "maximum": MAX_LIMIT
    })
}

#[derive(Debug, Deserialize)]
struct LimitArgs {
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    name: String,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct BarcodeArgs {
    barcode: String,
}

#[derive(Debug)]
struct CountProducts(Arc<dyn CatalogStore>);

#[async_trait]
impl Tool for CountProducts {
    fn name(&self) -> &str {
        "count_products"
    }

    fn description(&self) -> &str {
        "Returns how many products exist in the catalog."
    }

    fn schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn call(&self, _args: Value) -> anyhow::Result<Value> {
        let count = self.0.count_products().await?;
        Ok(json!({ "count": count }))
    }
}

#[derive(Debug)]
struct ListProducts(Arc<dyn CatalogStore>);

#[async_trait]
impl Tool for ListProducts {
    fn name(&self) -> &str {
        "list_products"
    }

    fn description(&self) -> &str {
        "Lists catalog products with their id, name, barcode and price."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "limit": limit_schema() }
        })
    }

    async fn call(&self, args: Value) -> anyhow::Result<Value> {
        let args: LimitArgs = parse_args(self.name(), args)?;
        let products = self.0.list_products(clamp_limit(args.limit)).await?;
        Ok(serde_json::to_value(products)?)
    }
}

#[derive(Debug)]
struct SearchProducts(Arc<dyn CatalogStore>);

#[async_trait]
impl Tool for SearchProducts {
    fn name(&self) -> &str {
        "search_products"
    }

    fn description(&self) -> &str {
        "Finds products whose name contains the given text (case-insensitive)."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "description": "Part of the product name" },
                "limit": limit_schema()
            },
            "required": ["name"]
        })
    }

    async fn call(&self, args: Value) -> anyhow::Result<Value> {
        let args: SearchArgs = parse_args(self.name(), args)?;
        let name = args.name.trim();
        if name.is_empty() {
            return Err(anyhow!("name must not be empty"));
        }
        let products = self
            .0
            .search_products(name, clamp_limit(args.limit))
            .await?;
        Ok(serde_json::to_value(products)?)
    }
}

#[derive(Debug)]
struct GetProductByBarcode(Arc<dyn CatalogStore>);

#[async_trait]
impl Tool for GetProductByBarcode {
    fn name(&self) -> &str {
        "get_product_by_barcode"
    }

    fn description(&self) -> &str {
        "Looks up a single product by its EAN-13 barcode."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "barcode": { "type": "string", "description": "13-digit EAN barcode" }
            },
            "required": ["barcode"]
        })
    }

    async fn call(&self, args: Value) -> anyhow::Result<Value> {
        let args: BarcodeArgs = parse_args(self.name(), args)?;
        match self.0.find_by_barcode(args.barcode.trim()).await? {
            Some(product) => Ok(serde_json::to_value(product)?),
            None => Ok(json!({ "found": false, "barcode": args.barcode })),
        }
    }
}

#[derive(Debug)]
struct PriceSummaryTool(Arc<dyn CatalogStore>);

#[async_trait]
impl Tool for PriceSummaryTool {
    fn name(&self) -> &str {
        "price_summary"
    }

    fn description(&self) -> &str {
        "Returns the number of products and the minimum, maximum and average price."
    }

    fn schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn call(&self, _args: Value) -> anyhow::Result<Value> {
        Ok(serde_json::to_value(self.0.price_summary().await?)?)
    }
}
