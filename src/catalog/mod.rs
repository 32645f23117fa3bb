//! Product catalog: the domain record, fake-data generation and storage.
//!
//! # Architecture
//!
//! - [`Product`] / [`StoredProduct`]: the catalog row, before and after insert
//! - [`ProductGenerator`]: synthetic products with valid EAN-13 barcodes
//! - [`CatalogStore`]: async storage trait, with a Postgres ([`PgCatalogStore`])
//!   and an in-process ([`MemoryCatalogStore`]) implementation
//! - [`seed_catalog`]: generate and bulk-insert N products

pub mod generator;
pub mod memory;
pub mod postgres;
pub mod product;
pub mod store;

pub use generator::{ProductGenerator, ean13_check_digit, is_valid_ean13};
pub use memory::MemoryCatalogStore;
pub use postgres::PgCatalogStore;
pub use product::{PriceSummary, Product, StoredProduct};
pub use store::{CatalogStore, connect, seed_catalog};
