mod catalog;
pub mod import;
mod models;
mod schema;
mod store;
mod trait_def;

pub use catalog::Catalog;
pub use models::*;
pub use schema::CATALOG_VERSIONED_SCHEMAS;
pub use store::{SqliteCatalogStore, WriteSummary, DEFAULT_READ_POOL_SIZE};
pub use trait_def::{CatalogStore, ScanControl};
