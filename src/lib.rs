//! Song Recommender Server Library
//!
//! Content-based song recommendations over a precomputed similarity matrix.
//! This library exposes the internal modules for the binaries and for testing.

pub mod catalog_store;
pub mod config;
pub mod recommend;
pub mod server;
pub mod similarity;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use catalog_store::{Catalog, CatalogStore, SqliteCatalogStore};
pub use recommend::{get_trending, recommend, recommend_by_mood, Mood, RecommendError};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
pub use similarity::{LoadError, SimilarityIndex, SimilarityMatrix};
