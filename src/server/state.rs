use axum::extract::FromRef;

use crate::catalog_store::CatalogStore;
use crate::similarity::SimilarityIndex;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedSimilarityIndex = Arc<SimilarityIndex>;
pub type GuardedCatalogStore = Arc<dyn CatalogStore>;

/// Everything a handler may read. Built once at startup and never mutated,
/// so requests share it without locking.
#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub index: GuardedSimilarityIndex,
    /// Source scanned by mood queries.
    pub mood_store: GuardedCatalogStore,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        index: GuardedSimilarityIndex,
        mood_store: GuardedCatalogStore,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            index,
            mood_store,
        }
    }
}

impl FromRef<ServerState> for GuardedSimilarityIndex {
    fn from_ref(input: &ServerState) -> Self {
        input.index.clone()
    }
}

impl FromRef<ServerState> for GuardedCatalogStore {
    fn from_ref(input: &ServerState) -> Self {
        input.mood_store.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
