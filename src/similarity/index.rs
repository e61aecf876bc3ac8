//! The loaded similarity index: catalog, matrix and title lookup.

use super::{LoadError, SimilarityMatrix};
use crate::catalog_store::{Catalog, CatalogStore, Song};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Immutable for the lifetime of the server, shared across requests without locking.
#[derive(Debug)]
pub struct SimilarityIndex {
    catalog: Catalog,
    matrix: SimilarityMatrix,
    title_index: HashMap<String, usize>,
}

impl SimilarityIndex {
    /// Pair a catalog with its matrix, the matrix must have one row per song.
    pub fn new(catalog: Catalog, matrix: SimilarityMatrix) -> Result<SimilarityIndex, LoadError> {
        if matrix.dim() != catalog.len() {
            return Err(LoadError::DimensionMismatch {
                matrix: matrix.dim(),
                catalog: catalog.len(),
            });
        }

        let mut title_index = HashMap::with_capacity(catalog.len());
        for (position, song) in catalog.iter().enumerate() {
            if title_index.contains_key(&song.title) {
                warn!(
                    "Title \"{}\" appears again at position {}, keeping the first one",
                    song.title, position
                );
                continue;
            }
            title_index.insert(song.title.clone(), position);
        }

        Ok(SimilarityIndex {
            catalog,
            matrix,
            title_index,
        })
    }

    /// Load the catalog from `store` and the matrix from `matrix_path`.
    pub fn load<P: AsRef<Path>>(
        store: &dyn CatalogStore,
        matrix_path: P,
    ) -> Result<SimilarityIndex, LoadError> {
        let catalog = Catalog::load(store).map_err(|err| LoadError::Store(format!("{:#}", err)))?;
        let matrix = SimilarityMatrix::load(matrix_path)?;
        let index = SimilarityIndex::new(catalog, matrix)?;
        info!(
            "Similarity index ready: {} songs, {} distinct titles",
            index.catalog.len(),
            index.title_index.len()
        );
        Ok(index)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn matrix(&self) -> &SimilarityMatrix {
        &self.matrix
    }

    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    pub fn position_of(&self, title: &str) -> Option<usize> {
        self.title_index.get(title).copied()
    }

    pub fn song_at(&self, position: usize) -> Option<&Song> {
        self.catalog.get(position)
    }
}
