mod builder;
mod index;
mod matrix;

pub use builder::{build_matrix_file, build_similarity_matrix, scaled_feature_vectors};
pub use index::SimilarityIndex;
pub use matrix::SimilarityMatrix;

use std::path::PathBuf;
use thiserror::Error;

/// Errors that make the similarity index unusable. All of them abort startup.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{artifact} not found at {path:?}")]
    MissingArtifact {
        artifact: &'static str,
        path: PathBuf,
    },

    #[error("Malformed similarity matrix: {0}")]
    MalformedMatrix(String),

    #[error("Similarity matrix is {matrix}x{matrix} but the catalog has {catalog} songs")]
    DimensionMismatch { matrix: usize, catalog: usize },

    #[error("Catalog store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
