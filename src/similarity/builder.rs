//! Offline construction of the similarity matrix from song features.

use super::{LoadError, SimilarityMatrix};
use crate::catalog_store::{CatalogStore, Feature, Song};
use anyhow::Context;
use rayon::prelude::*;
use std::path::Path;
use std::time::Instant;
use tracing::info;

const FEATURES_COUNT: usize = Feature::ALL.len();

type FeatureVector = [f64; FEATURES_COUNT];

/// Min-max scale every feature column to `[0, 1]`.
///
/// Tempo is in BPM while the other features are already fractions, unscaled it
/// would drown them out. A constant column scales to 0.
pub fn scaled_feature_vectors(songs: &[Song]) -> Vec<FeatureVector> {
    let raw: Vec<FeatureVector> = songs.iter().map(|s| s.features.to_vector()).collect();

    let mut min = [f64::INFINITY; FEATURES_COUNT];
    let mut max = [f64::NEG_INFINITY; FEATURES_COUNT];
    for vector in &raw {
        for (column, value) in vector.iter().enumerate() {
            min[column] = min[column].min(*value);
            max[column] = max[column].max(*value);
        }
    }

    raw.into_iter()
        .map(|vector| {
            let mut scaled = [0.0; FEATURES_COUNT];
            for column in 0..FEATURES_COUNT {
                let range = max[column] - min[column];
                scaled[column] = if range > 0.0 && range.is_finite() {
                    (vector[column] - min[column]) / range
                } else {
                    0.0
                };
            }
            scaled
        })
        .collect()
}

fn norm(vector: &FeatureVector) -> f64 {
    vector.iter().map(|v| v * v).sum::<f64>().sqrt()
}

fn cosine(a: &FeatureVector, norm_a: f64, b: &FeatureVector, norm_b: f64) -> f64 {
    if norm_a > 0.0 && norm_b > 0.0 {
        let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Cosine similarity of every pair of songs, in catalog order.
///
/// The diagonal is always 1.0, including for songs whose scaled features are all
/// zero, so a song is never less similar to itself than to anything else.
pub fn build_similarity_matrix(songs: &[Song]) -> Result<SimilarityMatrix, LoadError> {
    let vectors = scaled_feature_vectors(songs);
    let norms: Vec<f64> = vectors.iter().map(norm).collect();
    let dim = vectors.len();

    let scores: Vec<f32> = (0..dim)
        .into_par_iter()
        .flat_map_iter(|i| {
            let vectors = &vectors;
            let norms = &norms;
            (0..dim).map(move |j| {
                if i == j {
                    1.0
                } else {
                    cosine(&vectors[i], norms[i], &vectors[j], norms[j]) as f32
                }
            })
        })
        .collect();

    // Fails only when a feature itself is not finite.
    SimilarityMatrix::new(dim, scores)
}

/// Build the matrix for every song in `store`, in row order, and save it to `matrix_path`.
pub fn build_matrix_file<P: AsRef<Path>>(
    store: &dyn CatalogStore,
    matrix_path: P,
) -> anyhow::Result<SimilarityMatrix> {
    let matrix_path = matrix_path.as_ref();
    let songs = store.load_songs().context("Failed to load the catalog")?;
    info!("Computing similarity for {} songs...", songs.len());

    let start = Instant::now();
    let matrix = build_similarity_matrix(&songs)?;
    info!(
        "Computed a {0}x{0} matrix in {1:.1?}",
        matrix.dim(),
        start.elapsed()
    );

    matrix.save(matrix_path)?;
    info!("Similarity matrix written to {:?}", matrix_path);
    Ok(matrix)
}
