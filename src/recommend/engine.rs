//! "Songs similar to X".

use super::{validate_top_n, RecommendError};
use crate::similarity::SimilarityIndex;

/// A catalog position and its similarity to the queried song.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoredPosition {
    pub position: usize,
    pub score: f32,
}

/// Every catalog position except `query_position`, most similar first.
///
/// Equal scores keep catalog order. The queried song is removed by position
/// rather than by assuming it sorts first, as an identical song may tie with it.
pub fn ranked_neighbors(scores: &[f32], query_position: usize) -> Vec<ScoredPosition> {
    let mut ranked: Vec<ScoredPosition> = scores
        .iter()
        .enumerate()
        .map(|(position, score)| ScoredPosition {
            position,
            score: *score,
        })
        .collect();
    // sort_by is stable.
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.retain(|scored| scored.position != query_position);
    ranked
}

/// Titles of the `top_n` songs most similar to `title`, most similar first.
pub fn recommend(
    index: &SimilarityIndex,
    title: &str,
    top_n: usize,
) -> Result<Vec<String>, RecommendError> {
    let top_n = validate_top_n(top_n)?;
    let position = index
        .position_of(title)
        .ok_or_else(|| RecommendError::NotFound(title.to_owned()))?;
    let scores = index
        .matrix()
        .row(position)
        .ok_or_else(|| RecommendError::NotFound(title.to_owned()))?;

    Ok(ranked_neighbors(scores, position)
        .into_iter()
        .take(top_n)
        .filter_map(|scored| index.song_at(scored.position))
        .map(|song| song.title.clone())
        .collect())
}
