mod engine;
mod errors;
mod mood;
mod trending;

pub use engine::{ranked_neighbors, recommend, ScoredPosition};
pub use errors::RecommendError;
pub use mood::{recommend_by_mood, Comparison, Mood, Threshold};
pub use trending::{get_trending, MostFrequentArtist, MostPopularSong, Trending};

/// Result list length used when the caller doesn't ask for one.
pub const DEFAULT_TOP_N: usize = 5;

/// Rejects a non positive result list length.
pub fn validate_top_n(top_n: usize) -> Result<usize, RecommendError> {
    if top_n == 0 {
        return Err(RecommendError::InvalidArgument(
            "top_n must be a positive integer".to_string(),
        ));
    }
    Ok(top_n)
}
