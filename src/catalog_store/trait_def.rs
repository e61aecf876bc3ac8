//! CatalogStore trait definition.
//!
//! The recommender only ever reads the catalog, so the trait is a narrow
//! read interface over whatever persisted the songs table.

use super::Song;
use anyhow::Result;

/// Returned by a scan visitor to tell the store whether to keep going.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanControl {
    Continue,
    Stop,
}

/// Trait for catalog storage backends.
pub trait CatalogStore: Send + Sync {
    /// Load every song in catalog order (the order the similarity matrix was built in).
    fn load_songs(&self) -> Result<Vec<Song>>;

    /// Get the number of songs in the catalog.
    fn songs_count(&self) -> Result<usize>;

    /// Stream songs ordered by popularity, highest first, catalog order on ties.
    ///
    /// The visitor decides when to stop, so callers only pay for the rows they need.
    fn scan_by_popularity(&self, visitor: &mut dyn FnMut(Song) -> ScanControl) -> Result<()>;
}
