//! In-memory catalog, loaded once at startup and never mutated.

use super::trait_def::{CatalogStore, ScanControl};
use super::Song;
use anyhow::Result;

/// Ordered songs; a song's position in the catalog is its row in the similarity matrix.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    songs: Vec<Song>,
}

impl Catalog {
    pub fn new(songs: Vec<Song>) -> Catalog {
        Catalog { songs }
    }

    pub fn load(store: &dyn CatalogStore) -> Result<Catalog> {
        Ok(Catalog::new(store.load_songs()?))
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&Song> {
        self.songs.get(position)
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn iter(&self) -> impl Iterator<Item = &Song> {
        self.songs.iter()
    }
}

impl CatalogStore for Catalog {
    fn load_songs(&self) -> Result<Vec<Song>> {
        Ok(self.songs.clone())
    }

    fn songs_count(&self) -> Result<usize> {
        Ok(self.songs.len())
    }

    fn scan_by_popularity(&self, visitor: &mut dyn FnMut(Song) -> ScanControl) -> Result<()> {
        let mut positions: Vec<usize> = (0..self.songs.len()).collect();
        // Stable sort, equal popularity keeps catalog order.
        positions.sort_by(|a, b| self.songs[*b].popularity.cmp(&self.songs[*a].popularity));
        for position in positions {
            if visitor(self.songs[position].clone()) == ScanControl::Stop {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_store::AudioFeatures;

    #[test]
    fn scan_by_popularity_is_stable() {
        let catalog = Catalog::new(vec![
            Song::new("a", "x", AudioFeatures::default(), 1),
            Song::new("b", "x", AudioFeatures::default(), 7),
            Song::new("c", "x", AudioFeatures::default(), 1),
            Song::new("d", "x", AudioFeatures::default(), 7),
        ]);
        let mut names = vec![];
        catalog
            .scan_by_popularity(&mut |song| {
                names.push(song.name);
                ScanControl::Continue
            })
            .unwrap();
        assert_eq!(names, vec!["b", "d", "a", "c"]);
    }
}
