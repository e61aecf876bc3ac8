//! Dataset-wide aggregates.

use crate::catalog_store::{Catalog, Song};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MostPopularSong {
    pub name: String,
    pub artists: String,
    pub popularity: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MostFrequentArtist {
    pub artists: String,
    pub song_count_in_dataset: usize,
}

/// Both fields are `None` only for an empty catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Trending {
    pub most_popular_song: Option<MostPopularSong>,
    pub most_frequent_artist_in_dataset: Option<MostFrequentArtist>,
}

/// Most popular song and most frequent `artists` value.
///
/// Ties go to the earliest song in catalog order. Artists are compared as
/// whole strings, a collaboration counts as its own artist.
pub fn get_trending(catalog: &Catalog) -> Trending {
    let most_popular_song = catalog
        .iter()
        .fold(None, |best: Option<&Song>, song| match best {
            Some(best) if best.popularity >= song.popularity => Some(best),
            _ => Some(song),
        })
        .map(|song| MostPopularSong {
            name: song.name.clone(),
            artists: song.artists.clone(),
            popularity: song.popularity,
        });

    // (count, first position) per artists value.
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (position, song) in catalog.iter().enumerate() {
        counts
            .entry(song.artists.as_str())
            .or_insert((0, position))
            .0 += 1;
    }
    let most_frequent_artist_in_dataset = counts
        .into_iter()
        .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .map(|(artists, (count, _))| MostFrequentArtist {
            artists: artists.to_owned(),
            song_count_in_dataset: count,
        });

    Trending {
        most_popular_song,
        most_frequent_artist_in_dataset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_store::AudioFeatures;

    fn song(name: &str, artists: &str, popularity: i64) -> Song {
        Song::new(name, artists, AudioFeatures::default(), popularity)
    }

    #[test]
    fn picks_max_popularity_and_most_frequent_artist() {
        let catalog = Catalog::new(vec![
            song("a", "X", 40),
            song("b", "Y", 90),
            song("c", "X", 60),
            song("d", "Z", 10),
        ]);
        let trending = get_trending(&catalog);
        assert_eq!(
            trending.most_popular_song,
            Some(MostPopularSong {
                name: "b".to_string(),
                artists: "Y".to_string(),
                popularity: 90,
            })
        );
        assert_eq!(
            trending.most_frequent_artist_in_dataset,
            Some(MostFrequentArtist {
                artists: "X".to_string(),
                song_count_in_dataset: 2,
            })
        );
    }

    #[test]
    fn ties_go_to_the_first_in_catalog_order() {
        let catalog = Catalog::new(vec![
            song("a", "Y", 70),
            song("b", "X", 80),
            song("c", "X", 80),
            song("d", "Y", 20),
        ]);
        let trending = get_trending(&catalog);
        assert_eq!(trending.most_popular_song.unwrap().name, "b");
        assert_eq!(
            trending.most_frequent_artist_in_dataset.unwrap().artists,
            "Y"
        );
    }

    #[test]
    fn collaborations_are_counted_as_a_whole() {
        let catalog = Catalog::new(vec![
            song("a", "X, Y", 50),
            song("b", "X", 50),
            song("c", "X, Y", 50),
        ]);
        let artist = get_trending(&catalog)
            .most_frequent_artist_in_dataset
            .unwrap();
        assert_eq!(artist.artists, "X, Y");
        assert_eq!(artist.song_count_in_dataset, 2);
    }

    #[test]
    fn empty_catalog_serializes_nulls() {
        let trending = get_trending(&Catalog::default());
        assert_eq!(
            serde_json::to_value(&trending).unwrap(),
            serde_json::json!({
                "most_popular_song": null,
                "most_frequent_artist_in_dataset": null,
            })
        );
    }
}
