//! Catalog data models.

use serde::{Deserialize, Serialize};

/// Builds the external identifier of a song.
pub fn make_title(name: &str, artists: &str) -> String {
    format!("{} by {}", name, artists)
}

/// Normalized audio attributes used both for similarity and mood predicates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub valence: f64,
    pub energy: f64,
    pub danceability: f64,
    pub tempo: f64,
    pub speechiness: f64,
    pub liveness: f64,
}

/// A named audio attribute, used to address a feature without string keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Feature {
    Valence,
    Energy,
    Danceability,
    Tempo,
    Speechiness,
    Liveness,
}

impl Feature {
    /// All features, in the order they appear in similarity vectors.
    pub const ALL: [Feature; 6] = [
        Feature::Valence,
        Feature::Energy,
        Feature::Danceability,
        Feature::Tempo,
        Feature::Speechiness,
        Feature::Liveness,
    ];

    pub fn column_name(&self) -> &'static str {
        match self {
            Feature::Valence => "valence",
            Feature::Energy => "energy",
            Feature::Danceability => "danceability",
            Feature::Tempo => "tempo",
            Feature::Speechiness => "speechiness",
            Feature::Liveness => "liveness",
        }
    }
}

impl AudioFeatures {
    pub fn get(&self, feature: Feature) -> f64 {
        match feature {
            Feature::Valence => self.valence,
            Feature::Energy => self.energy,
            Feature::Danceability => self.danceability,
            Feature::Tempo => self.tempo,
            Feature::Speechiness => self.speechiness,
            Feature::Liveness => self.liveness,
        }
    }

    pub fn to_vector(&self) -> [f64; 6] {
        Feature::ALL.map(|feature| self.get(feature))
    }
}

/// One catalog entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub name: String,
    pub artists: String,
    pub title: String,
    #[serde(flatten)]
    pub features: AudioFeatures,
    pub popularity: i64,
}

impl Song {
    pub fn new<N: Into<String>, A: Into<String>>(
        name: N,
        artists: A,
        features: AudioFeatures,
        popularity: i64,
    ) -> Song {
        let name = name.into();
        let artists = artists.into();
        let title = make_title(&name, &artists);
        Song {
            name,
            artists,
            title,
            features,
            popularity,
        }
    }

    pub fn summary(&self) -> SongSummary {
        SongSummary {
            name: self.name.clone(),
            artists: self.artists.clone(),
            title: self.title.clone(),
        }
    }
}

/// Projection returned by mood recommendations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongSummary {
    pub name: String,
    pub artists: String,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_joins_name_and_artists() {
        let song = Song::new("Manchild", "Sabrina Carpenter", AudioFeatures::default(), 80);
        assert_eq!(song.title, "Manchild by Sabrina Carpenter");
        assert_eq!(song.summary().title, song.title);
    }

    #[test]
    fn feature_vector_follows_feature_order() {
        let features = AudioFeatures {
            valence: 0.1,
            energy: 0.2,
            danceability: 0.3,
            tempo: 120.0,
            speechiness: 0.05,
            liveness: 0.4,
        };
        assert_eq!(features.to_vector(), [0.1, 0.2, 0.3, 120.0, 0.05, 0.4]);
        assert_eq!(features.get(Feature::Tempo), 120.0);
    }
}
