//! "Songs matching mood Y".
//!
//! Every mood is a fixed conjunction of strict thresholds over the audio
//! features. Thresholds are compared against the unscaled feature values
//! stored in the catalog.

use super::{validate_top_n, RecommendError};
use crate::catalog_store::{AudioFeatures, CatalogStore, Feature, ScanControl, SongSummary};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Comparison {
    Above,
    Below,
}

/// A single strict inequality, `feature > value` or `feature < value`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Threshold {
    pub feature: Feature,
    pub comparison: Comparison,
    pub value: f64,
}

const fn above(feature: Feature, value: f64) -> Threshold {
    Threshold {
        feature,
        comparison: Comparison::Above,
        value,
    }
}

const fn below(feature: Feature, value: f64) -> Threshold {
    Threshold {
        feature,
        comparison: Comparison::Below,
        value,
    }
}

impl Threshold {
    pub fn matches(&self, features: &AudioFeatures) -> bool {
        let actual = features.get(self.feature);
        match self.comparison {
            Comparison::Above => actual > self.value,
            Comparison::Below => actual < self.value,
        }
    }
}

use Feature::*;

const HAPPY: &[Threshold] = &[
    above(Valence, 0.7),
    above(Energy, 0.6),
    above(Danceability, 0.5),
];
const SAD: &[Threshold] = &[below(Valence, 0.3), below(Energy, 0.4), below(Tempo, 100.0)];
const ENERGETIC: &[Threshold] = &[above(Energy, 0.8), above(Tempo, 120.0)];
const CALM: &[Threshold] = &[below(Energy, 0.3), below(Tempo, 100.0), above(Valence, 0.4)];
const ROMANTIC: &[Threshold] = &[
    above(Valence, 0.6),
    below(Energy, 0.6),
    below(Speechiness, 0.08),
];
const ANGRY: &[Threshold] = &[above(Energy, 0.8), below(Valence, 0.3), above(Tempo, 110.0)];
const NOSTALGIC: &[Threshold] = &[above(Valence, 0.5), below(Energy, 0.5), below(Tempo, 110.0)];
const FOCUSED: &[Threshold] = &[
    below(Speechiness, 0.05),
    below(Energy, 0.3),
    below(Liveness, 0.1),
];
const CHILL: &[Threshold] = &[below(Energy, 0.4), below(Tempo, 110.0), below(Liveness, 0.2)];
const WORKOUT: &[Threshold] = &[
    above(Energy, 0.75),
    above(Tempo, 120.0),
    above(Danceability, 0.6),
];
const PARTY: &[Threshold] = &[
    above(Energy, 0.7),
    above(Danceability, 0.7),
    above(Valence, 0.6),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mood {
    Happy,
    Sad,
    Energetic,
    Calm,
    Romantic,
    Angry,
    Nostalgic,
    Focused,
    Chill,
    Workout,
    Party,
}

impl Mood {
    pub const ALL: [Mood; 11] = [
        Mood::Happy,
        Mood::Sad,
        Mood::Energetic,
        Mood::Calm,
        Mood::Romantic,
        Mood::Angry,
        Mood::Nostalgic,
        Mood::Focused,
        Mood::Chill,
        Mood::Workout,
        Mood::Party,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Sad => "sad",
            Mood::Energetic => "energetic",
            Mood::Calm => "calm",
            Mood::Romantic => "romantic",
            Mood::Angry => "angry",
            Mood::Nostalgic => "nostalgic",
            Mood::Focused => "focused",
            Mood::Chill => "chill",
            Mood::Workout => "workout",
            Mood::Party => "party",
        }
    }

    pub fn thresholds(&self) -> &'static [Threshold] {
        match self {
            Mood::Happy => HAPPY,
            Mood::Sad => SAD,
            Mood::Energetic => ENERGETIC,
            Mood::Calm => CALM,
            Mood::Romantic => ROMANTIC,
            Mood::Angry => ANGRY,
            Mood::Nostalgic => NOSTALGIC,
            Mood::Focused => FOCUSED,
            Mood::Chill => CHILL,
            Mood::Workout => WORKOUT,
            Mood::Party => PARTY,
        }
    }

    pub fn matches(&self, features: &AudioFeatures) -> bool {
        self.thresholds().iter().all(|t| t.matches(features))
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = RecommendError;

    /// Exact, case-sensitive match.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mood::ALL
            .into_iter()
            .find(|mood| mood.as_str() == s)
            .ok_or_else(|| RecommendError::InvalidMood(s.to_owned()))
    }
}

/// The `top_n` most popular songs matching `mood`.
///
/// The store is scanned in popularity order and the scan stops as soon as
/// enough songs matched, so the connection is held only for that long.
pub fn recommend_by_mood(
    store: &dyn CatalogStore,
    mood: &str,
    top_n: usize,
) -> Result<Vec<SongSummary>, RecommendError> {
    let mood: Mood = mood.parse()?;
    let top_n = validate_top_n(top_n)?;

    let mut matching = Vec::new();
    store
        .scan_by_popularity(&mut |song| {
            if mood.matches(&song.features) {
                matching.push(song.summary());
            }
            if matching.len() >= top_n {
                ScanControl::Stop
            } else {
                ScanControl::Continue
            }
        })
        .map_err(|err| RecommendError::StoreUnavailable(format!("{:#}", err)))?;
    Ok(matching)
}
