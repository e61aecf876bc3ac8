//! SQLite schema for the songs catalog.
//!
//! Row order (rowid) is the catalog order: the similarity matrix is built
//! against it, so rows are only ever inserted by a full rebuild.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};

pub const SONGS_TABLE_NAME: &str = "songs";

const SONGS_TABLE: Table = Table {
    name: SONGS_TABLE_NAME,
    columns: &[
        sqlite_column!("title", &SqlType::Text, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("artists", &SqlType::Text, non_null = true),
        sqlite_column!("valence", &SqlType::Real, non_null = true),
        sqlite_column!("energy", &SqlType::Real, non_null = true),
        sqlite_column!("danceability", &SqlType::Real, non_null = true),
        sqlite_column!("tempo", &SqlType::Real, non_null = true),
        sqlite_column!("speechiness", &SqlType::Real, non_null = true),
        sqlite_column!("liveness", &SqlType::Real, non_null = true),
        sqlite_column!("popularity", &SqlType::Integer, non_null = true),
        // Reserved, never read by the recommender.
        sqlite_column!(
            "play_count",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
    ],
    indices: &[("idx_songs_popularity", "popularity")],
};

pub const CATALOG_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[SONGS_TABLE],
}];

/// Columns selected when materializing a [`super::Song`], in `parse_song_row` order.
pub const SONG_COLUMNS: &str =
    "name, artists, title, valence, energy, danceability, tempo, speechiness, liveness, popularity";
