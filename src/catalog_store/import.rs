//! Raw dataset import.
//!
//! Turns the raw song dataset (CSV with a header row) into the catalog the
//! server loads: `(name, artists)` duplicates are dropped keeping the first
//! row, then songs at or below the popularity threshold are filtered out.

use super::{AudioFeatures, SqliteCatalogStore, Song};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

/// Songs need strictly more than this popularity to make it into the catalog.
pub const DEFAULT_MIN_POPULARITY: i64 = 30;

#[derive(Clone, Debug)]
pub struct ImportOptions {
    pub min_popularity: i64,
}

impl Default for ImportOptions {
    fn default() -> Self {
        ImportOptions {
            min_popularity: DEFAULT_MIN_POPULARITY,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportStats {
    pub rows_read: usize,
    pub malformed: usize,
    pub duplicates: usize,
    pub below_threshold: usize,
    pub duplicate_titles: usize,
    pub imported: usize,
}

/// Columns we need from the dataset, everything else is ignored.
#[derive(Debug, Deserialize)]
struct RawSongRecord {
    name: String,
    artists: String,
    popularity: i64,
    valence: f64,
    energy: f64,
    danceability: f64,
    tempo: f64,
    speechiness: f64,
    liveness: f64,
}

impl From<RawSongRecord> for Song {
    fn from(raw: RawSongRecord) -> Song {
        Song::new(
            raw.name,
            raw.artists,
            AudioFeatures {
                valence: raw.valence,
                energy: raw.energy,
                danceability: raw.danceability,
                tempo: raw.tempo,
                speechiness: raw.speechiness,
                liveness: raw.liveness,
            },
            raw.popularity,
        )
    }
}

/// Datasets in the wild are often latin-1, fall back to it when a field is not utf-8.
fn decode_field(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_owned(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn decode_record(record: &csv::ByteRecord) -> csv::StringRecord {
    record.iter().map(decode_field).collect()
}

/// Read, deduplicate and filter songs from a CSV source.
pub fn read_songs_csv<R: std::io::Read>(
    source: R,
    options: &ImportOptions,
) -> Result<(Vec<Song>, ImportStats)> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(source);
    let headers = decode_record(reader.byte_headers().context("Failed to read CSV headers")?);

    let mut stats = ImportStats::default();
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut songs = vec![];

    for (line_index, byte_record) in reader.byte_records().enumerate() {
        stats.rows_read += 1;
        let raw: RawSongRecord = match byte_record
            .map_err(anyhow::Error::from)
            .and_then(|r| Ok(decode_record(&r).deserialize(Some(&headers))?))
        {
            Ok(raw) => raw,
            Err(err) => {
                // +2: one for the header line, one because lines are 1-based.
                warn!("Skipping malformed row at line {}: {}", line_index + 2, err);
                stats.malformed += 1;
                continue;
            }
        };

        if !seen.insert((raw.name.clone(), raw.artists.clone())) {
            stats.duplicates += 1;
            continue;
        }
        if raw.popularity <= options.min_popularity {
            stats.below_threshold += 1;
            continue;
        }
        songs.push(Song::from(raw));
    }

    Ok((songs, stats))
}

/// Rebuild the catalog database at `db_path` from the CSV dataset at `csv_path`.
pub fn import_csv<C: AsRef<Path>, D: AsRef<Path>>(
    csv_path: C,
    db_path: D,
    options: &ImportOptions,
) -> Result<ImportStats> {
    let csv_path = csv_path.as_ref();
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("Failed to open dataset {:?}", csv_path))?;
    let (songs, mut stats) = read_songs_csv(file, options)?;
    info!(
        "Read {} rows from {:?}, {} songs pass the filters",
        stats.rows_read,
        csv_path,
        songs.len()
    );

    let summary = SqliteCatalogStore::write_catalog(db_path, &songs)?;
    stats.imported = summary.inserted;
    stats.duplicate_titles = summary.skipped_duplicate_titles;
    Ok(stats)
}
