//! SQLite-backed catalog store implementation.
//!
//! Serving opens the database read-only with a small pool of connections;
//! the offline pipeline goes through [`SqliteCatalogStore::write_catalog`],
//! which always rebuilds the table from scratch.

use super::schema::{CATALOG_VERSIONED_SCHEMAS, SONGS_TABLE_NAME, SONG_COLUMNS};
use super::trait_def::{CatalogStore, ScanControl};
use super::{AudioFeatures, Song};
use anyhow::{anyhow, bail, Context, Result};
use rusqlite::{params, Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

pub const DEFAULT_READ_POOL_SIZE: usize = 4;

/// Outcome of writing a catalog with [`SqliteCatalogStore::write_catalog`].
#[derive(Debug, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub inserted: usize,
    pub skipped_duplicate_titles: usize,
}

/// SQLite-backed, read-only catalog store.
#[derive(Clone)]
pub struct SqliteCatalogStore {
    read_pool: Vec<Arc<Mutex<Connection>>>,
    read_index: Arc<AtomicUsize>,
    db_path: PathBuf,
}

fn latest_schema() -> &'static crate::sqlite_persistence::VersionedSchema {
    &CATALOG_VERSIONED_SCHEMAS[CATALOG_VERSIONED_SCHEMAS.len() - 1]
}

impl SqliteCatalogStore {
    /// Open an existing catalog database.
    ///
    /// # Arguments
    /// * `db_path` - Path to the SQLite database file, it must exist
    /// * `read_pool_size` - Number of connections for concurrent read operations
    pub fn open<P: AsRef<Path>>(db_path: P, read_pool_size: usize) -> Result<Self> {
        let db_path = db_path.as_ref();
        if !db_path.is_file() {
            bail!("Catalog database not found at {:?}", db_path);
        }
        if read_pool_size == 0 {
            bail!("Catalog read pool size must be at least 1");
        }

        let mut read_pool = Vec::with_capacity(read_pool_size);
        for _ in 0..read_pool_size {
            let read_conn = Connection::open_with_flags(
                db_path,
                OpenFlags::SQLITE_OPEN_READ_ONLY
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .with_context(|| format!("Failed to open catalog database {:?}", db_path))?;
            read_pool.push(Arc::new(Mutex::new(read_conn)));
        }

        {
            let conn = read_pool[0]
                .lock()
                .map_err(|_| anyhow!("Catalog connection poisoned"))?;
            latest_schema()
                .validate(&conn)
                .with_context(|| format!("Invalid catalog database {:?}", db_path))?;
        }

        let store = SqliteCatalogStore {
            read_pool,
            read_index: Arc::new(AtomicUsize::new(0)),
            db_path: db_path.to_path_buf(),
        };
        info!(
            "Opened catalog {:?}: {} songs, {} read connections",
            store.db_path,
            store.songs_count()?,
            read_pool_size
        );
        Ok(store)
    }

    /// Create (or replace) a catalog database holding exactly `songs`, in order.
    ///
    /// Songs whose title is already present are skipped, the first one wins.
    pub fn write_catalog<P: AsRef<Path>>(db_path: P, songs: &[Song]) -> Result<WriteSummary> {
        let db_path = db_path.as_ref();
        if db_path.exists() {
            std::fs::remove_file(db_path)
                .with_context(|| format!("Failed to remove old catalog {:?}", db_path))?;
        }

        let mut conn = Connection::open(db_path)
            .with_context(|| format!("Failed to create catalog database {:?}", db_path))?;
        let tx = conn.transaction()?;
        latest_schema().create(&tx)?;

        let mut summary = WriteSummary::default();
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT OR IGNORE INTO {SONGS_TABLE_NAME} ({SONG_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
            ))?;
            for song in songs {
                let changed = stmt.execute(params![
                    song.name,
                    song.artists,
                    song.title,
                    song.features.valence,
                    song.features.energy,
                    song.features.danceability,
                    song.features.tempo,
                    song.features.speechiness,
                    song.features.liveness,
                    song.popularity,
                ])?;
                if changed == 0 {
                    warn!("Skipping duplicate title \"{}\"", song.title);
                    summary.skipped_duplicate_titles += 1;
                } else {
                    summary.inserted += 1;
                }
            }
        }
        tx.commit()?;
        Ok(summary)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn get_read_conn(&self) -> Arc<Mutex<Connection>> {
        let index = self.read_index.fetch_add(1, Ordering::SeqCst) % self.read_pool.len();
        self.read_pool[index].clone()
    }

    /// Parse a Song from a row selected with [`SONG_COLUMNS`].
    fn parse_song_row(row: &rusqlite::Row) -> rusqlite::Result<Song> {
        Ok(Song {
            name: row.get(0)?,
            artists: row.get(1)?,
            title: row.get(2)?,
            features: AudioFeatures {
                valence: row.get(3)?,
                energy: row.get(4)?,
                danceability: row.get(5)?,
                tempo: row.get(6)?,
                speechiness: row.get(7)?,
                liveness: row.get(8)?,
            },
            popularity: row.get(9)?,
        })
    }
}

impl CatalogStore for SqliteCatalogStore {
    fn load_songs(&self) -> Result<Vec<Song>> {
        let conn = self.get_read_conn();
        let conn = conn
            .lock()
            .map_err(|_| anyhow!("Catalog connection poisoned"))?;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {SONG_COLUMNS} FROM {SONGS_TABLE_NAME} ORDER BY rowid ASC"
        ))?;
        let songs = stmt
            .query_map([], Self::parse_song_row)?
            .collect::<Result<Vec<Song>, _>>()?;
        Ok(songs)
    }

    fn songs_count(&self) -> Result<usize> {
        let conn = self.get_read_conn();
        let conn = conn
            .lock()
            .map_err(|_| anyhow!("Catalog connection poisoned"))?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {SONGS_TABLE_NAME}"),
            [],
            |r| r.get(0),
        )?;
        Ok(count as usize)
    }

    fn scan_by_popularity(&self, visitor: &mut dyn FnMut(Song) -> ScanControl) -> Result<()> {
        let conn = self.get_read_conn();
        let conn = conn
            .lock()
            .map_err(|_| anyhow!("Catalog connection poisoned"))?;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {SONG_COLUMNS} FROM {SONGS_TABLE_NAME} ORDER BY popularity DESC, rowid ASC"
        ))?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            if visitor(Self::parse_song_row(row)?) == ScanControl::Stop {
                break;
            }
        }
        Ok(())
    }
}
