//! Test fixture creation for the catalog and similarity matrix

use anyhow::Result;
use recommender_server::catalog_store::import::{import_csv, ImportOptions, ImportStats};
use recommender_server::catalog_store::SqliteCatalogStore;
use recommender_server::similarity::build_matrix_file;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Raw dataset, shaped like the public song datasets: extra columns, a
/// repeated song, rows at and below the popularity threshold, one broken row.
pub const TEST_DATASET_CSV: &str = "\
id,name,artists,year,popularity,valence,energy,danceability,tempo,speechiness,liveness,acousticness
s1,Sunny Day,The Beams,2019,80,0.9,0.8,0.8,125.0,0.04,0.1,0.2
s2,Rain,Gloom,2001,60,0.1,0.2,0.3,80.0,0.03,0.05,0.9
s3,Old Tune,Embers,1975,10,0.6,0.3,0.4,100.0,0.04,0.1,0.7
s4,Dance All Night,The Beams,2021,90,0.8,0.9,0.9,128.0,0.05,0.2,0.01
s5,Broken,The Beams,2020,not-a-number,0.5,0.5,0.5,100.0,0.05,0.1,0.5
s6,Sunny Day,The Beams,2022,99,0.2,0.2,0.2,70.0,0.1,0.9,0.5
s7,Obscure Demo,Nobody,2010,30,0.5,0.5,0.5,110.0,0.05,0.1,0.5
s8,Slow Burn,Embers,2015,40,0.5,0.4,0.5,95.0,0.06,0.15,0.4
s9,Old Tune,Embers,1976,50,0.6,0.3,0.4,100.0,0.04,0.1,0.7
";

/// Built artifacts, deleted when dropped.
pub struct TestArtifacts {
    pub dir: TempDir,
    pub csv_path: PathBuf,
    pub db_path: PathBuf,
    pub matrix_path: PathBuf,
    pub import_stats: ImportStats,
}

/// Writes the test dataset, imports it and builds its similarity matrix.
pub fn create_test_artifacts() -> Result<TestArtifacts> {
    let dir = TempDir::new()?;
    let csv_path = dir.path().join("songs.csv");
    let db_path = dir.path().join("catalog.db");
    let matrix_path = dir.path().join("catalog.simmat");

    fs::write(&csv_path, TEST_DATASET_CSV)?;
    let import_stats = import_csv(&csv_path, &db_path, &ImportOptions::default())?;

    let store = SqliteCatalogStore::open(&db_path, 1)?;
    build_matrix_file(&store, &matrix_path)?;

    Ok(TestArtifacts {
        dir,
        csv_path,
        db_path,
        matrix_path,
        import_stats,
    })
}
