//! Offline Index Builder
//!
//! Builds the two artifacts the server loads: the SQLite catalog, imported from
//! the raw song dataset, and the similarity matrix computed from that catalog.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use recommender_server::catalog_store::import::{import_csv, ImportOptions, DEFAULT_MIN_POPULARITY};
use recommender_server::catalog_store::SqliteCatalogStore;
use recommender_server::similarity::build_matrix_file;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cli-build-index")]
#[command(about = "Build the catalog database and similarity matrix for the recommender server")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import a CSV song dataset into a new catalog database
    Import {
        /// Path to the CSV dataset
        #[arg(value_name = "CSV_PATH")]
        csv_path: PathBuf,

        /// Path to the output SQLite database file
        #[arg(value_name = "OUTPUT_DB")]
        output_db: PathBuf,

        /// Songs need a popularity strictly above this to be imported
        #[arg(long, default_value_t = DEFAULT_MIN_POPULARITY)]
        min_popularity: i64,

        /// Replace the output database if it already exists
        #[arg(long, default_value_t = false)]
        overwrite: bool,
    },

    /// Compute the similarity matrix of a catalog database
    Build {
        /// Path to the SQLite catalog database
        #[arg(value_name = "CATALOG_DB")]
        catalog_db: PathBuf,

        /// Path to the output similarity matrix file
        #[arg(value_name = "OUTPUT_MATRIX")]
        output_matrix: PathBuf,
    },
}

fn run_import(
    csv_path: PathBuf,
    output_db: PathBuf,
    min_popularity: i64,
    overwrite: bool,
) -> Result<()> {
    if output_db.exists() && !overwrite {
        bail!(
            "Output database already exists: {} (use --overwrite to replace it)",
            output_db.display()
        );
    }

    info!("Dataset: {}", csv_path.display());
    info!("Output database: {}", output_db.display());

    let stats = import_csv(&csv_path, &output_db, &ImportOptions { min_popularity })?;

    info!("");
    info!("Import complete!");
    info!("  Rows read:              {}", stats.rows_read);
    info!("  Malformed rows:         {}", stats.malformed);
    info!("  Duplicate songs:        {}", stats.duplicates);
    info!(
        "  Popularity <= {:<3}      {}",
        min_popularity, stats.below_threshold
    );
    info!("  Duplicate titles:       {}", stats.duplicate_titles);
    info!("  Songs imported:         {}", stats.imported);
    Ok(())
}

fn run_build(catalog_db: PathBuf, output_matrix: PathBuf) -> Result<()> {
    info!("Catalog database: {}", catalog_db.display());
    info!("Output matrix: {}", output_matrix.display());

    let store = SqliteCatalogStore::open(&catalog_db, 1)?;
    let matrix = build_matrix_file(&store, &output_matrix)?;

    info!("");
    info!("Build complete! {} songs indexed", matrix.dim());
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .init();

    let args = Args::parse();

    match args.command {
        Command::Import {
            csv_path,
            output_db,
            min_popularity,
            overwrite,
        } => run_import(csv_path, output_db, min_popularity, overwrite),
        Command::Build {
            catalog_db,
            output_matrix,
        } => run_build(catalog_db, output_matrix),
    }
}
