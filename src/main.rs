use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use recommender_server::catalog_store::{CatalogStore, SqliteCatalogStore};
use recommender_server::config::{AppConfig, CliConfig, FileConfig, MoodSource};
use recommender_server::server::{metrics, run_server, RequestsLoggingLevel, ServerConfig};
use recommender_server::similarity::SimilarityIndex;

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite catalog database file.
    #[clap(long, value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    /// Path to the similarity matrix file. Defaults to the catalog path with a `.simmat` extension.
    #[clap(long, value_parser = parse_path)]
    pub similarity_path: Option<PathBuf>,

    /// Path to a TOML config file, its values override the command line.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 5001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// The maximum age of content in the cache in seconds.
    #[clap(long, default_value_t = 3600)]
    pub content_cache_age_sec: usize,

    /// Number of recommendations returned when the request doesn't say.
    #[clap(long, default_value_t = 5)]
    pub default_top_n: usize,

    /// Largest number of recommendations a request may ask for.
    #[clap(long, default_value_t = 100)]
    pub max_top_n: usize,

    /// Number of read-only connections to the catalog database.
    #[clap(long, default_value_t = 4)]
    pub read_pool_size: usize,

    /// Catalog scanned by mood recommendations.
    #[clap(long, value_enum, default_value_t = MoodSource::Store)]
    pub mood_source: MoodSource,
}

impl From<&CliArgs> for CliConfig {
    fn from(args: &CliArgs) -> Self {
        CliConfig {
            db_path: args.db_path.clone(),
            similarity_path: args.similarity_path.clone(),
            port: args.port,
            metrics_port: args.metrics_port,
            logging_level: args.logging_level.clone(),
            content_cache_age_sec: args.content_cache_age_sec,
            default_top_n: args.default_top_n,
            max_top_n: args.max_top_n,
            read_pool_size: args.read_pool_size,
            mood_source: args.mood_source,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config file {:?}...", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&CliConfig::from(&cli_args), file_config)?;

    info!("Opening SQLite catalog database at {:?}...", config.db_path);
    let sqlite_store = Arc::new(SqliteCatalogStore::open(
        &config.db_path,
        config.recommendations.read_pool_size,
    )?);

    info!(
        "Loading similarity matrix from {:?}...",
        config.similarity_path
    );
    let index = Arc::new(
        SimilarityIndex::load(sqlite_store.as_ref(), &config.similarity_path)
            .context("Failed to load the similarity index")?,
    );
    info!(
        "Loaded {} songs, similarity matrix is {}x{}",
        index.len(),
        index.matrix().dim(),
        index.matrix().dim()
    );

    // Initialize metrics system
    info!("Initializing metrics...");
    metrics::init_metrics();
    metrics::init_catalog_metrics(index.len());

    let mood_store: Arc<dyn CatalogStore> = match config.recommendations.mood_source {
        MoodSource::Store => sqlite_store,
        MoodSource::Memory => Arc::new(index.catalog().clone()),
    };
    info!(
        "Mood recommendations read from {:?}",
        config.recommendations.mood_source
    );

    run_server(ServerConfig::from(&config), index, mood_store).await
}
