mod file_config;

pub use file_config::{FileConfig, RecommendationsConfig};

use crate::catalog_store::DEFAULT_READ_POOL_SIZE;
use crate::recommend::DEFAULT_TOP_N;
use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

pub const DEFAULT_MAX_TOP_N: usize = 100;

/// Which catalog mood queries scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum MoodSource {
    /// Stream from the SQLite store through the read pool.
    #[default]
    Store,
    /// Filter the in-memory catalog.
    Memory,
}

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub similarity_path: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub content_cache_age_sec: usize,
    pub default_top_n: usize,
    pub max_top_n: usize,
    pub read_pool_size: usize,
    pub mood_source: MoodSource,
}

impl Default for CliConfig {
    fn default() -> Self {
        CliConfig {
            db_path: None,
            similarity_path: None,
            port: 5001,
            metrics_port: 9091,
            logging_level: RequestsLoggingLevel::Path,
            content_cache_age_sec: 3600,
            default_top_n: DEFAULT_TOP_N,
            max_top_n: DEFAULT_MAX_TOP_N,
            read_pool_size: DEFAULT_READ_POOL_SIZE,
            mood_source: MoodSource::Store,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub similarity_path: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub content_cache_age_sec: usize,
    pub recommendations: RecommendationSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationSettings {
    pub default_top_n: usize,
    pub max_top_n: usize,
    pub read_pool_size: usize,
    pub mood_source: MoodSource,
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self {
            default_top_n: DEFAULT_TOP_N,
            max_top_n: DEFAULT_MAX_TOP_N,
            read_pool_size: DEFAULT_READ_POOL_SIZE,
            mood_source: MoodSource::Store,
        }
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_path must be specified via --db-path or in config file")
            })?;
        if !db_path.is_file() {
            bail!("Catalog database does not exist: {:?}", db_path);
        }

        // The matrix sits next to the catalog unless told otherwise.
        let similarity_path = file
            .similarity_path
            .map(PathBuf::from)
            .or_else(|| cli.similarity_path.clone())
            .unwrap_or_else(|| db_path.with_extension("simmat"));
        if !similarity_path.is_file() {
            bail!("Similarity matrix does not exist: {:?}", similarity_path);
        }

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let content_cache_age_sec = file
            .content_cache_age_sec
            .unwrap_or(cli.content_cache_age_sec);

        let rec_file = file.recommendations.unwrap_or_default();
        let mood_source = match rec_file.mood_source {
            Some(s) => match MoodSource::from_str(&s, true) {
                Ok(source) => source,
                Err(_) => bail!("Unknown mood_source {:?}, expected \"store\" or \"memory\"", s),
            },
            None => cli.mood_source,
        };
        let recommendations = RecommendationSettings {
            default_top_n: rec_file.default_top_n.unwrap_or(cli.default_top_n),
            max_top_n: rec_file.max_top_n.unwrap_or(cli.max_top_n),
            read_pool_size: rec_file.read_pool_size.unwrap_or(cli.read_pool_size),
            mood_source,
        };

        if recommendations.max_top_n == 0 {
            bail!("max_top_n must be at least 1");
        }
        if recommendations.default_top_n == 0
            || recommendations.default_top_n > recommendations.max_top_n
        {
            bail!(
                "default_top_n must be between 1 and max_top_n ({}), got {}",
                recommendations.max_top_n,
                recommendations.default_top_n
            );
        }
        if recommendations.read_pool_size == 0 {
            bail!("read_pool_size must be at least 1");
        }

        Ok(Self {
            db_path,
            similarity_path,
            port,
            metrics_port,
            logging_level,
            content_cache_age_sec,
            recommendations,
        })
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    /// A directory holding empty catalog and matrix files.
    fn make_artifacts() -> (TempDir, PathBuf, PathBuf) {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("catalog.db");
        let similarity_path = dir.path().join("catalog.simmat");
        std::fs::write(&db_path, b"").unwrap();
        std::fs::write(&similarity_path, b"").unwrap();
        (dir, db_path, similarity_path)
    }

    fn cli_with(db_path: &Path) -> CliConfig {
        CliConfig {
            db_path: Some(db_path.to_path_buf()),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_logging_level() {
        assert!(matches!(
            parse_logging_level("none"),
            Some(RequestsLoggingLevel::None)
        ));
        assert!(matches!(
            parse_logging_level("PATH"),
            Some(RequestsLoggingLevel::Path)
        ));
        assert!(matches!(
            parse_logging_level("body"),
            Some(RequestsLoggingLevel::Body)
        ));
        assert!(parse_logging_level("invalid").is_none());
    }

    #[test]
    fn test_resolve_cli_only() {
        let (_dir, db_path, similarity_path) = make_artifacts();
        let cli = CliConfig {
            db_path: Some(db_path.clone()),
            similarity_path: Some(similarity_path.clone()),
            port: 3001,
            metrics_port: 9191,
            logging_level: RequestsLoggingLevel::Headers,
            content_cache_age_sec: 7200,
            default_top_n: 10,
            max_top_n: 50,
            read_pool_size: 2,
            mood_source: MoodSource::Memory,
        };

        let config = AppConfig::resolve(&cli, None).unwrap();

        assert_eq!(config.db_path, db_path);
        assert_eq!(config.similarity_path, similarity_path);
        assert_eq!(config.port, 3001);
        assert_eq!(config.metrics_port, 9191);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Headers);
        assert_eq!(config.content_cache_age_sec, 7200);
        assert_eq!(
            config.recommendations,
            RecommendationSettings {
                default_top_n: 10,
                max_top_n: 50,
                read_pool_size: 2,
                mood_source: MoodSource::Memory,
            }
        );
    }

    #[test]
    fn test_resolve_defaults() {
        let (_dir, db_path, similarity_path) = make_artifacts();
        let config = AppConfig::resolve(&cli_with(&db_path), None).unwrap();
        assert_eq!(config.port, 5001);
        assert_eq!(config.similarity_path, similarity_path);
        assert_eq!(config.recommendations, RecommendationSettings::default());
    }

    #[test]
    fn test_resolve_toml_overrides_cli() {
        let (_dir, db_path, _) = make_artifacts();
        let cli = CliConfig {
            db_path: Some(PathBuf::from("/should/be/overridden")),
            port: 3001,
            ..Default::default()
        };

        let file_config = FileConfig {
            db_path: Some(db_path.to_string_lossy().to_string()),
            port: Some(4000),
            logging_level: Some("body".to_string()),
            recommendations: Some(RecommendationsConfig {
                max_top_n: Some(20),
                mood_source: Some("memory".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, Some(file_config)).unwrap();

        // TOML values should override CLI
        assert_eq!(config.db_path, db_path);
        assert_eq!(config.port, 4000);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Body);
        assert_eq!(config.recommendations.max_top_n, 20);
        assert_eq!(config.recommendations.mood_source, MoodSource::Memory);
        // CLI value used when TOML doesn't specify
        assert_eq!(config.metrics_port, 9091);
        assert_eq!(config.recommendations.default_top_n, DEFAULT_TOP_N);
    }

    #[test]
    fn test_resolve_missing_db_path_error() {
        let result = AppConfig::resolve(&CliConfig::default(), None);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("db_path must be specified"));
    }

    #[test]
    fn test_resolve_nonexistent_artifacts_error() {
        let result = AppConfig::resolve(&cli_with(Path::new("/nonexistent/catalog.db")), None);
        assert!(result.unwrap_err().to_string().contains("does not exist"));

        let (_dir, db_path, _) = make_artifacts();
        let cli = CliConfig {
            similarity_path: Some(PathBuf::from("/nonexistent/catalog.simmat")),
            ..cli_with(&db_path)
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Similarity matrix does not exist"));
    }

    #[test]
    fn test_resolve_rejects_bad_top_n_bounds() {
        let (_dir, db_path, _) = make_artifacts();
        for (default_top_n, max_top_n) in [(0, 100), (101, 100), (1, 0)] {
            let cli = CliConfig {
                default_top_n,
                max_top_n,
                ..cli_with(&db_path)
            };
            assert!(
                AppConfig::resolve(&cli, None).is_err(),
                "default_top_n={} max_top_n={} should be rejected",
                default_top_n,
                max_top_n
            );
        }
    }

    #[test]
    fn test_resolve_rejects_empty_read_pool() {
        let (_dir, db_path, _) = make_artifacts();
        let file_config = FileConfig {
            recommendations: Some(RecommendationsConfig {
                read_pool_size: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli_with(&db_path), Some(file_config));
        assert!(result.unwrap_err().to_string().contains("read_pool_size"));
    }

    #[test]
    fn test_resolve_rejects_unknown_mood_source() {
        let (_dir, db_path, _) = make_artifacts();
        let file_config = FileConfig {
            recommendations: Some(RecommendationsConfig {
                mood_source: Some("cloud".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&cli_with(&db_path), Some(file_config)).is_err());
    }
}
