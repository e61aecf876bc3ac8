use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Optional TOML configuration, every present key overrides the CLI value.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Artifacts
    pub db_path: Option<String>,
    pub similarity_path: Option<String>,

    // Server
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,
    pub content_cache_age_sec: Option<usize>,

    // Recommendations
    pub recommendations: Option<RecommendationsConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct RecommendationsConfig {
    pub default_top_n: Option<usize>,
    pub max_top_n: Option<usize>,
    pub read_pool_size: Option<usize>,
    /// Where mood queries read from: "store" or "memory"
    pub mood_source: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
