use super::RequestsLoggingLevel;
use crate::config::{AppConfig, DEFAULT_MAX_TOP_N};
use crate::recommend::DEFAULT_TOP_N;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    pub metrics_port: u16,
    pub content_cache_age_sec: usize,
    /// Result list length when the request has no `top_n`.
    pub default_top_n: usize,
    /// Largest `top_n` a request may ask for.
    pub max_top_n: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 5001,
            metrics_port: 9091,
            content_cache_age_sec: 3600,
            default_top_n: DEFAULT_TOP_N,
            max_top_n: DEFAULT_MAX_TOP_N,
        }
    }
}

impl From<&AppConfig> for ServerConfig {
    fn from(config: &AppConfig) -> Self {
        ServerConfig {
            requests_logging_level: config.logging_level.clone(),
            port: config.port,
            metrics_port: config.metrics_port,
            content_cache_age_sec: config.content_cache_age_sec,
            default_top_n: config.recommendations.default_top_n,
            max_top_n: config.recommendations.max_top_n,
        }
    }
}
