//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own catalog and matrix.

use super::constants::*;
use super::fixtures::{create_test_artifacts, TestArtifacts};
use recommender_server::catalog_store::{CatalogStore, SqliteCatalogStore};
use recommender_server::config::MoodSource;
use recommender_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use recommender_server::similarity::SimilarityIndex;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Test server instance with isolated artifacts
///
/// When dropped, the server gracefully shuts down and temp files are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// The artifacts the server was started from
    pub artifacts: TestArtifacts,

    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a server whose mood queries go to the SQLite store.
    pub async fn spawn() -> Self {
        Self::spawn_with_mood_source(MoodSource::Store).await
    }

    /// Spawns a new test server on a random port
    ///
    /// # Panics
    ///
    /// Panics if the artifacts can't be built, the port can't be bound or the
    /// server doesn't become ready within the timeout.
    pub async fn spawn_with_mood_source(mood_source: MoodSource) -> Self {
        let artifacts = create_test_artifacts().expect("Failed to create test artifacts");

        let sqlite_store = Arc::new(
            SqliteCatalogStore::open(&artifacts.db_path, 2).expect("Failed to open catalog store"),
        );
        let index = Arc::new(
            SimilarityIndex::load(sqlite_store.as_ref(), &artifacts.matrix_path)
                .expect("Failed to load similarity index"),
        );
        let mood_store: Arc<dyn CatalogStore> = match mood_source {
            MoodSource::Store => sqlite_store,
            MoodSource::Memory => Arc::new(index.catalog().clone()),
        };

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            content_cache_age_sec: 60,
            ..Default::default()
        };
        let app = make_app(config, index, mood_store);

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            artifacts,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the home endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
