//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per server endpoint.
//! When API routes or parameters change, update only this file.

use super::constants::*;
use reqwest::Response;
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// GET an arbitrary path with query parameters
    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .send()
            .await
            .expect("Request failed")
    }

    fn with_top_n(mut query: Vec<(&'static str, String)>, top_n: Option<usize>) -> Vec<(&'static str, String)> {
        if let Some(top_n) = top_n {
            query.push(("top_n", top_n.to_string()));
        }
        query
    }

    pub async fn home(&self) -> Response {
        self.get("/", &[]).await
    }

    pub async fn recommend(&self, song: &str, top_n: Option<usize>) -> Response {
        let query = Self::with_top_n(vec![("song", song.to_string())], top_n);
        self.get("/recommend", &query).await
    }

    pub async fn recommend_mood(&self, mood: &str, top_n: Option<usize>) -> Response {
        let query = Self::with_top_n(vec![("mood", mood.to_string())], top_n);
        self.get("/recommend_mood", &query).await
    }

    pub async fn moods(&self) -> Response {
        self.get("/moods", &[]).await
    }

    pub async fn trending(&self) -> Response {
        self.get("/trending", &[]).await
    }
}
