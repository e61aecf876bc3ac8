//! Common test infrastructure
//!
//! Every test gets a server running over artifacts freshly built from a small
//! CSV dataset, through the same import and build steps the CLI uses.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{TestServer, TestClient, SUNNY_DAY};
//! use reqwest::StatusCode;
//!
//! #[tokio::test]
//! async fn test_recommend() {
//!     let server = TestServer::spawn().await;
//!     let client = TestClient::new(server.base_url.clone());
//!
//!     let response = client.recommend(SUNNY_DAY, None).await;
//!     assert_eq!(response.status(), StatusCode::OK);
//! }
//! ```
#![allow(dead_code)]

mod client;
mod constants;
mod fixtures;
mod server;

// Public API - this is what tests import
pub use client::TestClient;
pub use constants::*;
pub use fixtures::{create_test_artifacts, TestArtifacts};
pub use server::TestServer;
