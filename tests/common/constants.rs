//! Shared constants for end-to-end tests
//!
//! When the test dataset changes, update only this file and `fixtures.rs`.

// ============================================================================
// Test Catalog Titles
// ============================================================================

/// Upbeat, popularity 80. Its first row wins over a later duplicate.
pub const SUNNY_DAY: &str = "Sunny Day by The Beams";

/// Sad and quiet, popularity 60. Scales to an all-zero feature vector.
pub const RAIN: &str = "Rain by Gloom";

/// The most popular song, popularity 90.
pub const DANCE_ALL_NIGHT: &str = "Dance All Night by The Beams";

/// Middle of the road, popularity 40.
pub const SLOW_BURN: &str = "Slow Burn by Embers";

/// Dropped at import: its first row is below the popularity threshold.
pub const OLD_TUNE: &str = "Old Tune by Embers";

/// Dropped at import: popularity exactly at the threshold.
pub const OBSCURE_DEMO: &str = "Obscure Demo by Nobody";

/// Songs in the catalog, in catalog order.
pub const CATALOG_TITLES: [&str; 4] = [SUNNY_DAY, RAIN, DANCE_ALL_NIGHT, SLOW_BURN];

// ============================================================================
// Timeouts
// ============================================================================

pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
