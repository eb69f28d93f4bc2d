//! Shared test fixtures for the resale-finder integration tests.

#![allow(dead_code)]

use resale_finder::{ResaleFinder, Settings};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SEED: u64 = 42;

/// An in-memory finder with no credentials: demo listings and filename
/// keywords, seeded so every run sees the same prices.
pub fn demo_finder() -> ResaleFinder {
    ResaleFinder::builder()
        .demo_seed(SEED)
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

/// Settings pointing every remote endpoint at a mock server.
pub fn mock_settings(base: &str) -> Settings {
    Settings {
        ebay_app_id: "app".into(),
        ebay_cert_id: "cert".into(),
        vision_api_key: "vision-key".into(),
        oauth_token_url: format!("{}/identity/v1/oauth2/token", base),
        browse_api_url: format!("{}/buy/browse/v1", base),
        vision_api_url: format!("{}/v1/images:annotate", base),
        database_path: None,
    }
}

/// Write a small fake image file into `dir`.
pub fn write_image(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, b"\x89PNG\r\n\x1a\nnot really a png").unwrap();
    path
}
