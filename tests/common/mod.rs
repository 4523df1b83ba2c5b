//! Common test utilities
//!
//! This module provides shared test helpers and fixtures for all integration tests.

#![allow(dead_code)]

use chaser_shot::capture::{CaptureOutput, Tile};
use chaser_shot::cdp::mock_pixel;
use chaser_shot::config::Config;
use std::path::{Path, PathBuf};

/// Configuration with short delays, writing into `output_dir`
pub fn fast_config(endpoint: &str, output_dir: &Path) -> Config {
    let mut config = Config {
        cdp_endpoint: endpoint.to_string(),
        output_dir: output_dir.to_path_buf(),
        ..Config::default()
    };
    config.capture.settle_delay_ms = 1;
    config.capture.step_delay_ms = 1;
    config.capture.capture_timeout_ms = 2000;
    config
}

/// Fresh, not yet created, output directory under the system temp dir
pub fn temp_output_dir() -> PathBuf {
    std::env::temp_dir().join(format!("chaser-shot-it-{}", uuid::Uuid::new_v4()))
}

/// Remove a directory created by a test, ignoring missing ones
pub async fn cleanup_dir(dir: &Path) {
    let _ = tokio::fs::remove_dir_all(dir).await;
}

/// Assert that a tile shows the simulated page at its own position
pub fn assert_tile_matches_page(tile: &Tile) {
    for (x, y, pixel) in tile.pixels.enumerate_pixels() {
        let (page_x, page_y) = (tile.bounds.left + x, tile.bounds.top + y);
        assert_eq!(
            *pixel,
            mock_pixel(page_x, page_y),
            "tile {} differs from the page at ({}, {})",
            tile.index(),
            page_x,
            page_y
        );
    }
}

/// Assert that every tile of an output shows the simulated page
pub fn assert_output_matches_page(output: &CaptureOutput) {
    for tile in &output.tiles {
        assert_tile_matches_page(tile);
    }
}
