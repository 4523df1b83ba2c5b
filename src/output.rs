//! Capture output handling
//!
//! PNG encoding of finished tiles, writing them to disk, data URI export,
//! and a progress sink that reports through `tracing`.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::ImageFormat;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::capture::{CaptureOutput, ProgressSink, Tile};
use crate::{Error, Result};

/// Encode one tile as PNG
pub fn encode_png(tile: &Tile) -> Result<Vec<u8>> {
    let mut png = Vec::new();
    tile.pixels
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}

/// `data:image/png;base64,...` form of a tile
pub fn data_uri(tile: &Tile) -> Result<String> {
    Ok(format!("data:image/png;base64,{}", BASE64.encode(encode_png(tile)?)))
}

/// File name of tile `index` when the output has `count` tiles.
///
/// A single tile keeps the suggested name; several get `-<index>` before
/// the extension.
pub fn tile_filename(filename: &str, index: usize, count: usize) -> String {
    if count <= 1 {
        return filename.to_string();
    }

    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}-{}.{}", stem, index, ext),
        _ => format!("{}-{}", filename, index),
    }
}

/// Writes finished captures into a directory
#[derive(Debug, Clone)]
pub struct TileWriter {
    dir: PathBuf,
}

impl TileWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write every tile as PNG and return the paths in tile order
    pub async fn write(&self, output: &CaptureOutput) -> Result<Vec<PathBuf>> {
        if output.tiles.is_empty() {
            return Err(Error::internal("capture output has no tiles"));
        }

        tokio::fs::create_dir_all(&self.dir).await?;

        let count = output.tiles.len();
        let mut paths = Vec::with_capacity(count);
        for tile in &output.tiles {
            let path = self
                .dir
                .join(tile_filename(&output.metadata.filename, tile.index(), count));
            tokio::fs::write(&path, encode_png(tile)?).await?;
            info!(
                "Wrote tile {} ({}x{}) to {}",
                tile.index(),
                tile.pixels.width(),
                tile.pixels.height(),
                path.display()
            );
            paths.push(path);
        }

        Ok(paths)
    }
}

/// Progress sink that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingProgress;

#[async_trait]
impl ProgressSink for LoggingProgress {
    async fn on_progress(&self, fraction: f64) {
        info!("Capture progress: {:.0}%", fraction * 100.0);
    }

    async fn on_success(&self, output: &CaptureOutput) {
        info!(
            "Captured {}x{} in {} tile(s)",
            output.metadata.total_width,
            output.metadata.total_height,
            output.tiles.len()
        );
    }

    async fn on_failure(&self, error: &Error) {
        error!("Capture failed: {}", error);
    }
}
