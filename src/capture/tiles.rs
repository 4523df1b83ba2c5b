//! Output tile partitioning
//!
//! Browsers and image codecs cap the size of a single raster, so a very long
//! page is split into a row-major grid of bounded tiles.

use serde::{Deserialize, Serialize};

use super::types::TileBounds;

/// Size limits for a single output tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileLimits {
    /// Longest allowed side
    pub max_primary: u32,
    /// Allowed length of the shorter side once a split is needed
    pub max_secondary: u32,
    /// Largest allowed tile area
    pub max_area: u64,
}

impl Default for TileLimits {
    fn default() -> Self {
        let max_primary = 50_000 * 2;
        let max_secondary = 20_000 * 2;
        Self {
            max_primary,
            max_secondary,
            max_area: u64::from(max_primary) * u64::from(max_secondary),
        }
    }
}

impl TileLimits {
    fn fits(&self, width: u32, height: u32) -> bool {
        width <= self.max_primary
            && height <= self.max_primary
            && u64::from(width) * u64::from(height) <= self.max_area
    }

    /// Secondary cap, shrunk when primary x secondary would exceed the area limit
    fn effective_secondary(&self) -> u32 {
        let by_area = self.max_area / u64::from(self.max_primary.max(1));
        let by_area = u32::try_from(by_area).unwrap_or(u32::MAX);
        self.max_secondary.min(by_area).max(1)
    }
}

/// Split a `width` x `height` rectangle into tiles within `limits`.
///
/// Tiles are returned row-major (top row first, left to right) and cover the
/// rectangle exactly. The last column and row take the remainder.
pub fn partition(width: u32, height: u32, limits: &TileLimits) -> Vec<TileBounds> {
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let (max_width, max_height) = if limits.fits(width, height) {
        (width, height)
    } else {
        let primary = limits.max_primary.max(1);
        let secondary = limits.effective_secondary();
        if width > height {
            (primary, secondary)
        } else {
            (secondary, primary)
        }
    };

    let cols = width.div_ceil(max_width);
    let rows = height.div_ceil(max_height);

    let mut tiles = Vec::with_capacity((cols as usize) * (rows as usize));
    for row in 0..rows {
        for col in 0..cols {
            let tile_width = if col == cols - 1 {
                remainder_or_full(width, max_width)
            } else {
                max_width
            };
            let tile_height = if row == rows - 1 {
                remainder_or_full(height, max_height)
            } else {
                max_height
            };

            let left = col * max_width;
            let top = row * max_height;
            tiles.push(TileBounds {
                index: tiles.len(),
                left,
                top,
                right: left + tile_width,
                bottom: top + tile_height,
            });
        }
    }

    tiles
}

fn remainder_or_full(total: u32, max: u32) -> u32 {
    match total % max {
        0 => max,
        rest => rest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_limits() -> TileLimits {
        TileLimits {
            max_primary: 1000,
            max_secondary: 400,
            max_area: 400_000,
        }
    }

    fn assert_exact_cover(tiles: &[TileBounds], width: u32, height: u32, limits: &TileLimits) {
        let mut covered = vec![0u8; (width * height) as usize];
        for tile in tiles {
            assert!(tile.width() <= limits.max_primary);
            assert!(tile.height() <= limits.max_primary);
            assert!(tile.area() <= limits.max_area);
            for y in tile.top..tile.bottom {
                for x in tile.left..tile.right {
                    covered[(y * width + x) as usize] += 1;
                }
            }
        }
        assert!(covered.iter().all(|&c| c == 1), "gap or overlap in {width}x{height}");
    }

    #[test]
    fn test_within_limits_is_single_tile() {
        let tiles = partition(800, 1700, &TileLimits::default());
        assert_eq!(
            tiles,
            vec![TileBounds { index: 0, left: 0, top: 0, right: 800, bottom: 1700 }]
        );
    }

    #[test]
    fn test_tall_content_splits_rows() {
        let limits = small_limits();
        let tiles = partition(300, 2500, &limits);

        // height is primary: 1000-pixel rows, 400-pixel columns
        assert_eq!(tiles.len(), 3);
        assert_eq!(tiles[0], TileBounds { index: 0, left: 0, top: 0, right: 300, bottom: 1000 });
        assert_eq!(tiles[2], TileBounds { index: 2, left: 0, top: 2000, right: 300, bottom: 2500 });
        assert_exact_cover(&tiles, 300, 2500, &limits);
    }

    #[test]
    fn test_wide_content_splits_columns() {
        let limits = small_limits();
        let tiles = partition(2100, 500, &limits);

        // width is primary: 1000-pixel columns, 400-pixel rows
        let lefts: Vec<u32> = tiles.iter().map(|t| t.left).collect();
        assert_eq!(lefts, vec![0, 1000, 2000, 0, 1000, 2000]);
        assert_eq!(tiles[5].width(), 100);
        assert_eq!(tiles[5].height(), 100);
        assert_exact_cover(&tiles, 2100, 500, &limits);
    }

    #[test]
    fn test_area_limit_alone_forces_split() {
        let limits = small_limits();
        // both sides under the primary cap, area over the limit
        let tiles = partition(900, 800, &limits);
        assert!(tiles.len() > 1);
        assert_exact_cover(&tiles, 900, 800, &limits);
    }

    #[test]
    fn test_exact_multiple_has_no_sliver() {
        let limits = small_limits();
        let tiles = partition(400, 3000, &limits);
        assert_eq!(tiles.len(), 3);
        assert!(tiles.iter().all(|t| t.height() == 1000));
    }

    #[test]
    fn test_row_major_indices() {
        let limits = small_limits();
        let tiles = partition(900, 2200, &limits);
        for (i, tile) in tiles.iter().enumerate() {
            assert_eq!(tile.index, i);
        }
        assert!(tiles.windows(2).all(|w| (w[0].top, w[0].left) < (w[1].top, w[1].left)));
        assert_exact_cover(&tiles, 900, 2200, &limits);
    }

    #[test]
    fn test_tight_area_shrinks_secondary() {
        let limits = TileLimits {
            max_primary: 1000,
            max_secondary: 800,
            max_area: 300_000,
        };
        let tiles = partition(700, 2500, &limits);
        assert_exact_cover(&tiles, 700, 2500, &limits);
    }

    #[test]
    fn test_empty_rectangle_has_no_tiles() {
        assert!(partition(0, 600, &TileLimits::default()).is_empty());
        assert!(partition(800, 0, &TileLimits::default()).is_empty());
    }
}
