//! Frame compositing
//!
//! Places each viewport capture onto the output tiles. Captured rasters can
//! be larger than their CSS size (zoom, device pixel ratio, device
//! emulation), so every frame is scale-corrected before it is drawn.

use image::imageops;
use tracing::debug;

use super::tiles::{partition, TileLimits};
use super::types::{CaptureFrame, CaptureOutput, OutputMetadata, PageExtent, Tile};
use crate::{Error, Result};

/// Frame geometry after scale correction, in captured-pixel units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrectedPlacement {
    pub x: f64,
    pub y: f64,
    pub extent: PageExtent,
    pub scale: f64,
}

/// Map a frame's CSS geometry onto its actual raster size.
///
/// When the raster width differs from the declared viewport width, origin
/// and extent are multiplied by `actual / declared`. A zero declared width
/// leaves the geometry untouched.
pub fn correct(frame: &CaptureFrame) -> CorrectedPlacement {
    let actual = f64::from(frame.image.width());
    let declared = frame.declared_viewport_width;

    let scale = if declared > 0.0 && actual != declared {
        actual / declared
    } else {
        1.0
    };

    CorrectedPlacement {
        x: frame.x * scale,
        y: frame.y * scale,
        extent: PageExtent::new(frame.extent.width * scale, frame.extent.height * scale),
        scale,
    }
}

/// Session-scoped tile accumulator
#[derive(Debug)]
pub struct Compositor {
    limits: TileLimits,
    filename: String,
    tiles: Option<Vec<Tile>>,
    output_size: (u32, u32),
    frames: usize,
}

impl Compositor {
    /// Create a compositor for one session; tiles are allocated on the first frame
    pub fn new(limits: TileLimits, filename: impl Into<String>) -> Self {
        Self {
            limits,
            filename: filename.into(),
            tiles: None,
            output_size: (0, 0),
            frames: 0,
        }
    }

    /// Current tiles, if the first frame has arrived
    pub fn tiles(&self) -> Option<&[Tile]> {
        self.tiles.as_deref()
    }

    /// Draw one frame. Returns the finished output when the frame is final.
    pub fn composite(&mut self, frame: CaptureFrame) -> Result<Option<CaptureOutput>> {
        let (img_width, img_height) = frame.image.dimensions();
        if img_width == 0 || img_height == 0 {
            return Err(Error::capture_provider("provider returned an empty image"));
        }

        let placement = correct(&frame);
        if placement.scale != 1.0 {
            debug!(
                "Frame {} raster is {}px wide for a {}px viewport, scale {:.3}",
                self.frames, img_width, frame.declared_viewport_width, placement.scale
            );
        }

        let limits = self.limits;
        let output_size = &mut self.output_size;
        let tiles = self.tiles.get_or_insert_with(|| {
            let width = to_pixels(placement.extent.width);
            let height = to_pixels(placement.extent.height);
            *output_size = (width, height);
            let tiles: Vec<Tile> = partition(width, height, &limits)
                .into_iter()
                .map(Tile::new)
                .collect();
            debug!("Allocated {} tile(s) for a {}x{} output", tiles.len(), width, height);
            tiles
        });

        let x = placement.x.round() as i64;
        let y = placement.y.round() as i64;
        for tile in tiles
            .iter_mut()
            .filter(|tile| tile.bounds.intersects(x, y, img_width, img_height))
        {
            // the tile buffer clips whatever falls outside it
            imageops::replace(
                &mut tile.pixels,
                &frame.image,
                x - i64::from(tile.bounds.left),
                y - i64::from(tile.bounds.top),
            );
        }
        self.frames += 1;

        if !frame.is_final() {
            return Ok(None);
        }

        let tiles = self.tiles.take().unwrap_or_default();
        let (total_width, total_height) = self.output_size;
        Ok(Some(CaptureOutput {
            tiles,
            metadata: OutputMetadata {
                filename: self.filename.clone(),
                total_width,
                total_height,
            },
        }))
    }
}

fn to_pixels(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.ceil().min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    fn frame(width: u32, height: u32, color: Rgba<u8>, x: f64, y: f64, completion: f64) -> CaptureFrame {
        CaptureFrame {
            image: RgbaImage::from_pixel(width, height, color),
            x,
            y,
            declared_viewport_width: 100.0,
            extent: PageExtent::new(100.0, 250.0),
            completion,
        }
    }

    #[test]
    fn test_correct_without_drift_is_identity() {
        let placement = correct(&frame(100, 60, RED, 0.0, 190.0, 0.5));
        assert_eq!(placement.scale, 1.0);
        assert_eq!(placement.y, 190.0);
        assert_eq!(placement.extent, PageExtent::new(100.0, 250.0));
    }

    #[test]
    fn test_correct_scales_every_frame_independently() {
        // same declared width, zoom changed between the two frames
        let before = correct(&frame(100, 60, RED, 10.0, 40.0, 0.5));
        let after = correct(&frame(150, 90, RED, 10.0, 40.0, 1.0));

        assert_eq!((before.x, before.y), (10.0, 40.0));
        assert_eq!((after.x, after.y), (15.0, 60.0));
        assert_eq!(after.extent, PageExtent::new(150.0, 375.0));
        assert_eq!(after.scale, 1.5);
    }

    #[test]
    fn test_frames_land_at_their_origin() {
        let mut compositor = Compositor::new(TileLimits::default(), "out.png");

        assert!(compositor.composite(frame(100, 150, RED, 0.0, 100.0, 0.5)).unwrap().is_none());
        let output = compositor
            .composite(frame(100, 150, BLUE, 0.0, 0.0, 1.0))
            .unwrap()
            .expect("final frame completes the session");

        assert_eq!(output.tiles.len(), 1);
        assert_eq!(output.metadata.total_width, 100);
        assert_eq!(output.metadata.total_height, 250);
        assert_eq!(output.metadata.filename, "out.png");

        let pixels = &output.tiles[0].pixels;
        assert_eq!(pixels.dimensions(), (100, 250));
        // later frame wins where they overlap
        assert_eq!(*pixels.get_pixel(50, 120), BLUE);
        assert_eq!(*pixels.get_pixel(50, 149), BLUE);
        assert_eq!(*pixels.get_pixel(50, 150), RED);
        assert_eq!(*pixels.get_pixel(99, 249), RED);
    }

    #[test]
    fn test_frames_split_across_tiles() {
        let limits = TileLimits {
            max_primary: 100,
            max_secondary: 100,
            max_area: 10_000,
        };
        let mut compositor = Compositor::new(limits, "out.png");

        // 100x250 output -> tiles at y = 0, 100, 200
        compositor.composite(frame(100, 150, RED, 0.0, 100.0, 0.5)).unwrap();
        let tiles = compositor.tiles().unwrap();
        assert_eq!(tiles.len(), 3);
        assert_eq!(*tiles[0].pixels.get_pixel(0, 99), Rgba([0, 0, 0, 0]));
        assert_eq!(*tiles[1].pixels.get_pixel(0, 0), RED);
        assert_eq!(*tiles[2].pixels.get_pixel(99, 49), RED);

        let output = compositor
            .composite(frame(100, 150, BLUE, 0.0, 0.0, 1.0))
            .unwrap()
            .unwrap();
        assert_eq!(*output.tiles[0].pixels.get_pixel(0, 0), BLUE);
        assert_eq!(*output.tiles[1].pixels.get_pixel(0, 49), BLUE);
        assert_eq!(*output.tiles[1].pixels.get_pixel(0, 50), RED);
    }

    #[test]
    fn test_edge_touching_tile_is_untouched() {
        let limits = TileLimits {
            max_primary: 100,
            max_secondary: 100,
            max_area: 10_000,
        };
        let mut compositor = Compositor::new(limits, "out.png");

        // frame ends exactly where the third tile begins
        compositor.composite(frame(100, 100, RED, 0.0, 100.0, 0.5)).unwrap();
        let tiles = compositor.tiles().unwrap();
        assert_eq!(*tiles[1].pixels.get_pixel(0, 99), RED);
        assert!(tiles[2].pixels.pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn test_tiles_created_from_first_corrected_extent() {
        let mut compositor = Compositor::new(TileLimits::default(), "out.png");
        let mut hidpi = frame(200, 120, RED, 0.0, 0.0, 1.0);
        hidpi.extent = PageExtent::new(100.0, 60.0);

        let output = compositor.composite(hidpi).unwrap().unwrap();
        assert_eq!((output.metadata.total_width, output.metadata.total_height), (200, 120));
        assert!(output.tiles[0].pixels.pixels().all(|p| *p == RED));
    }

    #[test]
    fn test_empty_image_is_rejected() {
        let mut compositor = Compositor::new(TileLimits::default(), "out.png");
        let err = compositor
            .composite(frame(0, 0, RED, 0.0, 0.0, 1.0))
            .unwrap_err();
        assert!(matches!(err, Error::CaptureProvider(_)));
    }
}
