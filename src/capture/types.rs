//! Capture data model
//!
//! Geometry values are CSS pixels unless a field says otherwise. Once the
//! compositor has applied scale correction, values are captured-pixel units.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// What part of the page a session captures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaptureMode {
    /// Only the currently visible viewport
    Visible,
    /// The whole scrollable page
    #[default]
    WholePage,
}

impl CaptureMode {
    pub fn is_visible(self) -> bool {
        matches!(self, CaptureMode::Visible)
    }
}

/// Visible viewport size (`innerWidth` x `innerHeight`)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Scroll offset of the page
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrollPosition {
    pub x: f64,
    pub y: f64,
}

impl ScrollPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Full scrollable content size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageExtent {
    pub width: f64,
    pub height: f64,
}

impl PageExtent {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Build an extent from several DOM size probes.
    ///
    /// Size sources disagree between documents (quirks mode, body margins,
    /// absolutely positioned content), so the largest non-zero probe wins.
    /// Missing or non-finite probes are ignored.
    pub fn from_probes(widths: &[f64], heights: &[f64]) -> Self {
        fn largest(values: &[f64]) -> f64 {
            values
                .iter()
                .copied()
                .filter(|v| v.is_finite() && *v > 0.0)
                .fold(0.0, f64::max)
        }

        Self {
            width: largest(widths),
            height: largest(heights),
        }
    }

    /// Grow the extent so it is never smaller than the viewport
    pub fn at_least(self, viewport: Viewport) -> Self {
        Self {
            width: self.width.max(viewport.width),
            height: self.height.max(viewport.height),
        }
    }
}

impl From<Viewport> for PageExtent {
    fn from(viewport: Viewport) -> Self {
        Self::new(viewport.width, viewport.height)
    }
}

/// One planned scroll target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arrangement {
    pub x: f64,
    pub y: f64,
}

/// Pre-capture page state, restored when the session ends
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub scroll_x: f64,
    pub scroll_y: f64,
    /// `document.documentElement.style.overflow`
    #[serde(default)]
    pub overflow: String,
    /// `document.body.style.overflowY`, absent when the document has no body
    #[serde(default)]
    pub body_overflow_y: Option<String>,
}

/// A raster of the visible viewport together with where it belongs
#[derive(Debug, Clone)]
pub struct CaptureFrame {
    pub image: RgbaImage,
    /// Page-space origin (realized scroll position) in CSS pixels
    pub x: f64,
    pub y: f64,
    /// Viewport width at request time, in CSS pixels
    pub declared_viewport_width: f64,
    /// Logical page size the plan was made for
    pub extent: PageExtent,
    /// Plan progress in (0, 1]; 1 marks the final frame
    pub completion: f64,
}

impl CaptureFrame {
    pub fn is_final(&self) -> bool {
        self.completion >= 1.0
    }
}

/// Rectangle of one output tile in captured-pixel units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileBounds {
    pub index: usize,
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl TileBounds {
    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width()) * u64::from(self.height())
    }

    /// Open-interval overlap with the image rectangle `[x, x+w) x [y, y+h)`.
    /// Edge-touching rectangles do not overlap.
    pub fn intersects(&self, x: i64, y: i64, width: u32, height: u32) -> bool {
        let img_right = x + i64::from(width);
        let img_bottom = y + i64::from(height);

        x < i64::from(self.right)
            && img_right > i64::from(self.left)
            && y < i64::from(self.bottom)
            && img_bottom > i64::from(self.top)
    }
}

/// One bounded output raster
#[derive(Debug, Clone)]
pub struct Tile {
    pub bounds: TileBounds,
    pub pixels: RgbaImage,
}

impl Tile {
    /// Allocate a transparent buffer for the given bounds
    pub fn new(bounds: TileBounds) -> Self {
        Self {
            pixels: RgbaImage::new(bounds.width(), bounds.height()),
            bounds,
        }
    }

    pub fn index(&self) -> usize {
        self.bounds.index
    }
}

/// Describes the finished capture for the output consumer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputMetadata {
    /// Suggested file name, e.g. `chaser-shot-example-com-path-1700000000000.png`
    pub filename: String,
    /// Output size in captured-pixel units
    pub total_width: u32,
    pub total_height: u32,
}

/// Final tile set of a successful session
#[derive(Debug, Clone)]
pub struct CaptureOutput {
    pub tiles: Vec<Tile>,
    pub metadata: OutputMetadata,
}
