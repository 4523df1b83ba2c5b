//! Capture collaborator traits
//!
//! The capture engine only talks to the page through these seams. The CDP
//! implementations live in `crate::page`.

use async_trait::async_trait;
use image::RgbaImage;

use super::types::{CaptureOutput, PageExtent, ScrollPosition, SessionState, Viewport};

/// Scroll controller trait
///
/// Moves the page and reports its geometry.
#[async_trait]
pub trait ScrollController: Send + Sync {
    /// Scroll the page to the given page-space offset
    async fn scroll_to(&self, x: f64, y: f64) -> Result<(), crate::Error>;

    /// Realized scroll offset (the browser clamps at page edges)
    async fn current_scroll_position(&self) -> Result<ScrollPosition, crate::Error>;

    /// Visible viewport size
    async fn viewport_size(&self) -> Result<Viewport, crate::Error>;

    /// Full scrollable content size
    async fn page_extent(&self) -> Result<PageExtent, crate::Error>;

    /// Record scroll position and overflow styling before the session mutates them
    async fn snapshot_state(&self) -> Result<SessionState, crate::Error>;

    /// Hide scrollbars and let the body overflow for the duration of the session
    async fn disable_scrollbars(&self) -> Result<(), crate::Error>;

    /// Put back a snapshot taken by [`ScrollController::snapshot_state`]
    async fn restore_state(&self, state: &SessionState) -> Result<(), crate::Error>;
}

/// Capture provider trait
///
/// Produces a raster of the currently visible viewport. The engine never
/// has more than one request outstanding.
#[async_trait]
pub trait CaptureProvider: Send + Sync {
    /// Capture the viewport currently scrolled to `origin`
    async fn capture(
        &self,
        origin: ScrollPosition,
        declared_viewport_width: f64,
    ) -> Result<RgbaImage, crate::Error>;
}

/// Progress sink trait
///
/// Receives progress, the final output, or the failure reason. Exactly one
/// of `on_success` / `on_failure` is called per session.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    /// Plan progress in (0, 1]
    async fn on_progress(&self, fraction: f64);

    /// The session finished; tiles are complete
    async fn on_success(&self, output: &CaptureOutput);

    /// The session failed; no output is produced
    async fn on_failure(&self, error: &crate::Error);
}
