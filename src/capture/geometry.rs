//! Scroll position planning
//!
//! Turns a viewport and a page extent into the stack of scroll offsets a
//! whole-page capture has to visit.

use super::types::{Arrangement, CaptureMode, PageExtent, ScrollPosition, Viewport};

/// Default overlap between vertically adjacent captures, in CSS pixels
pub const DEFAULT_SCROLL_PAD: f64 = 200.0;

/// Ordered scroll targets for one session.
///
/// Arrangements are consumed last-generated-first: rows are generated from
/// the bottom of the page upwards, so the session scrolls top-down.
#[derive(Debug, Clone)]
pub struct CapturePlan {
    stack: Vec<Arrangement>,
    total: usize,
    extent: PageExtent,
}

impl CapturePlan {
    fn new(stack: Vec<Arrangement>, extent: PageExtent) -> Self {
        Self {
            total: stack.len(),
            stack,
            extent,
        }
    }

    /// Pop the next scroll target
    pub fn next_arrangement(&mut self) -> Option<Arrangement> {
        self.stack.pop()
    }

    /// Fraction of arrangements consumed so far
    pub fn completion(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.total - self.stack.len()) as f64 / self.total as f64
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn remaining(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Effective page extent (viewport-sized in visible mode)
    pub fn extent(&self) -> PageExtent {
        self.extent
    }

    /// Remaining arrangements in generation order
    pub fn pending(&self) -> &[Arrangement] {
        &self.stack
    }
}

/// Plan the scroll positions for a capture.
///
/// In visible mode the plan is the current scroll position alone and the
/// extent collapses to the viewport. In whole-page mode rows are spaced by
/// `viewport.height - overlap` (the raw viewport height when the viewport is
/// not taller than the overlap) and start bottom-aligned at
/// `extent.height - viewport.height`; generation continues while the row
/// origin is above `-row_spacing`, so the last row always reaches the top.
pub fn plan(
    viewport: Viewport,
    extent: PageExtent,
    scroll: ScrollPosition,
    mode: CaptureMode,
    overlap: f64,
) -> CapturePlan {
    if mode.is_visible() {
        return CapturePlan::new(
            vec![Arrangement { x: scroll.x, y: scroll.y }],
            PageExtent::from(viewport),
        );
    }

    let mut extent = extent.at_least(viewport);

    // zoom can leave the document a fraction of a pixel wider than the viewport
    if extent.width <= viewport.width + 1.0 {
        extent.width = viewport.width;
    }

    let y_delta = if viewport.height > overlap {
        viewport.height - overlap
    } else {
        viewport.height
    };
    let x_delta = viewport.width;

    if !(y_delta > 0.0 && x_delta > 0.0) {
        return CapturePlan::new(Vec::new(), extent);
    }

    let mut stack = Vec::new();
    let mut y = extent.height - viewport.height;
    while y > -y_delta {
        let mut x = 0.0;
        while x < extent.width {
            stack.push(Arrangement { x, y });
            x += x_delta;
        }
        y -= y_delta;
    }

    CapturePlan::new(stack, extent)
}
