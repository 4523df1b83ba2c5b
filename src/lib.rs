//! chaser-shot: full-page screenshot capture over the Chrome DevTools Protocol
//!
//! The capture engine scrolls a page through a planned sequence of
//! positions, captures the visible viewport at each one and stitches the
//! frames into one or more size-bounded tiles.

pub mod error;
pub mod config;

pub mod cdp;
pub mod capture;
pub mod page;
pub mod output;
pub mod runner;

// Re-exports
pub use error::{Error, Result};

/// chaser-shot library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
