//! Capture session state machine
//!
//! Drives scroll -> settle -> capture -> composite -> progress for every
//! planned position, then restores the page. Every exit path (success,
//! provider failure, safety timeout, controller error) goes through the same
//! cleanup step.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::compositor::Compositor;
use super::filename::{build_filename, DEFAULT_PREFIX};
use super::geometry::{self, DEFAULT_SCROLL_PAD};
use super::target::validate_target;
use super::tiles::TileLimits;
use super::traits::{CaptureProvider, ProgressSink, ScrollController};
use super::types::{
    CaptureFrame, CaptureMode, CaptureOutput, PageExtent, ScrollPosition, SessionState,
};
use crate::{Error, Result};

/// Capture session tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureOptions {
    /// Overlap between vertically adjacent captures, CSS pixels
    pub scroll_pad: f64,
    /// Pause after scrolling so lazy content and animations can settle
    pub settle_delay_ms: u64,
    /// Safety window for a single provider call
    pub capture_timeout_ms: u64,
    /// Pause between steps, bounds the provider request rate
    pub step_delay_ms: u64,
    pub max_primary_dimension: u32,
    pub max_secondary_dimension: u32,
    pub max_area: u64,
    /// Prefix of the suggested output file name
    pub filename_prefix: String,
    /// Hosts that must never be captured, on top of the built-in list
    pub denied_hosts: Vec<String>,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        let limits = TileLimits::default();
        Self {
            scroll_pad: DEFAULT_SCROLL_PAD,
            settle_delay_ms: 150,
            capture_timeout_ms: 1250,
            step_delay_ms: 200,
            max_primary_dimension: limits.max_primary,
            max_secondary_dimension: limits.max_secondary,
            max_area: limits.max_area,
            filename_prefix: DEFAULT_PREFIX.to_string(),
            denied_hosts: Vec::new(),
        }
    }
}

impl CaptureOptions {
    pub fn tile_limits(&self) -> TileLimits {
        TileLimits {
            max_primary: self.max_primary_dimension,
            max_secondary: self.max_secondary_dimension,
            max_area: self.max_area,
        }
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms)
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }
}

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Planning,
    Scrolling,
    AwaitingCapture,
    Compositing,
    CleaningUp,
    Done,
    /// Target rejected before anything was touched
    Aborted,
}

/// Restores the page snapshot at most once
struct SessionRestore {
    scroll: Arc<dyn ScrollController>,
    saved: Option<SessionState>,
}

impl SessionRestore {
    fn new(scroll: Arc<dyn ScrollController>) -> Self {
        Self { scroll, saved: None }
    }

    fn arm(&mut self, state: SessionState) {
        self.saved = Some(state);
    }

    async fn restore(&mut self) {
        let Some(state) = self.saved.take() else {
            return;
        };

        // a page that navigated away or closed has nothing left to restore
        match self.scroll.restore_state(&state).await {
            Ok(()) => debug!(
                "Restored scroll position ({}, {}) and overflow styling",
                state.scroll_x, state.scroll_y
            ),
            Err(e) => warn!("Failed to restore page state, ignoring: {}", e),
        }
    }
}

/// Capture orchestrator
///
/// Owns the collaborators for one page. `capture` takes `&mut self`, so a
/// page never runs two sessions at once and the compositor has one writer.
pub struct CaptureOrchestrator {
    scroll: Arc<dyn ScrollController>,
    provider: Arc<dyn CaptureProvider>,
    options: CaptureOptions,
    state: watch::Sender<CaptureState>,
}

impl CaptureOrchestrator {
    /// Create a new orchestrator
    pub fn new(
        scroll: Arc<dyn ScrollController>,
        provider: Arc<dyn CaptureProvider>,
        options: CaptureOptions,
    ) -> Self {
        let (state, _) = watch::channel(CaptureState::Idle);
        Self {
            scroll,
            provider,
            options,
            state,
        }
    }

    pub fn options(&self) -> &CaptureOptions {
        &self.options
    }

    /// Current session state
    pub fn state(&self) -> CaptureState {
        *self.state.borrow()
    }

    /// Watch state transitions
    pub fn subscribe(&self) -> watch::Receiver<CaptureState> {
        self.state.subscribe()
    }

    /// Run one capture session against the page at `target_url`.
    ///
    /// Progress and the outcome are reported to `progress`; the outcome is
    /// also returned. Partial tiles are dropped on failure.
    pub async fn capture(
        &mut self,
        target_url: &str,
        mode: CaptureMode,
        progress: &dyn ProgressSink,
    ) -> Result<CaptureOutput> {
        let session_id = Uuid::new_v4();
        let span = info_span!("capture", %session_id, ?mode);
        self.run_session(target_url, mode, progress)
            .instrument(span)
            .await
    }

    async fn run_session(
        &self,
        target_url: &str,
        mode: CaptureMode,
        progress: &dyn ProgressSink,
    ) -> Result<CaptureOutput> {
        self.transition(CaptureState::Idle);
        info!("Starting capture of {}", target_url);

        if let Err(e) = validate_target(target_url, &self.options.denied_hosts) {
            warn!("Capture aborted: {}", e);
            self.transition(CaptureState::Aborted);
            progress.on_failure(&e).await;
            return Err(e);
        }

        let mut restore = SessionRestore::new(Arc::clone(&self.scroll));
        let outcome = self.drive(target_url, mode, progress, &mut restore).await;

        self.transition(CaptureState::CleaningUp);
        restore.restore().await;
        self.transition(CaptureState::Done);

        match outcome {
            Ok(output) => {
                info!(
                    "Capture complete: {} tile(s), {}x{} -> {}",
                    output.tiles.len(),
                    output.metadata.total_width,
                    output.metadata.total_height,
                    output.metadata.filename
                );
                progress.on_success(&output).await;
                Ok(output)
            }
            Err(e) => {
                warn!("Capture failed: {}", e);
                progress.on_failure(&e).await;
                Err(e)
            }
        }
    }

    async fn drive(
        &self,
        target_url: &str,
        mode: CaptureMode,
        progress: &dyn ProgressSink,
        restore: &mut SessionRestore,
    ) -> Result<CaptureOutput> {
        self.transition(CaptureState::Planning);
        restore.arm(self.scroll.snapshot_state().await?);
        self.scroll.disable_scrollbars().await?;

        let viewport = self.scroll.viewport_size().await?;
        let scroll = self.scroll.current_scroll_position().await?;
        let extent = match mode {
            CaptureMode::Visible => PageExtent::from(viewport),
            CaptureMode::WholePage => self.scroll.page_extent().await?,
        };

        let mut plan = geometry::plan(viewport, extent, scroll, mode, self.options.scroll_pad);
        info!(
            "Planned {} position(s) for a {}x{} page in a {}x{} viewport",
            plan.total(),
            plan.extent().width,
            plan.extent().height,
            viewport.width,
            viewport.height
        );
        if plan.is_empty() {
            return Err(Error::EmptyPlan);
        }

        let filename = build_filename(target_url, &self.options.filename_prefix);
        let mut compositor = Compositor::new(self.options.tile_limits(), filename);

        while let Some(arrangement) = plan.next_arrangement() {
            self.transition(CaptureState::Scrolling);
            let completion = plan.completion();
            let origin = if mode.is_visible() {
                ScrollPosition::default()
            } else {
                self.scroll.scroll_to(arrangement.x, arrangement.y).await?;
                self.scroll.current_scroll_position().await?
            };
            debug!(
                "Position {}/{}: requested ({}, {}), realized ({}, {})",
                plan.total() - plan.remaining(),
                plan.total(),
                arrangement.x,
                arrangement.y,
                origin.x,
                origin.y
            );

            self.transition(CaptureState::AwaitingCapture);
            tokio::time::sleep(self.options.settle_delay()).await;

            // dropping the provider future on timeout discards any late reply
            let image = match tokio::time::timeout(
                self.options.capture_timeout(),
                self.provider.capture(origin, viewport.width),
            )
            .await
            {
                Ok(Ok(image)) => image,
                Ok(Err(Error::CaptureProvider(reason))) => return Err(Error::CaptureProvider(reason)),
                Ok(Err(e)) => return Err(Error::capture_provider(e.to_string())),
                Err(_) => return Err(Error::CaptureTimeout(self.options.capture_timeout_ms)),
            };

            self.transition(CaptureState::Compositing);
            let frame = CaptureFrame {
                image,
                x: origin.x,
                y: origin.y,
                declared_viewport_width: viewport.width,
                extent: plan.extent(),
                completion,
            };
            let finished = compositor.composite(frame)?;
            progress.on_progress(completion).await;

            if let Some(output) = finished {
                return Ok(output);
            }
            tokio::time::sleep(self.options.step_delay()).await;
        }

        Err(Error::internal("capture plan exhausted without a final frame"))
    }

    fn transition(&self, next: CaptureState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            debug!("Capture state {:?} -> {:?}", previous, next);
        }
    }
}
