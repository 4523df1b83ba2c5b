//! CDP-backed page controller
//!
//! Implements the capture engine's scroll and capture seams by evaluating
//! the snippets in [`super::scripts`] and calling `Page.captureScreenshot`.

use async_trait::async_trait;
use image::RgbaImage;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use super::scripts;
use crate::capture::{
    CaptureProvider, PageExtent, ScrollController, ScrollPosition, SessionState, Viewport,
};
use crate::cdp::{CdpClient, EvaluationResult, ScreenshotFormat};
use crate::{Error, Result};

/// Raw size probes; entries are `null` when the DOM lacks the property
#[derive(Debug, Deserialize)]
struct ExtentProbes {
    #[serde(default)]
    widths: Vec<Option<f64>>,
    #[serde(default)]
    heights: Vec<Option<f64>>,
}

/// One browser page driven over CDP
#[derive(Debug, Clone)]
pub struct CdpPage {
    client: Arc<dyn CdpClient>,
}

impl CdpPage {
    pub fn new(client: Arc<dyn CdpClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<dyn CdpClient> {
        &self.client
    }

    /// Evaluate a script returning an object and deserialize it
    async fn evaluate_json<T: DeserializeOwned>(&self, script: &str) -> Result<T> {
        match self.client.evaluate(script, false).await? {
            EvaluationResult::Object(value) => Ok(serde_json::from_value(value)?),
            other => Err(Error::cdp(format!(
                "Expected an object from page script, got {:?}",
                other
            ))),
        }
    }

    async fn evaluate_string(&self, script: &str) -> Result<String> {
        match self.client.evaluate(script, false).await? {
            EvaluationResult::String(s) => Ok(s),
            EvaluationResult::Null => Ok(String::new()),
            other => Err(Error::cdp(format!("Expected a string, got {:?}", other))),
        }
    }

    pub async fn title(&self) -> Result<String> {
        self.evaluate_string(scripts::TITLE_SCRIPT).await
    }

    pub async fn set_title(&self, title: &str) -> Result<()> {
        self.client
            .evaluate(&scripts::set_title_script(title)?, false)
            .await?;
        Ok(())
    }

    /// URL of the document currently loaded in the page
    pub async fn location(&self) -> Result<String> {
        self.evaluate_string(scripts::LOCATION_SCRIPT).await
    }
}

#[async_trait]
impl ScrollController for CdpPage {
    async fn scroll_to(&self, x: f64, y: f64) -> Result<()> {
        self.client
            .evaluate(&scripts::scroll_to_script(x, y), false)
            .await?;
        Ok(())
    }

    async fn current_scroll_position(&self) -> Result<ScrollPosition> {
        self.evaluate_json(scripts::SCROLL_POSITION_SCRIPT).await
    }

    async fn viewport_size(&self) -> Result<Viewport> {
        self.evaluate_json(scripts::VIEWPORT_SCRIPT).await
    }

    async fn page_extent(&self) -> Result<PageExtent> {
        let probes: ExtentProbes = self.evaluate_json(scripts::PAGE_EXTENT_SCRIPT).await?;
        let widths: Vec<f64> = probes.widths.into_iter().flatten().collect();
        let heights: Vec<f64> = probes.heights.into_iter().flatten().collect();
        Ok(PageExtent::from_probes(&widths, &heights))
    }

    async fn snapshot_state(&self) -> Result<SessionState> {
        self.evaluate_json(scripts::SNAPSHOT_STATE_SCRIPT).await
    }

    async fn disable_scrollbars(&self) -> Result<()> {
        self.client
            .evaluate(scripts::DISABLE_SCROLLBARS_SCRIPT, false)
            .await?;
        Ok(())
    }

    async fn restore_state(&self, state: &SessionState) -> Result<()> {
        self.client
            .evaluate(&scripts::restore_state_script(state)?, false)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CaptureProvider for CdpPage {
    async fn capture(&self, origin: ScrollPosition, declared_viewport_width: f64) -> Result<RgbaImage> {
        let png = self.client.screenshot(ScreenshotFormat::Png).await?;
        let image = image::load_from_memory(&png)?.to_rgba8();
        debug!(
            "Captured {}x{} at ({}, {}) for a {}px wide viewport",
            image.width(),
            image.height(),
            origin.x,
            origin.y,
            declared_viewport_width
        );
        Ok(image)
    }
}
