//! Progress shown in the page title

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::warn;

use super::controller::CdpPage;
use crate::capture::{CaptureOutput, ProgressSink};
use crate::Error;

/// Title text for a plan completion fraction
pub fn progress_title(fraction: f64) -> String {
    let percent = (fraction.clamp(0.0, 1.0) * 100.0).floor() as u32;
    format!("Capturing {}%...", percent)
}

/// Writes progress into `document.title`, then forwards to `inner`.
///
/// The original title is read before the first update and put back when the
/// session reports its outcome. Title errors never fail the capture.
pub struct TitleProgress<S> {
    page: CdpPage,
    inner: S,
    original: Mutex<Option<String>>,
}

impl<S: ProgressSink> TitleProgress<S> {
    pub fn new(page: CdpPage, inner: S) -> Self {
        Self {
            page,
            inner,
            original: Mutex::new(None),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn restore_title(&self) {
        if let Some(title) = self.original.lock().await.take() {
            if let Err(e) = self.page.set_title(&title).await {
                warn!("Failed to restore page title: {}", e);
            }
        }
    }
}

#[async_trait]
impl<S: ProgressSink> ProgressSink for TitleProgress<S> {
    async fn on_progress(&self, fraction: f64) {
        let saved = {
            let mut original = self.original.lock().await;
            if original.is_none() {
                match self.page.title().await {
                    Ok(title) => *original = Some(title),
                    Err(e) => warn!("Failed to read page title: {}", e),
                }
            }
            original.is_some()
        };

        // never overwrite a title that could not be saved
        if saved {
            if let Err(e) = self.page.set_title(&progress_title(fraction)).await {
                warn!("Failed to update page title: {}", e);
            }
        }
        self.inner.on_progress(fraction).await;
    }

    async fn on_success(&self, output: &CaptureOutput) {
        self.restore_title().await;
        self.inner.on_success(output).await;
    }

    async fn on_failure(&self, error: &Error) {
        self.restore_title().await;
        self.inner.on_failure(error).await;
    }
}
