//! Page controller tests against the simulated page

use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;

use super::*;
use crate::capture::{
    CaptureOutput, CaptureProvider, PageExtent, ProgressSink, ScrollController, ScrollPosition,
    SessionState, Viewport,
};
use crate::cdp::{mock_client, mock_pixel, MockPage};
use crate::Error;

fn tall_page() -> Arc<MockPage> {
    Arc::new(MockPage::new((800.0, 600.0), (800.0, 1700.0)))
}

#[derive(Default)]
struct Recorder {
    progress: Mutex<Vec<f64>>,
    failures: Mutex<usize>,
}

#[async_trait]
impl ProgressSink for Recorder {
    async fn on_progress(&self, fraction: f64) {
        self.progress.lock().unwrap().push(fraction);
    }

    async fn on_success(&self, _output: &CaptureOutput) {}

    async fn on_failure(&self, _error: &Error) {
        *self.failures.lock().unwrap() += 1;
    }
}

#[tokio::test]
async fn test_geometry_probes() {
    let mock = Arc::new(MockPage::new((800.0, 600.0), (1024.0, 1700.0)).with_scroll(0.0, 40.0));
    let page = CdpPage::new(mock_client(mock));

    assert_eq!(page.viewport_size().await.unwrap(), Viewport::new(800.0, 600.0));
    assert_eq!(page.page_extent().await.unwrap(), PageExtent::new(1024.0, 1700.0));
    assert_eq!(page.current_scroll_position().await.unwrap(), ScrollPosition::new(0.0, 40.0));
}

#[tokio::test]
async fn test_scroll_reports_realized_position() {
    let mock = tall_page();
    let page = CdpPage::new(mock_client(Arc::clone(&mock)));

    page.scroll_to(0.0, -100.0).await.unwrap();
    assert_eq!(page.current_scroll_position().await.unwrap(), ScrollPosition::new(0.0, 0.0));

    page.scroll_to(0.0, 700.0).await.unwrap();
    assert_eq!(page.current_scroll_position().await.unwrap(), ScrollPosition::new(0.0, 700.0));
}

#[tokio::test]
async fn test_snapshot_disable_and_restore() {
    let mock = Arc::new(
        MockPage::new((800.0, 600.0), (800.0, 1700.0))
            .with_scroll(0.0, 250.0)
            .with_overflow("scroll", "auto"),
    );
    let page = CdpPage::new(mock_client(Arc::clone(&mock)));

    let saved = page.snapshot_state().await.unwrap();
    assert_eq!(
        saved,
        SessionState {
            scroll_x: 0.0,
            scroll_y: 250.0,
            overflow: "scroll".to_string(),
            body_overflow_y: Some("auto".to_string()),
        }
    );

    page.disable_scrollbars().await.unwrap();
    page.scroll_to(0.0, 1100.0).await.unwrap();
    assert_eq!(mock.overflow(), ("hidden".to_string(), "visible".to_string()));

    page.restore_state(&saved).await.unwrap();
    assert_eq!(mock.overflow(), ("scroll".to_string(), "auto".to_string()));
    assert_eq!(mock.scroll_position(), (0.0, 250.0));
    assert_eq!(mock.restores(), 1);
}

#[tokio::test]
async fn test_capture_decodes_viewport_raster() {
    let mock = Arc::new(
        MockPage::new((400.0, 300.0), (400.0, 900.0))
            .with_scroll(0.0, 120.0)
            .with_device_pixel_ratio(2.0),
    );
    let page = CdpPage::new(mock_client(mock));

    let image = page.capture(ScrollPosition::new(0.0, 120.0), 400.0).await.unwrap();
    assert_eq!(image.dimensions(), (800, 600));
    assert_eq!(*image.get_pixel(0, 0), mock_pixel(0, 240));
}

#[tokio::test]
async fn test_capture_failure_surfaces_as_error() {
    let page = CdpPage::new(mock_client(Arc::new(
        MockPage::new((800.0, 600.0), (800.0, 600.0)).failing_captures(),
    )));
    assert!(page.capture(ScrollPosition::default(), 800.0).await.is_err());
}

#[test]
fn test_progress_title_floors_percent() {
    assert_eq!(progress_title(0.25), "Capturing 25%...");
    assert_eq!(progress_title(1.0 / 3.0), "Capturing 33%...");
    assert_eq!(progress_title(0.999), "Capturing 99%...");
    assert_eq!(progress_title(1.0), "Capturing 100%...");
}

#[tokio::test]
async fn test_title_progress_restores_original_title() {
    let mock = Arc::new(MockPage::new((800.0, 600.0), (800.0, 1700.0)).with_title("Example Domain"));
    let page = CdpPage::new(mock_client(Arc::clone(&mock)));
    let sink = TitleProgress::new(page, Recorder::default());

    sink.on_progress(0.5).await;
    assert_eq!(mock.title(), "Capturing 50%...");
    sink.on_progress(1.0).await;
    sink.on_failure(&Error::CaptureTimeout(1250)).await;

    assert_eq!(mock.title(), "Example Domain");
    assert_eq!(
        mock.title_log(),
        vec!["Capturing 50%...", "Capturing 100%...", "Example Domain"]
    );
    assert_eq!(*sink.inner().progress.lock().unwrap(), vec![0.5, 1.0]);
    assert_eq!(*sink.inner().failures.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_title_progress_without_updates_leaves_title() {
    let mock = Arc::new(MockPage::new((800.0, 600.0), (800.0, 600.0)).with_title("Untouched"));
    let sink = TitleProgress::new(CdpPage::new(mock_client(Arc::clone(&mock))), Recorder::default());

    sink.on_failure(&Error::invalid_target("chrome://settings")).await;

    assert!(mock.title_log().is_empty());
    assert_eq!(mock.title(), "Untouched");
}
