//! One-shot capture of a URL in a fresh browser tab
//!
//! Wires the pieces together the way the binary uses them: open a target,
//! attach, navigate, run a capture session with title progress, write the
//! tiles.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::capture::{validate_target, CaptureMode, CaptureOrchestrator, OutputMetadata};
use crate::cdp::CdpBrowser;
use crate::config::Config;
use crate::output::{LoggingProgress, TileWriter};
use crate::page::{CdpPage, TitleProgress};
use crate::Result;

/// Where a finished capture ended up
#[derive(Debug, Clone)]
pub struct Shot {
    pub metadata: OutputMetadata,
    /// Written PNG files in tile order
    pub paths: Vec<PathBuf>,
}

/// Capture `url` in a new tab of `browser` and write the result to
/// `config.output_dir`.
///
/// Rejected URLs are never loaded: the tab stays on `about:blank` and the
/// session aborts before touching it. Validation and the file name use the
/// URL the tab actually landed on, so a redirect to a denied page is refused
/// too. The tab is closed on every exit; the browser's connections stay
/// open for the caller to close.
pub async fn capture_url(
    browser: &dyn CdpBrowser,
    config: &Config,
    url: &str,
    mode: CaptureMode,
) -> Result<Shot> {
    let target = browser.create_target("about:blank").await?;
    let outcome = capture_in_target(browser, &target, config, url, mode).await;

    if let Err(e) = browser.close_target(&target).await {
        warn!("Failed to close capture tab: {}", e);
    }

    outcome
}

async fn capture_in_target(
    browser: &dyn CdpBrowser,
    target: &str,
    config: &Config,
    url: &str,
    mode: CaptureMode,
) -> Result<Shot> {
    let client = browser.create_client(target).await?;
    let page = CdpPage::new(client);

    let location = if validate_target(url, &config.capture.denied_hosts).is_ok() {
        let navigation = page.client().navigate(url).await?;
        let location = page.location().await?;
        info!("Loaded {} (complete: {})", location, navigation.loaded);
        if location != url {
            debug!("{} redirected to {}", url, location);
        }
        location
    } else {
        url.to_string()
    };

    let controller = Arc::new(page.clone());
    let mut orchestrator = CaptureOrchestrator::new(
        controller.clone(),
        controller,
        config.capture.clone(),
    );
    let progress = TitleProgress::new(page, LoggingProgress);

    let output = orchestrator.capture(&location, mode, &progress).await?;
    let paths = TileWriter::new(&config.output_dir).write(&output).await?;

    Ok(Shot {
        metadata: output.metadata,
        paths,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdp::{MockCdpBrowser, MockPage};
    use crate::Error;

    fn fast_config(dir: PathBuf) -> Config {
        let mut config = Config {
            output_dir: dir,
            ..Config::default()
        };
        config.capture.settle_delay_ms = 1;
        config.capture.step_delay_ms = 1;
        config
    }

    #[tokio::test]
    async fn test_capture_url_writes_stitched_page() {
        let page = Arc::new(MockPage::new((800.0, 600.0), (800.0, 1700.0)).with_title("Example"));
        let browser = MockCdpBrowser::new(Arc::clone(&page));
        let dir = std::env::temp_dir().join(format!("chaser-shot-runner-{}", uuid::Uuid::new_v4()));

        let shot = capture_url(&browser, &fast_config(dir.clone()), "https://example.com/", CaptureMode::WholePage)
            .await
            .unwrap();

        assert_eq!(shot.paths.len(), 1);
        assert_eq!((shot.metadata.total_width, shot.metadata.total_height), (800, 1700));
        let written = image::open(&shot.paths[0]).unwrap().to_rgba8();
        assert_eq!(written.dimensions(), (800, 1700));
        assert_eq!(page.url(), "https://example.com/");
        assert_eq!(page.title(), "Example");
        assert_eq!(browser.closed_targets().len(), 1);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_denied_url_is_never_loaded() {
        let page = Arc::new(MockPage::new((800.0, 600.0), (800.0, 1700.0)));
        let browser = MockCdpBrowser::new(Arc::clone(&page));
        let dir = std::env::temp_dir().join(format!("chaser-shot-runner-{}", uuid::Uuid::new_v4()));

        let result = capture_url(
            &browser,
            &fast_config(dir.clone()),
            "https://chrome.google.com/webstore",
            CaptureMode::WholePage,
        )
        .await;

        assert!(matches!(result, Err(Error::InvalidTarget(_))));
        assert_eq!(page.url(), "about:blank");
        assert_eq!(page.captures(), 0);
        assert!(!dir.exists());
        assert_eq!(browser.closed_targets().len(), 1);
    }

    #[tokio::test]
    async fn test_redirect_to_denied_page_is_refused() {
        let page = Arc::new(
            MockPage::new((800.0, 600.0), (800.0, 1700.0))
                .redirecting_to("https://chrome.google.com/webstore/detail/abc"),
        );
        let browser = MockCdpBrowser::new(Arc::clone(&page));
        let dir = std::env::temp_dir().join(format!("chaser-shot-runner-{}", uuid::Uuid::new_v4()));

        let result = capture_url(
            &browser,
            &fast_config(dir.clone()),
            "https://example.com/go",
            CaptureMode::WholePage,
        )
        .await;

        assert!(matches!(result, Err(Error::InvalidTarget(msg)) if msg.contains("chrome.google.com")));
        assert_eq!(page.captures(), 0);
        assert_eq!(page.restores(), 0);
        assert!(!dir.exists());
        assert_eq!(browser.closed_targets().len(), 1);
    }

    #[tokio::test]
    async fn test_file_is_named_after_landed_url() {
        let page = Arc::new(
            MockPage::new((800.0, 600.0), (800.0, 600.0)).redirecting_to("https://www.example.com/landing"),
        );
        let browser = MockCdpBrowser::new(Arc::clone(&page));
        let dir = std::env::temp_dir().join(format!("chaser-shot-runner-{}", uuid::Uuid::new_v4()));

        let shot = capture_url(&browser, &fast_config(dir.clone()), "http://example.com", CaptureMode::Visible)
            .await
            .unwrap();

        assert!(shot.metadata.filename.contains("www-example-com-landing"));
        assert!(!shot.metadata.filename.contains("http"));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_capture_still_closes_tab() {
        let page = Arc::new(MockPage::new((800.0, 600.0), (800.0, 600.0)).failing_captures());
        let browser = MockCdpBrowser::new(Arc::clone(&page));
        let dir = std::env::temp_dir().join(format!("chaser-shot-runner-{}", uuid::Uuid::new_v4()));

        let result = capture_url(&browser, &fast_config(dir), "https://example.com/", CaptureMode::Visible).await;

        assert!(matches!(result, Err(Error::CaptureProvider(_))));
        let closed = browser.closed_targets();
        assert_eq!(closed.len(), 1);
        assert!(closed[0].starts_with("ws://localhost:9222/devtools/page/"));
    }
}
