//! Mock CDP implementation for testing
//!
//! `MockPage` simulates the bits of a browser tab the capture path touches:
//! a scrollable document with a deterministic pixel pattern, overflow
//! styling, a title, and a screenshot endpoint that can be made to fail,
//! hang, or change zoom mid-session. `MockCdpConnection` answers CDP
//! commands from it, in-process.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::{ImageFormat, Rgba, RgbaImage};
use serde_json::{json, Value};
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::capture::SessionState;
use crate::cdp::client::CdpClientImpl;
use crate::cdp::traits::*;
use crate::page::scripts;
use crate::Error;

/// Colour of page pixel `(x, y)` in device pixels
pub fn mock_pixel(x: u32, y: u32) -> Rgba<u8> {
    Rgba([
        (x % 251) as u8,
        (y % 251) as u8,
        ((x / 251 + y / 251) % 251) as u8,
        255,
    ])
}

/// Outcome of one simulated command
#[derive(Debug, Clone)]
pub enum MockReply {
    Result(Value),
    Error(CdpError),
    /// The command is never answered
    Hang,
}

#[derive(Debug)]
struct MockPageState {
    viewport: (f64, f64),
    extent: (f64, f64),
    scroll: (f64, f64),
    device_pixel_ratio: f64,
    overflow: String,
    body_overflow_y: String,
    title: String,
    url: String,
    redirect: Option<String>,
    fail_capture: bool,
    hang_capture: bool,
    zoom_after: Option<(usize, f64)>,
    captures: usize,
    scroll_log: Vec<(f64, f64)>,
    title_log: Vec<String>,
    restores: usize,
}

/// Simulated browser tab
#[derive(Debug)]
pub struct MockPage {
    state: Mutex<MockPageState>,
}

impl MockPage {
    /// A page with the given viewport and document size, scrolled to the top
    pub fn new(viewport: (f64, f64), extent: (f64, f64)) -> Self {
        Self {
            state: Mutex::new(MockPageState {
                viewport,
                extent,
                scroll: (0.0, 0.0),
                device_pixel_ratio: 1.0,
                overflow: String::new(),
                body_overflow_y: String::new(),
                title: "Mock Page".to_string(),
                url: "about:blank".to_string(),
                redirect: None,
                fail_capture: false,
                hang_capture: false,
                zoom_after: None,
                captures: 0,
                scroll_log: Vec::new(),
                title_log: Vec::new(),
                restores: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockPageState> {
        // a panicking test thread must not hide the page from the others
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn with_scroll(self, x: f64, y: f64) -> Self {
        self.lock().scroll = (x, y);
        self
    }

    pub fn with_device_pixel_ratio(self, ratio: f64) -> Self {
        self.lock().device_pixel_ratio = ratio;
        self
    }

    pub fn with_overflow(self, overflow: &str, body_overflow_y: &str) -> Self {
        {
            let mut state = self.lock();
            state.overflow = overflow.to_string();
            state.body_overflow_y = body_overflow_y.to_string();
        }
        self
    }

    pub fn with_title(self, title: &str) -> Self {
        self.lock().title = title.to_string();
        self
    }

    /// The next navigation lands on `url` whatever was requested
    pub fn redirecting_to(self, url: &str) -> Self {
        self.lock().redirect = Some(url.to_string());
        self
    }

    /// Every screenshot request answers with a protocol error
    pub fn failing_captures(self) -> Self {
        self.lock().fail_capture = true;
        self
    }

    /// Screenshot requests are never answered
    pub fn hanging_captures(self) -> Self {
        self.lock().hang_capture = true;
        self
    }

    /// The first `captures` screenshots use the initial ratio, later ones `ratio`
    pub fn zoom_after(self, captures: usize, ratio: f64) -> Self {
        self.lock().zoom_after = Some((captures, ratio));
        self
    }

    pub fn scroll_position(&self) -> (f64, f64) {
        self.lock().scroll
    }

    /// Every realized `window.scrollTo` target, in order
    pub fn scroll_log(&self) -> Vec<(f64, f64)> {
        self.lock().scroll_log.clone()
    }

    /// Every title assigned through `document.title = ...`, in order
    pub fn title_log(&self) -> Vec<String> {
        self.lock().title_log.clone()
    }

    pub fn title(&self) -> String {
        self.lock().title.clone()
    }

    pub fn url(&self) -> String {
        self.lock().url.clone()
    }

    /// `(documentElement.style.overflow, body.style.overflowY)`
    pub fn overflow(&self) -> (String, String) {
        let state = self.lock();
        (state.overflow.clone(), state.body_overflow_y.clone())
    }

    pub fn captures(&self) -> usize {
        self.lock().captures
    }

    pub fn restores(&self) -> usize {
        self.lock().restores
    }

    /// Answer one CDP command
    pub fn respond(&self, method: &str, params: &Value) -> MockReply {
        match method {
            "Page.enable" | "Runtime.enable" => MockReply::Result(json!({})),
            "Page.navigate" => {
                if let Some(url) = params.get("url").and_then(|v| v.as_str()) {
                    let mut state = self.lock();
                    state.url = state.redirect.take().unwrap_or_else(|| url.to_string());
                }
                MockReply::Result(json!({ "frameId": "mock-frame", "loaderId": "mock-loader" }))
            }
            "Runtime.evaluate" => {
                let expression = params
                    .get("expression")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default();
                match self.evaluate(expression) {
                    Ok(remote) => MockReply::Result(json!({ "result": remote })),
                    Err(message) => MockReply::Result(json!({
                        "result": { "type": "object", "subtype": "error" },
                        "exceptionDetails": {
                            "text": "Uncaught",
                            "exception": { "description": message }
                        }
                    })),
                }
            }
            "Page.captureScreenshot" => self.screenshot(),
            _ => MockReply::Error(CdpError {
                code: -32601,
                message: format!("'{}' wasn't found", method),
                data: None,
            }),
        }
    }

    fn evaluate(&self, expression: &str) -> Result<Value, String> {
        let mut state = self.lock();

        let remote = match expression {
            scripts::READY_STATE_SCRIPT => string_value("complete"),
            scripts::VIEWPORT_SCRIPT => object_value(json!({
                "width": state.viewport.0,
                "height": state.viewport.1
            })),
            scripts::SCROLL_POSITION_SCRIPT => object_value(json!({
                "x": state.scroll.0,
                "y": state.scroll.1
            })),
            scripts::PAGE_EXTENT_SCRIPT => object_value(json!({
                "widths": [state.viewport.0, state.extent.0, null],
                "heights": [state.viewport.1, state.extent.1, null]
            })),
            scripts::SNAPSHOT_STATE_SCRIPT => object_value(json!({
                "scrollX": state.scroll.0,
                "scrollY": state.scroll.1,
                "overflow": state.overflow,
                "bodyOverflowY": state.body_overflow_y
            })),
            scripts::DISABLE_SCROLLBARS_SCRIPT => {
                state.overflow = "hidden".to_string();
                state.body_overflow_y = "visible".to_string();
                json!({ "type": "boolean", "value": true })
            }
            scripts::TITLE_SCRIPT => string_value(&state.title),
            scripts::LOCATION_SCRIPT => string_value(&state.url),
            _ => return self.evaluate_call(&mut state, expression),
        };

        Ok(remote)
    }

    fn evaluate_call(&self, state: &mut MockPageState, expression: &str) -> Result<Value, String> {
        if let Some(args) = expression
            .strip_prefix(scripts::SCROLL_TO_PREFIX)
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let coords: Vec<f64> = args
                .split(',')
                .map(|part| part.trim().parse::<f64>())
                .collect::<Result<_, _>>()
                .map_err(|e| format!("SyntaxError: {}", e))?;
            let &[x, y] = coords.as_slice() else {
                return Err("TypeError: scrollTo expects two arguments".to_string());
            };
            state.scroll = clamp_scroll(state, x, y);
            state.scroll_log.push(state.scroll);
            return Ok(undefined_value());
        }

        let restore_prefix = format!("({})(", scripts::RESTORE_STATE_FN);
        if let Some(arg) = expression
            .strip_prefix(restore_prefix.as_str())
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let saved: SessionState =
                serde_json::from_str(arg).map_err(|e| format!("SyntaxError: {}", e))?;
            state.overflow = saved.overflow;
            if let Some(body) = saved.body_overflow_y {
                state.body_overflow_y = body;
            }
            state.scroll = clamp_scroll(state, saved.scroll_x, saved.scroll_y);
            state.restores += 1;
            return Ok(json!({ "type": "boolean", "value": true }));
        }

        if let Some(arg) = expression.strip_prefix(scripts::SET_TITLE_PREFIX) {
            let title: String =
                serde_json::from_str(arg).map_err(|e| format!("SyntaxError: {}", e))?;
            state.title = title.clone();
            state.title_log.push(title.clone());
            return Ok(string_value(&title));
        }

        Err(format!("ReferenceError: unsupported expression `{}`", expression))
    }

    fn screenshot(&self) -> MockReply {
        let mut state = self.lock();

        if state.hang_capture {
            return MockReply::Hang;
        }
        if state.fail_capture {
            return MockReply::Error(CdpError {
                code: -32000,
                message: "Unable to capture screenshot".to_string(),
                data: None,
            });
        }

        if let Some((after, ratio)) = state.zoom_after {
            if state.captures >= after {
                state.device_pixel_ratio = ratio;
            }
        }
        state.captures += 1;

        let image = render(&state);
        drop(state);

        let mut png = Vec::new();
        if let Err(e) = image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png) {
            return MockReply::Error(CdpError {
                code: -32000,
                message: format!("Failed to encode screenshot: {}", e),
                data: None,
            });
        }

        MockReply::Result(json!({ "data": BASE64.encode(png) }))
    }
}

fn clamp_scroll(state: &MockPageState, x: f64, y: f64) -> (f64, f64) {
    let max_x = (state.extent.0 - state.viewport.0).max(0.0);
    let max_y = (state.extent.1 - state.viewport.1).max(0.0);
    (x.clamp(0.0, max_x), y.clamp(0.0, max_y))
}

/// Visible viewport in device pixels
fn render(state: &MockPageState) -> RgbaImage {
    let ratio = state.device_pixel_ratio;
    let width = (state.viewport.0 * ratio).round() as u32;
    let height = (state.viewport.1 * ratio).round() as u32;
    let left = (state.scroll.0 * ratio).round() as u32;
    let top = (state.scroll.1 * ratio).round() as u32;

    RgbaImage::from_fn(width, height, |x, y| mock_pixel(left + x, top + y))
}

fn string_value(value: &str) -> Value {
    json!({ "type": "string", "value": value })
}

fn object_value(value: Value) -> Value {
    json!({ "type": "object", "value": value })
}

fn undefined_value() -> Value {
    json!({ "type": "undefined" })
}

/// Mock CDP connection backed by a [`MockPage`]
#[derive(Debug)]
pub struct MockCdpConnection {
    page: Arc<MockPage>,
    is_active: AtomicBool,
    next_id: AtomicU64,
}

impl MockCdpConnection {
    /// Create a new mock CDP connection
    pub fn new(page: Arc<MockPage>) -> Self {
        Self {
            page,
            is_active: AtomicBool::new(true),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn page(&self) -> &Arc<MockPage> {
        &self.page
    }
}

#[async_trait]
impl CdpConnection for MockCdpConnection {
    async fn send_command(&self, method: &str, params: Value) -> Result<CdpResponse, Error> {
        if !self.is_active.load(Ordering::Relaxed) {
            return Err(Error::websocket("Connection is not active"));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        match self.page.respond(method, &params) {
            MockReply::Result(result) => Ok(CdpResponse {
                id,
                result: Some(result),
                error: None,
            }),
            MockReply::Error(error) => Err(Error::cdp(format!(
                "{}: {} (code: {})",
                method, error.message, error.code
            ))),
            MockReply::Hang => std::future::pending().await,
        }
    }

    async fn close(&self) -> Result<(), Error> {
        self.is_active.store(false, Ordering::Relaxed);
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.is_active.load(Ordering::Relaxed)
    }
}

/// A real [`CdpClientImpl`] talking to `page` in-process
pub fn mock_client(page: Arc<MockPage>) -> Arc<dyn CdpClient> {
    Arc::new(CdpClientImpl::new(Arc::new(MockCdpConnection::new(page))))
}

/// Mock CDP browser; every target it creates shows the same page
#[derive(Debug)]
pub struct MockCdpBrowser {
    page: Arc<MockPage>,
    connections: Mutex<Vec<Arc<MockCdpConnection>>>,
    closed_targets: Mutex<Vec<String>>,
    is_active: AtomicBool,
}

impl MockCdpBrowser {
    /// Create a new mock CDP browser
    pub fn new(page: Arc<MockPage>) -> Self {
        Self {
            page,
            connections: Mutex::new(Vec::new()),
            closed_targets: Mutex::new(Vec::new()),
            is_active: AtomicBool::new(true),
        }
    }

    /// Connections still open
    pub fn open_connections(&self) -> usize {
        self.connections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .filter(|c| c.is_active())
            .count()
    }

    /// Target URLs passed to `close_target`, in order
    pub fn closed_targets(&self) -> Vec<String> {
        self.closed_targets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl CdpBrowser for MockCdpBrowser {
    async fn create_client(&self, _target_url: &str) -> Result<Arc<dyn CdpClient>, Error> {
        if !self.is_active.load(Ordering::Relaxed) {
            return Err(Error::cdp("Browser is closed"));
        }

        let connection = Arc::new(MockCdpConnection::new(Arc::clone(&self.page)));
        self.connections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Arc::clone(&connection));

        Ok(Arc::new(CdpClientImpl::new(connection)))
    }

    async fn close(&self) -> Result<(), Error> {
        let connections: Vec<_> = self
            .connections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .drain(..)
            .collect();
        for connection in connections {
            connection.close().await?;
        }
        self.is_active.store(false, Ordering::Relaxed);
        Ok(())
    }

    async fn get_version(&self) -> Result<BrowserVersion, Error> {
        Ok(BrowserVersion {
            protocol_version: "1.3".to_string(),
            product: "Chrome/120.0.0.0".to_string(),
            user_agent: "Mock Chrome/120.0.0.0".to_string(),
        })
    }

    async fn create_target(&self, url: &str) -> Result<String, Error> {
        if !self.is_active.load(Ordering::Relaxed) {
            return Err(Error::cdp("Browser is closed"));
        }

        let target_id = uuid::Uuid::new_v4();
        tracing::debug!("Mock: created target {} for {}", target_id, url);
        Ok(format!("ws://localhost:9222/devtools/page/{}", target_id))
    }

    async fn close_target(&self, target_url: &str) -> Result<(), Error> {
        tracing::debug!("Mock: closed target {}", target_url);
        self.closed_targets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(target_url.to_string());
        Ok(())
    }
}
