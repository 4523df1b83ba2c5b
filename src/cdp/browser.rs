//! CDP browser control implementation
//!
//! This module provides browser-level operations via CDP and the DevTools
//! HTTP endpoints.

use super::client::CdpClientImpl;
use super::connection::CdpWebSocketConnection;
use super::traits::*;
use crate::Error;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// CDP browser implementation
#[derive(Debug)]
pub struct CdpBrowserImpl {
    /// Browser WebSocket endpoint (e.g., "ws://localhost:9222")
    endpoint: String,
    /// HTTP client for the DevTools JSON endpoints
    http: reqwest::Client,
    /// Active connections (target_id -> connection)
    connections: Arc<Mutex<HashMap<String, Arc<dyn CdpConnection>>>>,
    /// Targets created through `create_target` and not closed yet
    targets: Arc<Mutex<HashSet<String>>>,
}

/// Target ID at the end of a `ws://host/devtools/page/<id>` URL
fn target_id(target_url: &str) -> &str {
    target_url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(target_url)
}

impl CdpBrowserImpl {
    /// Create a new CDP browser controller
    ///
    /// # Arguments
    /// * `endpoint` - Browser WebSocket endpoint (e.g., "ws://localhost:9222")
    pub fn new<S: Into<String>>(endpoint: S) -> Self {
        let endpoint = endpoint.into();
        debug!("Creating CDP browser controller for endpoint: {}", endpoint);
        Self {
            endpoint,
            http: reqwest::Client::new(),
            connections: Arc::new(Mutex::new(HashMap::new())),
            targets: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// HTTP base URL of the DevTools endpoint
    fn http_endpoint(&self) -> String {
        let base = self
            .endpoint
            .replacen("ws://", "http://", 1)
            .replacen("wss://", "https://", 1);
        base.trim_end_matches('/').to_string()
    }

    /// Close a tab by ID through `/json/close`, dropping its connection first
    async fn close_target_id(&self, target_id: &str) -> Result<(), Error> {
        let connection = self.connections.lock().await.remove(target_id);
        if let Some(connection) = connection {
            if let Err(e) = connection.close().await {
                warn!("Failed to close connection to {}: {}", target_id, e);
            }
        }
        self.targets.lock().await.remove(target_id);

        let url = format!("{}/json/close/{}", self.http_endpoint(), target_id);
        debug!("Closing target via {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| self.connect_hint(e))?;
        if !response.status().is_success() {
            return Err(Error::cdp(format!(
                "Failed to close target {}: HTTP {}",
                target_id,
                response.status()
            )));
        }

        info!("Closed target {}", target_id);
        Ok(())
    }

    fn connect_hint(&self, e: impl std::fmt::Display) -> Error {
        Error::websocket(format!(
            r#"Failed to connect to Chrome CDP endpoint at {}.
Please start Chrome with:
  Linux: google-chrome --remote-debugging-port=9222 --user-data-dir=/tmp/chrome-debug
  macOS: /Applications/Google\ Chrome.app/Contents/MacOS/Google\ Chrome --remote-debugging-port=9222 --user-data-dir=/tmp/chrome-debug
Original error: {}"#,
            self.endpoint, e
        ))
    }
}

#[async_trait]
impl CdpBrowser for CdpBrowserImpl {
    /// Create a new CDP client for a page target
    async fn create_client(&self, target_url: &str) -> Result<Arc<dyn CdpClient>, Error> {
        info!("Attaching to target: {}", target_url);

        let connection = CdpWebSocketConnection::new(target_url).await?;

        let target_id = target_id(target_url).to_string();

        self.connections
            .lock()
            .await
            .insert(target_id, Arc::clone(&connection) as Arc<dyn CdpConnection>);

        let client = Arc::new(CdpClientImpl::new(connection));

        // Page and Runtime are all the capture path needs
        client.enable_domain("Page").await?;
        client.enable_domain("Runtime").await?;

        Ok(client)
    }

    /// Close every target and connection opened through this browser
    async fn close(&self) -> Result<(), Error> {
        let targets: Vec<String> = self.targets.lock().await.drain().collect();
        for target in targets {
            if let Err(e) = self.close_target_id(&target).await {
                warn!("Failed to close target {}: {}", target, e);
            }
        }

        let mut connections = self.connections.lock().await;
        if connections.is_empty() {
            return Ok(());
        }

        info!("Closing {} CDP connection(s)", connections.len());

        let mut failed = 0usize;
        for (target_id, connection) in connections.drain() {
            if let Err(e) = connection.close().await {
                failed += 1;
                warn!("Failed to close connection to {}: {}", target_id, e);
            }
        }

        if failed > 0 {
            warn!("{} connection(s) failed to close", failed);
        }

        Ok(())
    }

    /// Get browser version
    async fn get_version(&self) -> Result<BrowserVersion, Error> {
        let url = format!("{}/json/version", self.http_endpoint());
        debug!("Fetching browser version from {}", url);

        let version_json: serde_json::Value = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| self.connect_hint(e))?
            .json()
            .await
            .map_err(|e| Error::cdp(format!("Failed to parse version: {}", e)))?;

        let field = |name: &str| {
            version_json
                .get(name)
                .and_then(|v| v.as_str())
                .unwrap_or("unknown")
                .to_string()
        };

        Ok(BrowserVersion {
            protocol_version: field("Protocol-Version"),
            product: field("Browser"),
            user_agent: field("User-Agent"),
        })
    }

    /// Create a new page target using the /json/new endpoint
    async fn create_target(&self, url: &str) -> Result<String, Error> {
        info!("Creating new target with URL: {}", url);

        let new_url = format!("{}/json/new?{}", self.http_endpoint(), url);

        let response_text = self
            .http
            .put(&new_url)
            .send()
            .await
            .map_err(|e| self.connect_hint(e))?
            .text()
            .await
            .map_err(|e| Error::cdp(format!("Failed to read response: {}", e)))?;

        let target_json: serde_json::Value = serde_json::from_str(&response_text).map_err(|e| {
            Error::cdp(format!(
                "Failed to parse new target response: {} (response was: {})",
                e, response_text
            ))
        })?;

        let ws_url = target_json
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::cdp("No webSocketDebuggerUrl in new target response"))?;

        debug!("Created new target with WebSocket URL: {}", ws_url);
        self.targets.lock().await.insert(target_id(ws_url).to_string());

        Ok(ws_url.to_string())
    }

    /// Close a page target using the /json/close endpoint
    async fn close_target(&self, target_url: &str) -> Result<(), Error> {
        self.close_target_id(target_id(target_url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_creation() {
        let browser = CdpBrowserImpl::new("ws://localhost:9222");
        assert_eq!(browser.endpoint, "ws://localhost:9222");
    }

    #[test]
    fn test_http_endpoint_conversion() {
        let browser = CdpBrowserImpl::new("ws://localhost:9222/");
        assert_eq!(browser.http_endpoint(), "http://localhost:9222");

        let browser = CdpBrowserImpl::new("wss://remote.example.com:9222");
        assert_eq!(browser.http_endpoint(), "https://remote.example.com:9222");
    }

    #[test]
    fn test_target_id_from_websocket_url() {
        assert_eq!(target_id("ws://localhost:9222/devtools/page/ABC123"), "ABC123");
        assert_eq!(target_id("ws://localhost:9222/devtools/page/ABC123/"), "ABC123");
    }

    #[tokio::test]
    async fn test_close_without_connections() {
        let browser = CdpBrowserImpl::new("ws://localhost:9222");
        assert!(browser.close().await.is_ok());
    }
}
