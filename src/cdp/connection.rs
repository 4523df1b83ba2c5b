//! CDP WebSocket connection implementation
//!
//! This module provides WebSocket-based connection to Chrome DevTools Protocol.

use super::traits::{CdpConnection, CdpError as CdpErrorResponse, CdpResponse};
use super::types::*;
use crate::Error;
use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};
use tokio::net::TcpStream;
use tokio::sync::{oneshot, Mutex, RwLock};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type PendingMap = Arc<StdMutex<HashMap<u64, PendingCommand>>>;

fn lock_pending(pending: &PendingMap) -> MutexGuard<'_, HashMap<u64, PendingCommand>> {
    pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// CDP timeout configuration
#[derive(Debug, Clone)]
struct CdpTimeoutConfig {
    /// Default timeout for most commands (seconds)
    default_timeout_secs: u64,
    /// Timeout for screenshot commands (seconds)
    screenshot_timeout_secs: u64,
    /// Timeout for page navigation commands (seconds)
    navigation_timeout_secs: u64,
    /// Timeout for JavaScript execution (seconds)
    execution_timeout_secs: u64,
}

impl Default for CdpTimeoutConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: 30,
            screenshot_timeout_secs: 90,
            navigation_timeout_secs: 60,
            execution_timeout_secs: 30,
        }
    }
}

impl CdpTimeoutConfig {
    /// Get timeout duration for a specific command method
    fn get_timeout_for_command(&self, method: &str) -> tokio::time::Duration {
        let secs = match method {
            "Page.captureScreenshot" => self.screenshot_timeout_secs,
            "Page.navigate" | "Page.reload" => self.navigation_timeout_secs,
            "Runtime.evaluate" | "Runtime.callFunctionOn" => self.execution_timeout_secs,
            _ => self.default_timeout_secs,
        };
        tokio::time::Duration::from_secs(secs)
    }
}

/// WebSocket connection state
#[derive(Debug, Clone, Copy, PartialEq)]
enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
    Closed,
}

/// Pending command response
#[derive(Debug)]
struct PendingCommand {
    /// Response channel sender
    sender: oneshot::Sender<CdpResponse>,
    /// Command method (for logging)
    method: String,
}

/// Drops a command's pending entry once its waiter is gone: answered,
/// timed out, or the `send_command` future itself dropped by the caller
struct PendingGuard<'a> {
    id: u64,
    pending: &'a PendingMap,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        lock_pending(self.pending).remove(&self.id);
    }
}

/// CDP WebSocket connection implementation
///
/// The socket is split: commands go through the shared sink, and a reader
/// task owns the stream and routes responses to their waiters by ID.
#[derive(Debug)]
pub struct CdpWebSocketConnection {
    /// WebSocket URL
    url: String,
    /// Write half of the socket
    sink: Arc<Mutex<Option<SplitSink<WsStream, Message>>>>,
    /// Connection state
    state: Arc<RwLock<ConnectionState>>,
    /// Next command ID
    next_id: AtomicU64,
    /// Pending commands (ID -> response sender)
    pending_commands: PendingMap,
    /// Is connection active
    is_active: Arc<AtomicBool>,
    /// Timeout configuration
    timeout_config: CdpTimeoutConfig,
}

impl CdpWebSocketConnection {
    /// Create a new CDP WebSocket connection
    ///
    /// # Arguments
    /// * `url` - WebSocket URL (e.g., "ws://localhost:9222/devtools/page/ABC123")
    pub async fn new<S: Into<String>>(url: S) -> Result<Arc<Self>, Error> {
        let url = url.into();
        info!("Creating CDP WebSocket connection to {}", url);

        let connection = Arc::new(Self {
            url,
            sink: Arc::new(Mutex::new(None)),
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            next_id: AtomicU64::new(1),
            pending_commands: Arc::new(StdMutex::new(HashMap::new())),
            is_active: Arc::new(AtomicBool::new(false)),
            timeout_config: CdpTimeoutConfig::default(),
        });

        connection.connect().await?;

        Ok(connection)
    }

    /// WebSocket URL this connection was opened on
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Commands still waiting for a reply
    pub fn pending_commands(&self) -> usize {
        lock_pending(&self.pending_commands).len()
    }

    /// Establish WebSocket connection
    async fn connect(&self) -> Result<(), Error> {
        {
            let mut state = self.state.write().await;
            if *state != ConnectionState::Disconnected {
                return Err(Error::internal("Connection is not in disconnected state"));
            }
            *state = ConnectionState::Connecting;
        }

        debug!("Connecting to WebSocket: {}", self.url);

        let ws_stream = match connect_async(&self.url).await {
            Ok((ws_stream, _)) => ws_stream,
            Err(e) => {
                *self.state.write().await = ConnectionState::Disconnected;
                return Err(Error::websocket(format!("Failed to connect: {}", e)));
            }
        };

        let (sink, stream) = ws_stream.split();
        *self.sink.lock().await = Some(sink);
        *self.state.write().await = ConnectionState::Connected;
        self.is_active.store(true, Ordering::SeqCst);

        info!("WebSocket connection established");

        let pending_commands = Arc::clone(&self.pending_commands);
        let is_active = Arc::clone(&self.is_active);
        let state = Arc::clone(&self.state);
        let sink = Arc::clone(&self.sink);

        tokio::spawn(async move {
            if let Err(e) = Self::message_loop(stream, sink, &pending_commands).await {
                error!("Message loop error: {}", e);
            }
            is_active.store(false, Ordering::SeqCst);
            {
                let mut state = state.write().await;
                if *state == ConnectionState::Connected {
                    *state = ConnectionState::Disconnected;
                }
            }
            // wake every waiter; their receivers observe a closed channel
            lock_pending(&pending_commands).clear();
            debug!("Message loop task exited");
        });

        Ok(())
    }

    /// Read messages until the socket closes
    async fn message_loop(
        mut stream: SplitStream<WsStream>,
        sink: Arc<Mutex<Option<SplitSink<WsStream, Message>>>>,
        pending_commands: &PendingMap,
    ) -> Result<(), Error> {
        while let Some(message) = stream.next().await {
            let message =
                message.map_err(|e| Error::websocket(format!("WebSocket error: {}", e)))?;

            match message {
                Message::Text(text) => Self::handle_message(&text, pending_commands).await,
                Message::Ping(data) => {
                    if let Some(sink) = sink.lock().await.as_mut() {
                        if let Err(e) = sink.send(Message::Pong(data)).await {
                            warn!("Failed to send pong: {}", e);
                        }
                    }
                }
                Message::Close(_) => {
                    info!("WebSocket close frame received");
                    break;
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Handle incoming WebSocket message
    async fn handle_message(text: &str, pending_commands: &PendingMap) {
        if let Ok(response) = serde_json::from_str::<CdpRpcResponse>(text) {
            Self::handle_response(response, pending_commands).await;
            return;
        }

        // Events are not subscribed to; the capture path polls page state instead
        if let Ok(notification) = serde_json::from_str::<CdpNotification>(text) {
            debug!("Ignoring CDP event: {}", notification.method);
            return;
        }

        warn!("Unknown message format: {}", text);
    }

    /// Handle CDP response
    async fn handle_response(response: CdpRpcResponse, pending_commands: &PendingMap) {
        let Some(pending_cmd) = lock_pending(pending_commands).remove(&response.id) else {
            // the waiter gave up (timeout) and its reply is discarded
            debug!("Dropping response for unknown command ID: {}", response.id);
            return;
        };

        debug!("Received response for command {}: {}", response.id, pending_cmd.method);

        let cdp_response = CdpResponse {
            id: response.id,
            result: Some(response.result),
            error: response.error.map(|e| CdpErrorResponse {
                code: e.code,
                message: e.message,
                data: e.data,
            }),
        };

        let _ = pending_cmd.sender.send(cdp_response);
    }

    /// Send WebSocket message
    async fn send_message(&self, message: Message) -> Result<(), Error> {
        let mut sink_guard = self.sink.lock().await;
        let sink = sink_guard
            .as_mut()
            .ok_or_else(|| Error::websocket("WebSocket stream not available"))?;

        sink.send(message)
            .await
            .map_err(|e| Error::websocket(format!("Failed to send message: {}", e)))
    }
}

#[async_trait]
impl CdpConnection for CdpWebSocketConnection {
    /// Send a CDP command and wait for response
    async fn send_command(&self, method: &str, params: serde_json::Value) -> Result<CdpResponse, Error> {
        if !self.is_active.load(Ordering::SeqCst) {
            return Err(Error::websocket("Connection is not active"));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        let request = CdpRequest {
            id,
            method: method.to_string(),
            params: if params.is_null() { None } else { Some(params) },
        };

        let json = serde_json::to_string(&request)?;

        debug!("Sending CDP command {}: {}", id, method);

        let (sender, receiver) = oneshot::channel();
        lock_pending(&self.pending_commands).insert(
            id,
            PendingCommand {
                sender,
                method: method.to_string(),
            },
        );
        let _pending = PendingGuard {
            id,
            pending: &self.pending_commands,
        };

        self.send_message(Message::Text(json)).await?;

        let timeout_duration = self.timeout_config.get_timeout_for_command(method);

        match tokio::time::timeout(timeout_duration, receiver).await {
            Ok(Ok(response)) => {
                if let Some(error) = &response.error {
                    return Err(Error::cdp(format!(
                        "{}: {} (code: {})",
                        method, error.message, error.code
                    )));
                }
                Ok(response)
            }
            Ok(Err(_)) => Err(Error::websocket(format!(
                "Connection closed before command {} ({}) was answered",
                id, method
            ))),
            Err(_) => Err(Error::timeout(format!("Command {} ({}) timed out", id, method))),
        }
    }

    /// Close the connection
    async fn close(&self) -> Result<(), Error> {
        info!("Closing CDP WebSocket connection");

        self.is_active.store(false, Ordering::SeqCst);

        if let Some(mut sink) = self.sink.lock().await.take() {
            sink.close()
                .await
                .map_err(|e| Error::websocket(format!("Failed to close WebSocket: {}", e)))?;
        }

        *self.state.write().await = ConnectionState::Closed;

        Ok(())
    }

    /// Check if connection is active
    fn is_active(&self) -> bool {
        self.is_active.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state_transitions() {
        let state = Arc::new(RwLock::new(ConnectionState::Disconnected));

        {
            let mut s = state.blocking_write();
            *s = ConnectionState::Connecting;
        }

        {
            let s = state.blocking_read();
            assert_eq!(*s, ConnectionState::Connecting);
        }
    }

    #[test]
    fn test_screenshot_gets_the_longest_timeout() {
        let config = CdpTimeoutConfig::default();
        let screenshot = config.get_timeout_for_command("Page.captureScreenshot");
        let evaluate = config.get_timeout_for_command("Runtime.evaluate");
        let other = config.get_timeout_for_command("Page.enable");

        assert_eq!(screenshot.as_secs(), 90);
        assert_eq!(evaluate.as_secs(), 30);
        assert_eq!(other.as_secs(), 30);
        assert!(config.get_timeout_for_command("Page.navigate") > evaluate);
    }

    #[tokio::test]
    async fn test_unknown_response_is_dropped() {
        let pending: PendingMap = Arc::new(StdMutex::new(HashMap::new()));
        let (sender, mut receiver) = oneshot::channel();
        lock_pending(&pending).insert(
            1,
            PendingCommand {
                sender,
                method: "Runtime.evaluate".to_string(),
            },
        );

        CdpWebSocketConnection::handle_message(r#"{"id": 2, "result": {}}"#, &pending).await;
        assert!(receiver.try_recv().is_err());
        assert_eq!(lock_pending(&pending).len(), 1);

        CdpWebSocketConnection::handle_message(
            r#"{"id": 1, "result": {"result": {"type": "number", "value": 3}}}"#,
            &pending,
        )
        .await;
        let response = receiver.try_recv().unwrap();
        assert_eq!(response.id, 1);
        assert!(lock_pending(&pending).is_empty());
    }

    #[tokio::test]
    async fn test_events_do_not_resolve_waiters() {
        let pending: PendingMap = Arc::new(StdMutex::new(HashMap::new()));
        CdpWebSocketConnection::handle_message(
            r#"{"method": "Page.loadEventFired", "params": {"timestamp": 1.0}}"#,
            &pending,
        )
        .await;
        assert!(lock_pending(&pending).is_empty());
    }

    #[test]
    fn test_abandoned_command_leaves_no_entry() {
        let pending: PendingMap = Arc::new(StdMutex::new(HashMap::new()));
        let (sender, receiver) = oneshot::channel();
        lock_pending(&pending).insert(
            7,
            PendingCommand {
                sender,
                method: "Page.captureScreenshot".to_string(),
            },
        );

        let guard = PendingGuard {
            id: 7,
            pending: &pending,
        };
        assert_eq!(lock_pending(&pending).len(), 1);

        drop(guard);
        drop(receiver);
        assert!(lock_pending(&pending).is_empty());
    }
}
