//! CDP client implementation
//!
//! This module provides a high-level CDP client with typed methods for common operations.

use super::traits::*;
use super::types::*;
use crate::page::scripts::READY_STATE_SCRIPT;
use crate::Error;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::sync::Arc;
use tracing::{debug, info};

/// How many times `navigate` polls `document.readyState`
const READY_STATE_ATTEMPTS: u32 = 50;
/// Pause between `document.readyState` polls
const READY_STATE_INTERVAL_MS: u64 = 100;

/// CDP client implementation
#[derive(Debug, Clone)]
pub struct CdpClientImpl {
    /// Underlying CDP connection
    connection: Arc<dyn CdpConnection>,
}

impl CdpClientImpl {
    /// Create a new CDP client
    ///
    /// # Arguments
    /// * `connection` - CDP connection instance
    pub fn new(connection: Arc<dyn CdpConnection>) -> Self {
        debug!("Creating CDP client");
        Self { connection }
    }

    /// Parse remote object value to evaluation result
    fn parse_remote_object(obj: &RemoteObject) -> EvaluationResult {
        match obj.r#type.as_str() {
            "string" => EvaluationResult::String(
                obj.value
                    .as_ref()
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string(),
            ),
            "number" => EvaluationResult::Number(
                obj.value.as_ref().and_then(|v| v.as_f64()).unwrap_or(0.0),
            ),
            "boolean" => EvaluationResult::Bool(
                obj.value.as_ref().and_then(|v| v.as_bool()).unwrap_or(false),
            ),
            "object" if obj.subtype.as_deref() == Some("null") => EvaluationResult::Null,
            "object" => EvaluationResult::Object(obj.value.clone().unwrap_or(serde_json::Value::Null)),
            _ => {
                debug!("parse_remote_object: type '{}' mapped to Null", obj.r#type);
                EvaluationResult::Null
            }
        }
    }

    /// Extract the message of a `Runtime.evaluate` exception
    fn exception_message(details: &serde_json::Value) -> String {
        details
            .get("exception")
            .and_then(|e| e.get("description"))
            .and_then(|d| d.as_str())
            .or_else(|| details.get("text").and_then(|t| t.as_str()))
            .unwrap_or("Unknown error")
            .to_string()
    }
}

#[async_trait]
impl CdpClient for CdpClientImpl {
    fn connection(&self) -> Arc<dyn CdpConnection> {
        Arc::clone(&self.connection)
    }

    /// Navigate to a URL
    async fn navigate(&self, url: &str) -> Result<NavigationResult, Error> {
        info!("Navigating to {}", url);

        let params = NavigateParams {
            url: url.to_string(),
        };
        let result = self
            .call_method("Page.navigate", serde_json::to_value(params)?)
            .await?;

        if let Some(error_text) = result.get("errorText").and_then(|v| v.as_str()) {
            return Err(Error::cdp(format!("Navigation to {} failed: {}", url, error_text)));
        }

        // Polling readyState avoids racing the load event against the subscription
        let mut loaded = false;
        for attempt in 0..READY_STATE_ATTEMPTS {
            tokio::time::sleep(tokio::time::Duration::from_millis(READY_STATE_INTERVAL_MS)).await;

            match self.evaluate(READY_STATE_SCRIPT, false).await {
                Ok(EvaluationResult::String(state)) if state == "complete" => {
                    debug!("Page loaded on attempt {}", attempt + 1);
                    loaded = true;
                    break;
                }
                Ok(other) => debug!("Document ready state on attempt {}: {:?}", attempt + 1, other),
                Err(e) => debug!("Error checking ready state on attempt {}: {}", attempt + 1, e),
            }
        }

        if !loaded {
            info!("Page load polling timeout - continuing anyway");
        }

        Ok(NavigationResult {
            frame_id: result
                .get("frameId")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
            url: url.to_string(),
            loaded,
        })
    }

    /// Evaluate JavaScript in the page
    async fn evaluate(&self, script: &str, await_promise: bool) -> Result<EvaluationResult, Error> {
        debug!("Evaluating script: {}", script);

        let params = EvaluateParams {
            expression: script.to_string(),
            await_promise: Some(await_promise),
            return_by_value: Some(true),
        };

        let result = self
            .call_method("Runtime.evaluate", serde_json::to_value(params)?)
            .await?;

        if let Some(exception) = result.get("exceptionDetails") {
            return Err(Error::cdp(format!(
                "Script execution failed: {}",
                Self::exception_message(exception)
            )));
        }

        // CDP response structure: {"result": {"type": ..., "value": ...}}
        let eval_response: EvaluateResponse = serde_json::from_value(result)?;
        Ok(Self::parse_remote_object(&eval_response.result))
    }

    /// Capture the visible viewport
    async fn screenshot(&self, format: ScreenshotFormat) -> Result<Vec<u8>, Error> {
        let (format, quality) = match format {
            ScreenshotFormat::Png => ("png".to_string(), None),
            ScreenshotFormat::Jpeg(q) => ("jpeg".to_string(), Some(q.min(100))),
        };

        let params = ScreenshotParams {
            format,
            quality,
            from_surface: true,
            capture_beyond_viewport: false,
        };

        let result = self
            .call_method("Page.captureScreenshot", serde_json::to_value(params)?)
            .await?;

        let data = result
            .get("data")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::cdp("No data in screenshot result"))?;

        BASE64
            .decode(data)
            .map_err(|e| Error::cdp(format!("Failed to decode screenshot: {}", e)))
    }

    /// Enable a domain
    async fn enable_domain(&self, domain: &str) -> Result<(), Error> {
        debug!("Enabling domain: {}", domain);

        let method = format!("{}.enable", domain);
        self.call_method(&method, serde_json::json!({})).await?;

        Ok(())
    }

    /// Call a raw CDP method
    async fn call_method(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value, Error> {
        let response = self.connection.send_command(method, params).await?;

        if let Some(error) = response.error {
            return Err(Error::cdp(format!("{}: {} (code: {})", method, error.message, error.code)));
        }

        response.result.ok_or_else(|| Error::cdp("No result in response"))
    }
}
