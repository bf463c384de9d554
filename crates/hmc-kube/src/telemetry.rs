//! Anonymous usage telemetry
//!
//! Telemetry is an injected, optional sink. A [`Telemetry`] without a sink is
//! fully functional and drops every event.

use async_trait::async_trait;
use hmc_core::TelemetryConfig;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::info;
use url::Url;

use crate::error::{KubeError, Result};

/// Event emitted after a Management converged
pub const MANAGEMENT_RECONCILE_EVENT: &str = "management-reconcile";

/// Destination for telemetry events
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn emit(
        &self,
        event: &str,
        anonymous_id: &str,
        properties: &Map<String, Value>,
    ) -> Result<()>;
}

/// Sink that accepts and drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

#[async_trait]
impl TelemetrySink for NoopSink {
    async fn emit(&self, _: &str, _: &str, _: &Map<String, Value>) -> Result<()> {
        Ok(())
    }
}

/// Sink that writes events to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl TelemetrySink for LogSink {
    async fn emit(
        &self,
        event: &str,
        anonymous_id: &str,
        properties: &Map<String, Value>,
    ) -> Result<()> {
        info!(
            event,
            anonymous_id,
            properties = %serde_json::Value::Object(properties.clone()),
            "telemetry event"
        );
        Ok(())
    }
}

/// Sink posting events to the Segment tracking API
pub struct SegmentSink {
    client: reqwest::Client,
    endpoint: Url,
    write_key: String,
}

impl SegmentSink {
    pub fn new(endpoint: Url, write_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            write_key: write_key.into(),
        }
    }
}

#[async_trait]
impl TelemetrySink for SegmentSink {
    async fn emit(
        &self,
        event: &str,
        anonymous_id: &str,
        properties: &Map<String, Value>,
    ) -> Result<()> {
        let body = json!({
            "anonymousId": anonymous_id,
            "event": event,
            "properties": properties,
        });

        let response = self
            .client
            .post(self.endpoint.clone())
            .basic_auth(&self.write_key, Some(""))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(KubeError::Telemetry(format!(
                "segment returned {} for event '{}'",
                response.status(),
                event
            )));
        }
        Ok(())
    }
}

/// Optional telemetry sink handle
#[derive(Clone, Default)]
pub struct Telemetry {
    sink: Option<Arc<dyn TelemetrySink>>,
}

impl Telemetry {
    /// Telemetry that drops every event
    pub fn disabled() -> Self {
        Self { sink: None }
    }

    pub fn new(sink: Arc<dyn TelemetrySink>) -> Self {
        Self { sink: Some(sink) }
    }

    /// Build from operator configuration
    ///
    /// Disabled telemetry has no sink; enabled telemetry posts to Segment.
    pub fn from_config(config: &TelemetryConfig) -> Result<Self> {
        if !config.enabled {
            return Ok(Self::disabled());
        }
        let write_key = config.write_key.clone().ok_or_else(|| {
            KubeError::InvalidConfig("telemetry.writeKey is required".to_string())
        })?;
        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            KubeError::InvalidConfig(format!(
                "invalid telemetry endpoint '{}': {}",
                config.endpoint, e
            ))
        })?;
        Ok(Self::new(Arc::new(SegmentSink::new(endpoint, write_key))))
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Emit an event, tagged with the controller version
    pub async fn track(
        &self,
        event: &str,
        anonymous_id: &str,
        mut properties: Map<String, Value>,
    ) -> Result<()> {
        let Some(sink) = &self.sink else {
            return Ok(());
        };
        properties.insert(
            "hmcVersion".to_string(),
            Value::String(env!("CARGO_PKG_VERSION").to_string()),
        );
        sink.emit(event, anonymous_id, &properties).await
    }
}
