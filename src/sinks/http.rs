// src/sinks/http.rs

//! Fire-and-forget HTTP delivery.
//!
//! `emit` only serialises and enqueues; a background task POSTs each event
//! in order. Failed deliveries are logged and dropped, never retried. The
//! queue is bounded: when the endpoint stalls and it fills up, new events
//! are dropped and `emit` reports [`SinkError::QueueFull`].

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::engine::events::NormalizedEvent;
use crate::engine::sink::EventSink;
use crate::error::SinkError;

#[derive(Debug, Clone)]
pub struct HttpEventSink {
    sender: mpsc::Sender<Value>,
}

impl HttpEventSink {
    /// Start the delivery task on the current tokio runtime.
    ///
    /// The task exits once every clone of the sink has been dropped and the
    /// queue is drained.
    pub fn spawn(
        url: &str,
        headers: &BTreeMap<String, String>,
        timeout: Duration,
        queue_capacity: usize,
    ) -> Result<(Self, JoinHandle<()>)> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(build_headers(headers)?)
            .build()
            .context("Failed to build HTTP client")?;

        let (sender, receiver) = mpsc::channel(queue_capacity.max(1));
        let handle = tokio::spawn(deliver(client, url.to_string(), receiver));

        Ok((Self { sender }, handle))
    }
}

impl EventSink for HttpEventSink {
    fn emit(&self, event: &NormalizedEvent) -> Result<(), SinkError> {
        let body = serde_json::to_value(event)?;
        self.sender.try_send(body).map_err(|e| match e {
            TrySendError::Full(_) => SinkError::QueueFull,
            TrySendError::Closed(_) => SinkError::Closed,
        })
    }
}

async fn deliver(client: reqwest::Client, url: String, mut receiver: mpsc::Receiver<Value>) {
    while let Some(body) = receiver.recv().await {
        match client.post(&url).json(&body).send().await {
            Ok(res) if res.status().is_success() => {
                tracing::debug!(url = %url, status = res.status().as_u16(), "event delivered");
            }
            Ok(res) => {
                tracing::warn!(url = %url, status = res.status().as_u16(), "event rejected by endpoint");
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "event delivery failed");
            }
        }
    }

    tracing::debug!(url = %url, "http sink drained");
}

fn build_headers(headers: &BTreeMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    map.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .with_context(|| format!("Invalid header name: {}", name))?;
        let value = HeaderValue::from_str(value)
            .with_context(|| format!("Invalid value for header {}", name))?;
        map.insert(name, value);
    }

    Ok(map)
}
