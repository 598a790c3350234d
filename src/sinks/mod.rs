//! Event emitter implementations.

pub mod collecting;
pub mod file;
pub mod http;
pub mod log;
pub mod stdout;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::config::{SinkConfig, SinkKind};
use crate::engine::events::NormalizedEvent;
use crate::engine::sink::EventSink;
use crate::error::SinkError;

/// Forwards each event to every inner sink.
///
/// A failing sink does not stop delivery to the rest; the first error is
/// returned after all sinks have been tried.
pub struct FanoutEventSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutEventSink {
    pub fn new(sinks: Vec<Arc<dyn EventSink>>) -> Self {
        Self { sinks }
    }
}

impl EventSink for FanoutEventSink {
    fn emit(&self, event: &NormalizedEvent) -> Result<(), SinkError> {
        let mut first_error = None;

        for sink in &self.sinks {
            if let Err(e) = sink.emit(event) {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Sinks built from config plus the background tasks some of them own.
pub struct BuiltSinks {
    pub sink: Arc<dyn EventSink>,
    pub workers: Vec<JoinHandle<()>>,
}

impl BuiltSinks {
    /// Drop the sink and wait for background deliveries to drain.
    ///
    /// Every other clone of the sink must already be dropped.
    pub async fn shutdown(self) {
        drop(self.sink);
        for worker in self.workers {
            if let Err(e) = worker.await {
                tracing::warn!(error = %e, "sink worker ended abnormally");
            }
        }
    }
}

/// Build the configured sinks. Must run inside a tokio runtime when an
/// `http` sink is configured.
pub fn build(configs: &[SinkConfig]) -> Result<BuiltSinks> {
    let mut sinks: Vec<Arc<dyn EventSink>> = Vec::new();
    let mut workers = Vec::new();

    for cfg in configs {
        match cfg.kind {
            SinkKind::Log => sinks.push(Arc::new(log::LogEventSink)),
            SinkKind::Stdout => sinks.push(Arc::new(stdout::StdoutEventSink)),
            SinkKind::File => {
                let path = cfg
                    .path
                    .as_deref()
                    .context("sinks[].path must be set when kind = file")?;
                sinks.push(Arc::new(file::FileEventSink::open(Path::new(path))?));
            }
            SinkKind::Http => {
                let url = cfg
                    .url
                    .as_deref()
                    .context("sinks[].url must be set when kind = http")?;
                let (sink, worker) = http::HttpEventSink::spawn(
                    url,
                    &cfg.headers,
                    Duration::from_millis(cfg.timeout_ms),
                    cfg.queue_capacity,
                )?;
                sinks.push(Arc::new(sink));
                workers.push(worker);
            }
        }
    }

    let sink: Arc<dyn EventSink> = if sinks.len() == 1 {
        sinks.remove(0)
    } else {
        Arc::new(FanoutEventSink::new(sinks))
    };

    Ok(BuiltSinks { sink, workers })
}
