use crate::engine::events::NormalizedEvent;
use crate::engine::sink::EventSink;
use crate::error::SinkError;

/// Writes each event's JSON through `tracing` at info level.
#[derive(Debug, Default, Clone)]
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn emit(&self, event: &NormalizedEvent) -> Result<(), SinkError> {
        let json = event.to_json()?;
        tracing::info!(target: "stagewatch::events", kind = event.type_name(), "{}", json);
        Ok(())
    }
}
