use std::io::Write;

use crate::engine::events::NormalizedEvent;
use crate::engine::sink::EventSink;
use crate::error::SinkError;

/// One compact JSON line per event on stdout.
#[derive(Debug, Default, Clone)]
pub struct StdoutEventSink;

impl EventSink for StdoutEventSink {
    fn emit(&self, event: &NormalizedEvent) -> Result<(), SinkError> {
        let json = event.to_json()?;
        let mut out = std::io::stdout().lock();
        writeln!(out, "{}", json)?;
        Ok(())
    }
}
