use crate::engine::events::NormalizedEvent;
use crate::error::SinkError;

/// Outbound seam for normalized events.
///
/// Called synchronously from host callback threads; implementations must
/// not block on delivery.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &NormalizedEvent) -> Result<(), SinkError>;
}
