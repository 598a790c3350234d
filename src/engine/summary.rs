use serde::Serialize;
use std::collections::BTreeMap;

use crate::engine::events::{EventPayload, NormalizedEvent};

/// What a replay produced, printed as JSON at the end of `replay`.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct ReplaySummary {
    pub ok: bool,
    pub notifications: u64,
    /// Lines that could not be parsed, as `line N: reason`.
    pub skipped: Vec<String>,
    /// Event counts keyed by `type/event`.
    pub events: BTreeMap<String, u64>,
    pub forced_stage_ends: u64,
}

impl ReplaySummary {
    pub fn new(notifications: u64, skipped: Vec<String>, events: &[NormalizedEvent]) -> Self {
        let mut counts = BTreeMap::new();
        let mut forced = 0;

        for event in events {
            let key = format!("{}/{}", event.type_name(), event.event_name());
            *counts.entry(key).or_insert(0) += 1;

            if let EventPayload::Stage(stage) = &event.payload {
                if stage.forced {
                    forced += 1;
                }
            }
        }

        Self {
            ok: skipped.is_empty(),
            notifications,
            skipped,
            events: counts,
            forced_stage_ends: forced,
        }
    }
}
