// src/engine/stage.rs

//! Stage boundary correlation for a single execution.
//!
//! Block start nodes open a [`StageRecord`] keyed by the start node's id.
//! A block end node closes exactly the record its `startNodeId` names, so
//! nesting and interleaved siblings need no depth tracking.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;

use crate::engine::events::{StageEvent, StagePhase};
use crate::engine::metadata::{label_name, stage_name};
use crate::engine::node::{Node, NodeKind};
use crate::execution_id::ExecutionId;

/// Which node's labels name a closed stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageNamePolicy {
    /// End node labels win; the start name is reused when the end node has none.
    #[default]
    PreferEnd,
    /// Always the name recorded when the stage opened.
    PreferStart,
}

/// An open stage awaiting its block end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRecord {
    pub stage_name: String,
    pub start_node_id: String,
    pub end_node_id: Option<String>,
    pub enclosing_id: Option<String>,
    pub opened_at: DateTime<Utc>,
}

/// What a single `observe` call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    Opened(StageEvent),
    Closed(StageEvent),
    /// Block end whose start was never seen.
    Unmatched { start_node_id: String },
    Ignored,
}

impl Observation {
    pub fn into_event(self) -> Option<StageEvent> {
        match self {
            Observation::Opened(event) | Observation::Closed(event) => Some(event),
            Observation::Unmatched { .. } | Observation::Ignored => None,
        }
    }
}

#[derive(Debug)]
pub struct StageCorrelator {
    execution: ExecutionId,
    policy: StageNamePolicy,
    open: HashMap<String, StageRecord>,
}

impl StageCorrelator {
    pub fn new(execution: ExecutionId, policy: StageNamePolicy) -> Self {
        Self {
            execution,
            policy,
            open: HashMap::new(),
        }
    }

    pub fn execution(&self) -> &ExecutionId {
        &self.execution
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    pub fn is_open(&self, start_node_id: &str) -> bool {
        self.open.contains_key(start_node_id)
    }

    pub fn observe(&mut self, node: &Node, now: DateTime<Utc>) -> Observation {
        match &node.kind {
            NodeKind::BlockStart => self.open_stage(node, now),
            NodeKind::BlockEnd { start_node_id } => self.close_stage(node, start_node_id, now),
            NodeKind::Other => Observation::Ignored,
        }
    }

    fn open_stage(&mut self, node: &Node, now: DateTime<Utc>) -> Observation {
        let record = StageRecord {
            stage_name: stage_name(node),
            start_node_id: node.id.clone(),
            end_node_id: None,
            enclosing_id: node.enclosing_id.clone(),
            opened_at: now,
        };

        let event = StageEvent {
            event: StagePhase::Start,
            execution_ref: self.execution.to_string(),
            stage_name: record.stage_name.clone(),
            start_node_id: record.start_node_id.clone(),
            end_node_id: None,
            enclosing_id: record.enclosing_id.clone(),
            duration_millis: None,
            error: None,
            forced: false,
        };

        // A repeated start id replaces the stale record; the engine never reuses ids.
        self.open.insert(node.id.clone(), record);
        Observation::Opened(event)
    }

    fn close_stage(&mut self, node: &Node, start_node_id: &str, now: DateTime<Utc>) -> Observation {
        let Some(mut record) = self.open.remove(start_node_id) else {
            return Observation::Unmatched {
                start_node_id: start_node_id.to_string(),
            };
        };

        if self.policy == StageNamePolicy::PreferEnd {
            if let Some(name) = label_name(node) {
                record.stage_name = name;
            }
        }
        record.end_node_id = Some(node.id.clone());

        Observation::Closed(end_event(&self.execution, record, now, node.error.clone(), false))
    }

    /// Force-close every open stage, oldest first. Leaves the correlator empty.
    pub fn drain_orphans(&mut self, now: DateTime<Utc>) -> Vec<StageEvent> {
        let mut orphans: Vec<StageRecord> = self.open.drain().map(|(_, record)| record).collect();
        orphans.sort_by(|a, b| {
            a.opened_at
                .cmp(&b.opened_at)
                .then_with(|| a.start_node_id.cmp(&b.start_node_id))
        });

        orphans
            .into_iter()
            .map(|record| end_event(&self.execution, record, now, None, true))
            .collect()
    }
}

fn end_event(
    execution: &ExecutionId,
    record: StageRecord,
    now: DateTime<Utc>,
    error: Option<String>,
    forced: bool,
) -> StageEvent {
    let elapsed = (now - record.opened_at).num_milliseconds().max(0) as u64;

    StageEvent {
        event: StagePhase::End,
        execution_ref: execution.to_string(),
        stage_name: record.stage_name,
        start_node_id: record.start_node_id,
        end_node_id: record.end_node_id,
        enclosing_id: record.enclosing_id,
        duration_millis: Some(elapsed),
        error,
        forced,
    }
}
