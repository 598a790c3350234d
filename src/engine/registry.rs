// src/engine/registry.rs

//! Process-wide map from execution to its stage correlator.
//!
//! The host serialises callbacks within one execution but may call in
//! concurrently for different executions, so only this outer map is shared.
//! State is created by the first block start and disposed when the
//! execution completes. Nodes arriving for an execution with no state never
//! recreate it.

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::engine::events::StageEvent;
use crate::engine::node::{Node, NodeKind};
use crate::engine::stage::{Observation, StageCorrelator, StageNamePolicy};
use crate::execution_id::ExecutionId;

#[derive(Debug, Default)]
pub struct ExecutionRegistry {
    policy: StageNamePolicy,
    executions: DashMap<ExecutionId, StageCorrelator>,
}

impl ExecutionRegistry {
    pub fn new(policy: StageNamePolicy) -> Self {
        Self {
            policy,
            executions: DashMap::new(),
        }
    }

    pub fn observe(&self, execution: &ExecutionId, node: &Node, now: DateTime<Utc>) -> Observation {
        if node.kind == NodeKind::BlockStart {
            let mut correlator = self
                .executions
                .entry(execution.clone())
                .or_insert_with(|| StageCorrelator::new(execution.clone(), self.policy));
            return correlator.observe(node, now);
        }

        match self.executions.get_mut(execution) {
            Some(mut correlator) => correlator.observe(node, now),
            None => match &node.kind {
                NodeKind::BlockEnd { start_node_id } => Observation::Unmatched {
                    start_node_id: start_node_id.clone(),
                },
                _ => Observation::Ignored,
            },
        }
    }

    /// Dispose of an execution's state, returning its still-open stages as
    /// forced end events.
    pub fn complete(&self, execution: &ExecutionId, now: DateTime<Utc>) -> Vec<StageEvent> {
        match self.executions.remove(execution) {
            Some((_, mut correlator)) => correlator.drain_orphans(now),
            None => Vec::new(),
        }
    }

    /// Dispose of every tracked execution.
    pub fn drain_all(&self, now: DateTime<Utc>) -> Vec<StageEvent> {
        let ids: Vec<ExecutionId> = self.executions.iter().map(|e| e.key().clone()).collect();

        ids.iter()
            .flat_map(|id| self.complete(id, now))
            .collect()
    }

    pub fn tracked(&self) -> usize {
        self.executions.len()
    }

    pub fn open_stages(&self, execution: &ExecutionId) -> usize {
        self.executions
            .get(execution)
            .map(|c| c.open_count())
            .unwrap_or(0)
    }
}
