// src/notification.rs

//! Inbound notification wire format shared by `replay` and the ingest server.
//!
//! One JSON object per notification, tagged by `kind`:
//!
//! {"kind":"node","executionId":"app#1","node":{"id":"3","kind":"blockStart",...}}
//! {"kind":"runStarted","run":{"id":"1","number":1,"startTimeInMillis":1000}}
//! {"kind":"runCompleted","run":{...,"result":"SUCCESS","duration":500}}
//! {"kind":"pipeline","executionId":"app#1","phase":"Completed","isComplete":true}

use serde::Deserialize;

use crate::engine::events::PipelinePhase;
use crate::engine::node::Node;
use crate::engine::observer::EventObserver;
use crate::engine::run::RunNotification;
use crate::execution_id::ExecutionId;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Notification {
    #[serde(rename_all = "camelCase")]
    Node { execution_id: ExecutionId, node: Node },

    RunStarted { run: RunNotification },

    RunCompleted { run: RunNotification },

    #[serde(rename_all = "camelCase")]
    Pipeline {
        execution_id: ExecutionId,
        phase: PipelinePhase,
        #[serde(default)]
        is_complete: bool,
    },
}

/// Body of `POST /executions/{id}/pipeline`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineUpdate {
    pub phase: PipelinePhase,
    #[serde(default)]
    pub is_complete: bool,
}

impl Notification {
    pub fn dispatch(&self, observer: &EventObserver) {
        match self {
            Notification::Node { execution_id, node } => observer.notify_node(execution_id, node),
            Notification::RunStarted { run } => observer.notify_run_started(run),
            Notification::RunCompleted { run } => observer.notify_run_completed(run),
            Notification::Pipeline {
                execution_id,
                phase,
                is_complete,
            } => observer.notify_pipeline(execution_id, *phase, *is_complete),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::node::NodeKind;

    #[test]
    fn parses_each_kind() {
        let lines = [
            r#"{"kind":"node","executionId":"app#1","node":{"id":"3","kind":"blockStart","metadata":[{"kind":"label","name":"Build"}]}}"#,
            r#"{"kind":"runStarted","run":{"id":"1","number":1,"startTimeInMillis":1000}}"#,
            r#"{"kind":"runCompleted","run":{"id":"1","number":1,"result":"SUCCESS","duration":500}}"#,
            r#"{"kind":"pipeline","executionId":"app#1","phase":"Completed","isComplete":true}"#,
        ];

        let parsed: Vec<Notification> = lines
            .iter()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        match &parsed[0] {
            Notification::Node { execution_id, node } => {
                assert_eq!(execution_id.as_str(), "app#1");
                assert_eq!(node.kind, NodeKind::BlockStart);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(&parsed[2], Notification::RunCompleted { run } if run.duration_millis == 500));
        match &parsed[3] {
            Notification::Pipeline {
                phase, is_complete, ..
            } => {
                assert_eq!(*phase, PipelinePhase::Completed);
                assert!(*is_complete);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_phase() {
        let raw = r#"{"kind":"pipeline","executionId":"x","phase":"Paused"}"#;

        assert!(serde_json::from_str::<Notification>(raw).is_err());
    }
}
