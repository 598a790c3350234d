// src/engine/pipeline.rs

//! Pipeline-execution normalization, one function per lifecycle phase.
//! Stateless: each call is one snapshot.

use chrono::{DateTime, Utc};

use crate::engine::events::{EventPayload, NormalizedEvent, PipelineEvent, PipelinePhase};
use crate::execution_id::ExecutionId;

fn snapshot(
    execution: &ExecutionId,
    phase: PipelinePhase,
    is_complete: bool,
    now: DateTime<Utc>,
) -> NormalizedEvent {
    NormalizedEvent::new(
        EventPayload::Pipeline(PipelineEvent {
            event: phase,
            execution_ref: execution.to_string(),
            is_complete,
        }),
        now,
    )
}

pub fn created(execution: &ExecutionId, is_complete: bool, now: DateTime<Utc>) -> NormalizedEvent {
    snapshot(execution, PipelinePhase::Created, is_complete, now)
}

pub fn running(execution: &ExecutionId, is_complete: bool, now: DateTime<Utc>) -> NormalizedEvent {
    snapshot(execution, PipelinePhase::Running, is_complete, now)
}

pub fn resumed(execution: &ExecutionId, is_complete: bool, now: DateTime<Utc>) -> NormalizedEvent {
    snapshot(execution, PipelinePhase::Resumed, is_complete, now)
}

pub fn completed(execution: &ExecutionId, is_complete: bool, now: DateTime<Utc>) -> NormalizedEvent {
    snapshot(execution, PipelinePhase::Completed, is_complete, now)
}
