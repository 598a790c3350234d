// src/engine/observer.rs

//! Single entry point the host adapters call into.
//!
//! Every method is infallible from the caller's point of view: failures are
//! logged and dropped so nothing escapes into the host's callback thread.

use chrono::Utc;
use std::sync::Arc;

use crate::engine::events::{EventPayload, NormalizedEvent, PipelinePhase, StageEvent};
use crate::engine::node::Node;
use crate::engine::registry::ExecutionRegistry;
use crate::engine::run::{self, RunView};
use crate::engine::sink::EventSink;
use crate::engine::stage::{Observation, StageNamePolicy};
use crate::engine::pipeline;
use crate::execution_id::ExecutionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverOptions {
    pub name_policy: StageNamePolicy,
    /// Emit forced end events for stages still open when an execution completes.
    pub close_orphans: bool,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            name_policy: StageNamePolicy::PreferEnd,
            close_orphans: true,
        }
    }
}

pub struct EventObserver {
    registry: ExecutionRegistry,
    sink: Arc<dyn EventSink>,
    options: ObserverOptions,
}

impl EventObserver {
    pub fn new(sink: Arc<dyn EventSink>, options: ObserverOptions) -> Self {
        Self {
            registry: ExecutionRegistry::new(options.name_policy),
            sink,
            options,
        }
    }

    pub fn registry(&self) -> &ExecutionRegistry {
        &self.registry
    }

    pub fn notify_node(&self, execution: &ExecutionId, node: &Node) {
        tracing::debug!(
            execution = %execution,
            id = %node.id,
            kind = node.kind_name(),
            display_name = %node.display_name,
            function_name = %node.function_name,
            is_active = node.is_active,
            enclosing_id = node.enclosing_id.as_deref().unwrap_or(""),
            error = node.error.as_deref().unwrap_or(""),
            "node created"
        );

        let now = Utc::now();
        match self.registry.observe(execution, node, now) {
            Observation::Opened(stage) => {
                tracing::info!(execution = %execution, node = %node.id, "[Stage START] {}", stage.stage_name);
                self.emit_stage(stage, now);
            }
            Observation::Closed(stage) => {
                tracing::info!(execution = %execution, node = %node.id, "[Stage END] {}", stage.stage_name);
                self.emit_stage(stage, now);
            }
            Observation::Unmatched { start_node_id } => {
                tracing::debug!(
                    execution = %execution,
                    node = %node.id,
                    start_node = %start_node_id,
                    "block end without a tracked start, skipping"
                );
            }
            Observation::Ignored => {}
        }
    }

    pub fn notify_run_started(&self, run: &dyn RunView) {
        tracing::info!(run = %run.id(), number = run.number(), "job started");
        self.emit(&run::started(run, Utc::now()));
    }

    pub fn notify_run_completed(&self, run: &dyn RunView) {
        tracing::info!(
            run = %run.id(),
            number = run.number(),
            result = run.result().as_deref().unwrap_or(""),
            "job completed"
        );
        self.emit(&run::completed(run, Utc::now()));
    }

    pub fn notify_pipeline(&self, execution: &ExecutionId, phase: PipelinePhase, is_complete: bool) {
        tracing::info!(execution = %execution, phase = phase.as_str(), is_complete, "pipeline lifecycle");

        let now = Utc::now();
        let event = match phase {
            PipelinePhase::Created => pipeline::created(execution, is_complete, now),
            PipelinePhase::Running => pipeline::running(execution, is_complete, now),
            PipelinePhase::Resumed => pipeline::resumed(execution, is_complete, now),
            PipelinePhase::Completed => {
                let orphans = self.registry.complete(execution, now);
                self.emit_orphans(orphans, now);
                pipeline::completed(execution, is_complete, now)
            }
        };

        self.emit(&event);
    }

    /// Force-close every stage still open in any execution. Called on shutdown.
    pub fn flush(&self) {
        let now = Utc::now();
        let orphans = self.registry.drain_all(now);
        if !orphans.is_empty() {
            tracing::info!(count = orphans.len(), "flushing open stages");
        }
        self.emit_orphans(orphans, now);
    }

    fn emit_orphans(&self, orphans: Vec<StageEvent>, now: chrono::DateTime<Utc>) {
        if !self.options.close_orphans {
            if !orphans.is_empty() {
                tracing::debug!(count = orphans.len(), "dropping open stages");
            }
            return;
        }

        for stage in orphans {
            tracing::info!(execution = %stage.execution_ref, "[Stage END] {} (forced)", stage.stage_name);
            self.emit_stage(stage, now);
        }
    }

    fn emit_stage(&self, stage: StageEvent, now: chrono::DateTime<Utc>) {
        self.emit(&NormalizedEvent::new(EventPayload::Stage(stage), now));
    }

    fn emit(&self, event: &NormalizedEvent) {
        if let Err(e) = self.sink.emit(event) {
            tracing::warn!(
                kind = event.type_name(),
                event = event.event_name(),
                error = %e,
                "failed to emit event"
            );
        }
    }
}
