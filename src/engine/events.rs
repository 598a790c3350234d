// src/engine/events.rs

//! Normalized event records handed to sinks.
//!
//! Every event is plain owned data that serialises to one flat JSON
//! object: `type`, `event`, `eventGeneratedTimestamp`, then the
//! type-specific fields.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Serialize, Serializer};

/// UTC, millisecond precision, `Z` suffix.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3fZ";

pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Format epoch milliseconds; `None` if out of chrono's range.
pub fn format_epoch_millis(millis: i64) -> Option<String> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|at| format_timestamp(&at))
}

fn serialize_timestamp<S: Serializer>(at: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_timestamp(at))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedEvent {
    #[serde(flatten)]
    pub payload: EventPayload,

    #[serde(serialize_with = "serialize_timestamp")]
    pub event_generated_timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EventPayload {
    Job(JobEvent),
    Pipeline(PipelineEvent),
    Stage(StageEvent),
}

impl NormalizedEvent {
    pub fn new(payload: EventPayload, at: DateTime<Utc>) -> Self {
        Self {
            payload,
            event_generated_timestamp: at,
        }
    }

    /// `job`, `pipeline` or `stage`.
    pub fn type_name(&self) -> &'static str {
        match self.payload {
            EventPayload::Job(_) => "job",
            EventPayload::Pipeline(_) => "pipeline",
            EventPayload::Stage(_) => "stage",
        }
    }

    /// Phase name as rendered in the `event` field.
    pub fn event_name(&self) -> &'static str {
        match &self.payload {
            EventPayload::Job(job) => job.event.as_str(),
            EventPayload::Pipeline(pipeline) => pipeline.event.as_str(),
            EventPayload::Stage(stage) => stage.event.as_str(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/* ---------------- job ---------------- */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobPhase {
    Started,
    Completed,
}

impl JobPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobPhase::Started => "started",
            JobPhase::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobEvent {
    pub event: JobPhase,
    #[serde(flatten)]
    pub run: RunRecord,
}

/// Snapshot of one job run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub id: String,
    pub number: u64,
    pub display_name: String,
    pub full_display_name: String,
    /// `None` until the run has completed.
    pub result: Option<String>,
    #[serde(rename = "duration")]
    pub duration_millis: u64,
    #[serde(rename = "startTimeInMillis")]
    pub start_time_millis: i64,
    pub start_timestamp: Option<String>,
    pub url: Option<String>,
    pub job: Option<JobInfo>,
}

/// Parent job of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInfo {
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub url: Option<String>,
}

/* ---------------- pipeline ---------------- */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
pub enum PipelinePhase {
    Created,
    Running,
    Resumed,
    Completed,
}

impl PipelinePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelinePhase::Created => "Created",
            PipelinePhase::Running => "Running",
            PipelinePhase::Resumed => "Resumed",
            PipelinePhase::Completed => "Completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineEvent {
    pub event: PipelinePhase,
    pub execution_ref: String,
    pub is_complete: bool,
}

/* ---------------- stage ---------------- */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StagePhase {
    Start,
    End,
}

impl StagePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            StagePhase::Start => "start",
            StagePhase::End => "end",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageEvent {
    pub event: StagePhase,
    pub execution_ref: String,
    pub stage_name: String,
    pub start_node_id: String,
    pub end_node_id: Option<String>,
    pub enclosing_id: Option<String>,
    pub duration_millis: Option<u64>,
    pub error: Option<String>,
    /// Closed because the execution ended, not by a block end node.
    pub forced: bool,
}
