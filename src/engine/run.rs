// src/engine/run.rs

//! Job-run normalization.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::engine::events::{
    format_epoch_millis, EventPayload, JobEvent, JobInfo, JobPhase, NormalizedEvent, RunRecord,
};
use crate::error::LookupError;

/// Read access to a host run handle.
///
/// Core fields are infallible. `url` and `parent_job` are ancillary and
/// may fail; the normalizer emits them as `null` when they do.
pub trait RunView {
    fn id(&self) -> String;
    fn number(&self) -> u64;
    fn display_name(&self) -> String;
    fn full_display_name(&self) -> String;
    fn result(&self) -> Option<String>;
    fn duration_millis(&self) -> u64;
    fn start_time_millis(&self) -> i64;
    fn url(&self) -> Result<String, LookupError>;
    fn parent_job(&self) -> Result<JobInfo, LookupError>;
}

pub fn started(run: &dyn RunView, now: DateTime<Utc>) -> NormalizedEvent {
    let mut record = snapshot(run);
    record.result = None;
    record.duration_millis = 0;
    job_event(JobPhase::Started, record, now)
}

pub fn completed(run: &dyn RunView, now: DateTime<Utc>) -> NormalizedEvent {
    job_event(JobPhase::Completed, snapshot(run), now)
}

fn job_event(event: JobPhase, run: RunRecord, now: DateTime<Utc>) -> NormalizedEvent {
    NormalizedEvent::new(EventPayload::Job(JobEvent { event, run }), now)
}

/// Copy everything out of the live handle.
pub fn snapshot(run: &dyn RunView) -> RunRecord {
    let start_time_millis = run.start_time_millis();

    RunRecord {
        id: run.id(),
        number: run.number(),
        display_name: run.display_name(),
        full_display_name: run.full_display_name(),
        result: run.result(),
        duration_millis: run.duration_millis(),
        start_time_millis,
        start_timestamp: format_epoch_millis(start_time_millis),
        url: ancillary("url", &run.id(), run.url()),
        job: ancillary("parent job", &run.id(), run.parent_job()),
    }
}

fn ancillary<T>(what: &str, run_id: &str, lookup: Result<T, LookupError>) -> Option<T> {
    match lookup {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(run = run_id, error = %e, "could not read run {}", what);
            None
        }
    }
}

/// Run data as delivered over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunNotification {
    pub id: String,
    pub number: u64,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub full_display_name: String,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default, alias = "duration")]
    pub duration_millis: u64,
    #[serde(default, alias = "startTimeInMillis")]
    pub start_time_millis: i64,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub job: Option<JobInfo>,
}

impl RunView for RunNotification {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn number(&self) -> u64 {
        self.number
    }

    fn display_name(&self) -> String {
        if self.display_name.is_empty() {
            format!("#{}", self.number)
        } else {
            self.display_name.clone()
        }
    }

    fn full_display_name(&self) -> String {
        if self.full_display_name.is_empty() {
            self.display_name()
        } else {
            self.full_display_name.clone()
        }
    }

    fn result(&self) -> Option<String> {
        self.result.clone()
    }

    fn duration_millis(&self) -> u64 {
        self.duration_millis
    }

    fn start_time_millis(&self) -> i64 {
        self.start_time_millis
    }

    fn url(&self) -> Result<String, LookupError> {
        self.url.clone().ok_or(LookupError::Missing("url"))
    }

    fn parent_job(&self) -> Result<JobInfo, LookupError> {
        self.job.clone().ok_or(LookupError::Missing("parent job"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn run() -> RunNotification {
        RunNotification {
            id: "42".to_string(),
            number: 42,
            display_name: "#42".to_string(),
            full_display_name: "app » main #42".to_string(),
            result: None,
            duration_millis: 0,
            start_time_millis: 1000,
            url: Some("job/app/job/main/42/".to_string()),
            job: Some(JobInfo {
                name: "main".to_string(),
                full_name: "app/main".to_string(),
                url: None,
            }),
        }
    }

    struct BrokenRun;

    impl RunView for BrokenRun {
        fn id(&self) -> String {
            "7".to_string()
        }
        fn number(&self) -> u64 {
            7
        }
        fn display_name(&self) -> String {
            "#7".to_string()
        }
        fn full_display_name(&self) -> String {
            "broken #7".to_string()
        }
        fn result(&self) -> Option<String> {
            Some("FAILURE".to_string())
        }
        fn duration_millis(&self) -> u64 {
            12
        }
        fn start_time_millis(&self) -> i64 {
            0
        }
        fn url(&self) -> Result<String, LookupError> {
            Err(LookupError::Failed {
                field: "url",
                message: "root url not configured".to_string(),
            })
        }
        fn parent_job(&self) -> Result<JobInfo, LookupError> {
            Err(LookupError::Missing("parent job"))
        }
    }

    #[test]
    fn completed_carries_result_and_duration() {
        let mut r = run();
        r.result = Some("SUCCESS".to_string());
        r.duration_millis = 500;

        let now = Utc.timestamp_millis_opt(5000).unwrap();
        let value = serde_json::to_value(completed(&r, now)).unwrap();

        assert_eq!(value["type"], "job");
        assert_eq!(value["event"], "completed");
        assert_eq!(value["result"], "SUCCESS");
        assert_eq!(value["duration"], 500);
        assert_eq!(value["startTimeInMillis"], 1000);
        assert_eq!(value["startTimestamp"], "1970-01-01 00:00:01.000Z");
        assert_eq!(value["eventGeneratedTimestamp"], "1970-01-01 00:00:05.000Z");
        assert_eq!(value["job"]["fullName"], "app/main");
    }

    #[test]
    fn started_leaves_result_unset() {
        let mut r = run();
        r.result = Some("SUCCESS".to_string());

        let value = serde_json::to_value(started(&r, Utc::now())).unwrap();

        assert_eq!(value["event"], "started");
        assert_eq!(value["result"], serde_json::Value::Null);
    }

    #[test]
    fn ancillary_failures_keep_core_fields() {
        let record = snapshot(&BrokenRun);

        assert_eq!(record.id, "7");
        assert_eq!(record.result.as_deref(), Some("FAILURE"));
        assert_eq!(record.duration_millis, 12);
        assert_eq!(record.url, None);
        assert_eq!(record.job, None);
    }

    #[test]
    fn wire_run_accepts_legacy_field_names() {
        let r: RunNotification = serde_json::from_str(
            r#"{"id":"3","number":3,"duration":500,"startTimeInMillis":1000,"result":"SUCCESS"}"#,
        )
        .unwrap();

        assert_eq!(r.duration_millis, 500);
        assert_eq!(r.start_time_millis, 1000);
        assert_eq!(r.display_name(), "#3");
        assert_eq!(r.full_display_name(), "#3");
    }
}
