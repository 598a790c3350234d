use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;

use stagewatch::engine::events::TIMESTAMP_FORMAT;
use stagewatch::engine::{EventObserver, Node, ObserverOptions, PipelinePhase, RunNotification, StageNamePolicy};
use stagewatch::execution_id::ExecutionId;
use stagewatch::sinks::collecting::CollectingEventSink;

fn setup(options: ObserverOptions) -> (EventObserver, Arc<CollectingEventSink>) {
    let sink = Arc::new(CollectingEventSink::new());
    (EventObserver::new(sink.clone(), options), sink)
}

fn emitted(sink: &CollectingEventSink) -> Vec<Value> {
    sink.events()
        .iter()
        .map(|e| serde_json::to_value(e).unwrap())
        .collect()
}

/// Drop the fields that depend on wall-clock time.
fn stable(mut value: Value) -> Value {
    let obj = value.as_object_mut().unwrap();
    obj.remove("eventGeneratedTimestamp");
    obj.remove("durationMillis");
    value
}

fn assert_utc_timestamp(value: &Value) {
    let raw = value.as_str().expect("timestamp is a string");
    chrono::NaiveDateTime::parse_from_str(raw.trim_end_matches('Z'), "%Y-%m-%d %H:%M:%S%.3f")
        .unwrap_or_else(|e| panic!("{raw} does not match {TIMESTAMP_FORMAT}: {e}"));
    assert!(raw.ends_with('Z'));
}

#[test]
fn build_stage_start_and_end() {
    let (observer, sink) = setup(ObserverOptions::default());
    let exec = ExecutionId::from("app#1");

    observer.notify_node(&exec, &Node::block_start("1").with_label("Build"));
    observer.notify_node(&exec, &Node::block_end("2", "1"));

    let events = emitted(&sink);
    for e in &events {
        assert_utc_timestamp(&e["eventGeneratedTimestamp"]);
    }

    let events: Vec<Value> = events.into_iter().map(stable).collect();
    assert_eq!(
        events,
        vec![
            json!({
                "type": "stage",
                "event": "start",
                "executionRef": "app#1",
                "stageName": "Build",
                "startNodeId": "1",
                "endNodeId": null,
                "enclosingId": null,
                "error": null,
                "forced": false,
            }),
            json!({
                "type": "stage",
                "event": "end",
                "executionRef": "app#1",
                "stageName": "Build",
                "startNodeId": "1",
                "endNodeId": "2",
                "enclosingId": null,
                "error": null,
                "forced": false,
            }),
        ]
    );
}

#[test]
fn every_start_gets_exactly_one_end_in_order() {
    let (observer, sink) = setup(ObserverOptions::default());
    let exec = ExecutionId::from("app#2");

    // Build { Test { } Lint { } } Deploy { }
    let nodes = vec![
        Node::block_start("2").with_label("Build"),
        Node::block_start("3").enclosed_by("2").with_label("Test"),
        Node::other("4").enclosed_by("3"),
        Node::block_end("5", "3").enclosed_by("2"),
        Node::block_start("6").enclosed_by("2").with_label("Lint"),
        Node::block_end("7", "6").enclosed_by("2"),
        Node::block_end("8", "2"),
        Node::block_start("9").with_label("Deploy"),
        Node::block_end("10", "9"),
    ];
    for node in &nodes {
        observer.notify_node(&exec, node);
    }

    let events = emitted(&sink);
    for start_id in ["2", "3", "6", "9"] {
        let matching: Vec<&str> = events
            .iter()
            .filter(|e| e["startNodeId"] == start_id)
            .map(|e| e["event"].as_str().unwrap())
            .collect();
        assert_eq!(matching, vec!["start", "end"], "stage {start_id}");
    }

    let ends: Vec<(&str, &str)> = events
        .iter()
        .filter(|e| e["event"] == "end")
        .map(|e| (e["stageName"].as_str().unwrap(), e["endNodeId"].as_str().unwrap()))
        .collect();
    assert_eq!(ends, vec![("Test", "5"), ("Lint", "7"), ("Build", "8"), ("Deploy", "10")]);
    assert_eq!(observer.registry().open_stages(&exec), 0);
}

#[test]
fn unknown_start_reference_emits_nothing() {
    let (observer, sink) = setup(ObserverOptions::default());

    observer.notify_node(&ExecutionId::from("late"), &Node::block_end("40", "12"));

    assert!(sink.is_empty());
}

#[test]
fn unlabelled_block_is_unknown_stage() {
    let (observer, sink) = setup(ObserverOptions::default());
    let exec = ExecutionId::from("x");

    observer.notify_node(&exec, &Node::block_start("1"));
    observer.notify_node(&exec, &Node::block_end("2", "1"));

    let names: Vec<Value> = emitted(&sink).into_iter().map(|e| e["stageName"].clone()).collect();
    assert_eq!(names, vec![json!("UnknownStage"), json!("UnknownStage")]);
}

#[test]
fn start_name_policy_is_configurable() {
    let (observer, sink) = setup(ObserverOptions {
        name_policy: StageNamePolicy::PreferStart,
        close_orphans: true,
    });
    let exec = ExecutionId::from("x");

    observer.notify_node(&exec, &Node::block_start("1").with_label("parallel"));
    observer.notify_node(&exec, &Node::block_end("2", "1").with_label("branch: linux"));

    assert_eq!(emitted(&sink)[1]["stageName"], "parallel");
}

#[test]
fn completion_force_closes_each_open_stage_once() {
    let (observer, sink) = setup(ObserverOptions::default());
    let exec = ExecutionId::from("aborted#3");

    observer.notify_node(&exec, &Node::block_start("2").with_label("Build"));
    observer.notify_node(&exec, &Node::block_start("3").enclosed_by("2").with_label("Compile"));
    observer.notify_pipeline(&exec, PipelinePhase::Completed, true);
    observer.notify_pipeline(&exec, PipelinePhase::Completed, true);
    observer.flush();

    let events = emitted(&sink);
    let forced: Vec<&str> = events
        .iter()
        .filter(|e| e["forced"] == true)
        .map(|e| e["stageName"].as_str().unwrap())
        .collect();
    assert_eq!(forced, vec!["Build", "Compile"]);

    // A late end for a force-closed stage is a gap, not a second end.
    observer.notify_node(&exec, &Node::block_end("4", "3"));
    assert_eq!(sink.len(), events.len());
    assert_eq!(observer.registry().tracked(), 0);
}

#[test]
fn run_completed_scenario() {
    let (observer, sink) = setup(ObserverOptions::default());
    let started: RunNotification =
        serde_json::from_value(json!({"id": "5", "number": 5, "startTimeInMillis": 1000})).unwrap();
    let completed: RunNotification = serde_json::from_value(json!({
        "id": "5",
        "number": 5,
        "startTimeInMillis": 1000,
        "duration": 500,
        "result": "SUCCESS",
    }))
    .unwrap();

    observer.notify_run_started(&started);
    observer.notify_run_completed(&completed);

    let events = emitted(&sink);
    assert_eq!(events[0]["event"], "started");
    assert_eq!(events[0]["result"], Value::Null);

    let done = &events[1];
    assert_eq!(done["type"], "job");
    assert_eq!(done["event"], "completed");
    assert_eq!(done["duration"], 500);
    assert_eq!(done["result"], "SUCCESS");
    assert_eq!(done["startTimeInMillis"], 1000);
    assert_utc_timestamp(&done["startTimestamp"]);
    assert_utc_timestamp(&done["eventGeneratedTimestamp"]);
    // Ancillary data was not supplied; core fields still made it.
    assert_eq!(done["url"], Value::Null);
    assert_eq!(done["job"], Value::Null);
}

#[test]
fn pipeline_completed_scenario() {
    let (observer, sink) = setup(ObserverOptions::default());

    observer.notify_pipeline(&ExecutionId::from("app#9"), PipelinePhase::Completed, true);

    let event = stable(emitted(&sink).remove(0));
    assert_eq!(
        event,
        json!({
            "type": "pipeline",
            "event": "Completed",
            "executionRef": "app#9",
            "isComplete": true,
        })
    );
}
