// src/lib.rs

//! stagewatch
//!
//! Observes the lifecycle of CI work (job runs, pipeline executions and the
//! stages nested inside them) and turns host notifications into
//! self-contained JSON events.
//!
//! The core is purely reactive and owns no threads: hosts call
//! [`engine::EventObserver`] from their own callback threads, and events
//! leave through an [`engine::EventSink`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use stagewatch::engine::{EventObserver, Node, ObserverOptions};
//! use stagewatch::execution_id::ExecutionId;
//! use stagewatch::sinks::stdout::StdoutEventSink;
//!
//! let observer = EventObserver::new(Arc::new(StdoutEventSink), ObserverOptions::default());
//! let exec = ExecutionId::from("app#1");
//!
//! observer.notify_node(&exec, &Node::block_start("3").with_label("Build"));
//! observer.notify_node(&exec, &Node::block_end("4", "3"));
//! ```

pub mod auth;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod execution_id;
pub mod notification;
pub mod runner;
pub mod runtime;
pub mod sinks;
pub mod util;
pub mod validate;
