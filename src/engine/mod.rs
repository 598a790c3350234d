//! Reactive core: node correlation plus run/pipeline normalization.

pub mod events;
pub mod metadata;
pub mod node;
pub mod observer;
pub mod pipeline;
pub mod registry;
pub mod run;
pub mod sink;
pub mod stage;
pub mod summary;

pub use events::{EventPayload, NormalizedEvent, PipelinePhase};
pub use node::{MetadataEntry, MetadataKind, Node, NodeKind};
pub use observer::{EventObserver, ObserverOptions};
pub use run::{RunNotification, RunView};
pub use sink::EventSink;
pub use stage::StageNamePolicy;
