//! Probe core: work items, outcomes, run configuration and the pipeline state machine.
mod config;
mod item;
mod outcome;
mod state;

pub use config::{
    ConfigError, PacingPolicy, PipelineConfig, SinkPolicy, DEFAULT_CALL_TIMEOUT_MS,
    DEFAULT_INTERVAL_MS, DEFAULT_WORKER_COUNT,
};
pub use item::{parse_identifiers, WorkItem};
pub use outcome::{CheckError, FailureKind, Outcome, Verdict};
pub use state::{transition, PipelineEvent, PipelineState};
