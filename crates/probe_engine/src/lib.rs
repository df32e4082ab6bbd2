//! Probe engine: paced dispatch, worker pool, result sink and the HTTP validation service.
mod dispatcher;
mod governor;
mod pipeline;
mod run_state;
mod service;
mod sink;
mod worker;

pub use dispatcher::{DispatchError, DispatchReport, Dispatcher};
pub use governor::{governor_for, BatchGovernor, RateGovernor, SteadyGovernor};
pub use pipeline::{Pipeline, PipelineError, RunSummary};
pub use run_state::{RunCounts, RunState};
pub use service::{
    CredentialTypeService, ServiceError, ServiceSettings, ValidationService, DEFAULT_ENDPOINT,
};
pub use sink::{render_line, LineSink, OutcomeRecord, OutcomeSink, SinkError, SinkTarget};
pub use worker::{check_item, WorkerContext, WorkerPool};
