use std::sync::Arc;

use probe_core::{
    transition, ConfigError, PipelineConfig, PipelineEvent, PipelineState, WorkItem,
};
use probe_logging::{probe_debug, probe_error, probe_info};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::dispatcher::{DispatchError, Dispatcher};
use crate::governor::{governor_for, RateGovernor};
use crate::run_state::{RunCounts, RunState};
use crate::service::ValidationService;
use crate::sink::OutcomeSink;
use crate::worker::{WorkerContext, WorkerPool};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid pipeline configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error("pipeline task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("run ended with {admitted} items admitted but {produced} outcomes produced")]
    OutcomeMismatch { admitted: usize, produced: usize },
}

/// Single completion report for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub counts: RunCounts,
    /// Non-zero waits imposed by the rate governor.
    pub pauses: u64,
    /// Every state the run passed through, starting with `Idle`.
    pub states: Vec<PipelineState>,
}

impl RunSummary {
    pub fn final_state(&self) -> PipelineState {
        self.states.last().copied().unwrap_or_default()
    }

    pub fn succeeded(&self) -> usize {
        self.counts.produced - self.counts.failed
    }
}

/// Wires dispatcher, workers and sink together for one run to completion.
pub struct Pipeline {
    config: PipelineConfig,
    service: Arc<dyn ValidationService>,
    sink: Arc<dyn OutcomeSink>,
    governor: Box<dyn RateGovernor>,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        service: Arc<dyn ValidationService>,
        sink: Arc<dyn OutcomeSink>,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        let governor = governor_for(config.pacing);
        Ok(Self {
            config,
            service,
            sink,
            governor,
        })
    }

    /// Replaces the governor derived from the configured pacing policy.
    pub fn with_governor(mut self, governor: Box<dyn RateGovernor>) -> Self {
        self.governor = governor;
        self
    }

    /// Admits, checks and sinks every item, returning once all workers have terminated.
    pub async fn run(self, items: Vec<WorkItem>) -> Result<RunSummary, PipelineError> {
        let Pipeline {
            config,
            service,
            sink,
            governor,
        } = self;

        let run_state = Arc::new(RunState::new(items.len()));
        let mut tracker = StateTracker::default();

        tracker.apply(PipelineEvent::Started { items: items.len() });
        if tracker.current().is_terminal() {
            probe_info!("no identifiers to process");
            run_state.mark_completed();
            return Ok(tracker.finish(run_state.snapshot(), 0));
        }

        probe_info!(
            "processing {} identifiers with {} workers ({:?})",
            items.len(),
            config.worker_count,
            config.pacing
        );

        let (queue_tx, queue_rx) = mpsc::channel(config.queue_capacity);
        let pool = WorkerPool::spawn(
            config.worker_count,
            queue_rx,
            WorkerContext {
                service,
                sink,
                run_state: run_state.clone(),
                call_timeout: config.call_timeout(),
            },
        );

        let dispatcher = Dispatcher::new(governor, queue_tx, run_state.clone());
        let dispatched = tokio::spawn(dispatcher.run(items)).await;
        tracker.apply(PipelineEvent::InputClosed);

        // Workers are joined even when dispatch failed, so no outcome is left in flight.
        let joined = pool.join().await;
        tracker.apply(PipelineEvent::WorkersJoined);

        let report = dispatched??;
        let processed = joined?;

        let counts = run_state.snapshot();
        if counts.admitted != counts.produced || processed != counts.produced {
            probe_error!(
                "outcome mismatch: admitted={} produced={} processed={}",
                counts.admitted,
                counts.produced,
                processed
            );
            return Err(PipelineError::OutcomeMismatch {
                admitted: counts.admitted,
                produced: counts.produced,
            });
        }

        run_state.mark_completed();
        Ok(tracker.finish(counts, report.pauses))
    }
}

#[derive(Debug)]
struct StateTracker {
    states: Vec<PipelineState>,
}

impl Default for StateTracker {
    fn default() -> Self {
        Self {
            states: vec![PipelineState::Idle],
        }
    }
}

impl StateTracker {
    fn current(&self) -> PipelineState {
        self.states.last().copied().unwrap_or_default()
    }

    fn apply(&mut self, event: PipelineEvent) {
        let current = self.current();
        let next = transition(current, event);
        if next != current {
            probe_debug!("pipeline {:?} -> {:?}", current, next);
            self.states.push(next);
        }
    }

    fn finish(self, counts: RunCounts, pauses: u64) -> RunSummary {
        RunSummary {
            counts,
            pauses,
            states: self.states,
        }
    }
}
