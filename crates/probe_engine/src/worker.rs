use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use probe_core::{CheckError, FailureKind, Outcome, WorkItem};
use probe_logging::{probe_debug, probe_error, probe_warn};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

use crate::run_state::RunState;
use crate::service::ValidationService;
use crate::sink::OutcomeSink;

/// Everything a worker needs, shared by all workers of one run.
#[derive(Clone)]
pub struct WorkerContext {
    pub service: Arc<dyn ValidationService>,
    pub sink: Arc<dyn OutcomeSink>,
    pub run_state: Arc<RunState>,
    pub call_timeout: Duration,
}

/// Fixed set of workers consuming one shared admission queue.
pub struct WorkerPool {
    workers: JoinSet<usize>,
}

impl WorkerPool {
    /// Spawns `count` workers on the current runtime.
    pub fn spawn(count: usize, queue: mpsc::Receiver<WorkItem>, context: WorkerContext) -> Self {
        let queue = Arc::new(Mutex::new(queue));
        let mut workers = JoinSet::new();
        for worker_id in 0..count {
            let queue = queue.clone();
            let context = context.clone();
            workers.spawn(async move { run_worker(worker_id, queue, context).await });
        }
        Self { workers }
    }

    /// Waits for every worker to terminate and returns how many items they processed.
    pub async fn join(mut self) -> Result<usize, tokio::task::JoinError> {
        let mut processed = 0;
        while let Some(joined) = self.workers.join_next().await {
            processed += joined?;
        }
        Ok(processed)
    }
}

async fn run_worker(
    worker_id: usize,
    queue: Arc<Mutex<mpsc::Receiver<WorkItem>>>,
    context: WorkerContext,
) -> usize {
    let mut processed = 0;
    loop {
        // The guard is released before the check so other workers can take items.
        let next = queue.lock().await.recv().await;
        let Some(item) = next else {
            break;
        };

        let outcome = check_item(context.service.as_ref(), item, context.call_timeout).await;
        if let Err(err) = &outcome.result {
            probe_error!("[!] Error validating {}: {}", outcome.identifier(), err);
        }
        context.sink.accept(&outcome);
        context
            .run_state
            .record_outcome(outcome.is_success(), outcome.is_valid());
        processed += 1;
    }
    probe_debug!(
        "worker {} finished: queue closed and drained after {} items",
        worker_id,
        processed
    );
    processed
}

/// Runs one bounded check and maps whatever happens to exactly one outcome.
pub async fn check_item(
    service: &dyn ValidationService,
    item: WorkItem,
    call_timeout: Duration,
) -> Outcome {
    let call = tokio::time::timeout(call_timeout, service.check(item.as_str()));
    let result = match AssertUnwindSafe(call).catch_unwind().await {
        Ok(Ok(result)) => result,
        Ok(Err(_elapsed)) => Err(CheckError::new(
            FailureKind::Timeout,
            format!("no answer within {call_timeout:?}"),
        )),
        Err(_panic) => {
            probe_warn!("validation service panicked while checking {}", item);
            Err(CheckError::new(
                FailureKind::Service,
                "validation service panicked",
            ))
        }
    };
    Outcome { item, result }
}
