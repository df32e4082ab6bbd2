use std::sync::Arc;

use probe_core::WorkItem;
use probe_logging::{probe_debug, probe_error, probe_trace};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::governor::RateGovernor;
use crate::run_state::RunState;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("admission queue closed by consumers with {undelivered} items left undelivered")]
    QueueClosed { undelivered: usize },
}

/// What the dispatcher did once its input ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    pub admitted: usize,
    pub pauses: u64,
}

/// Feeds input items into the bounded admission queue, one permit per item.
pub struct Dispatcher {
    governor: Box<dyn RateGovernor>,
    queue: mpsc::Sender<WorkItem>,
    run_state: Arc<RunState>,
}

impl Dispatcher {
    pub fn new(
        governor: Box<dyn RateGovernor>,
        queue: mpsc::Sender<WorkItem>,
        run_state: Arc<RunState>,
    ) -> Self {
        Self {
            governor,
            queue,
            run_state,
        }
    }

    /// Admits every item exactly once, in input order.
    ///
    /// Consumes the dispatcher so the queue sender is dropped on return, which
    /// is the end-of-input signal for the workers.
    pub async fn run(mut self, items: Vec<WorkItem>) -> Result<DispatchReport, DispatchError> {
        let total = items.len();
        let mut admitted = 0;

        for item in items {
            self.governor.permit().await;
            probe_trace!("admitting {}", item);
            if self.queue.send(item).await.is_err() {
                let undelivered = total - admitted;
                probe_error!(
                    "admission queue closed early; {} of {} items not admitted",
                    undelivered,
                    total
                );
                return Err(DispatchError::QueueClosed { undelivered });
            }
            self.governor.admitted();
            self.run_state.record_admission();
            admitted += 1;
        }

        probe_debug!("all {} items admitted, closing admission queue", admitted);
        Ok(DispatchReport {
            admitted,
            pauses: self.governor.pauses(),
        })
    }
}
