use std::time::Duration;

use probe_core::PacingPolicy;
use probe_logging::probe_debug;
use tokio::time::{sleep_until, Instant};

/// Decides when the dispatcher may admit the next item.
///
/// Implementations pace admissions only; they never observe outcomes.
#[async_trait::async_trait]
pub trait RateGovernor: Send {
    /// Suspends the caller until one more admission is allowed.
    async fn permit(&mut self);

    /// Records that the permitted item actually entered the admission queue.
    ///
    /// The next gap is measured from this moment, not from the permit.
    fn admitted(&mut self);

    /// Number of non-zero waits imposed so far.
    fn pauses(&self) -> u64;
}

/// Admission bookkeeping shared by the governor strategies.
#[derive(Debug, Clone)]
struct Pacer {
    policy: PacingPolicy,
    admitted: u64,
    last_admission: Option<Instant>,
    pauses: u64,
}

impl Pacer {
    fn new(policy: PacingPolicy) -> Self {
        Self {
            policy,
            admitted: 0,
            last_admission: None,
            pauses: 0,
        }
    }

    /// Waits out the gap the policy requires before the next admission.
    ///
    /// Returns the gap that applied, zero when none did.
    async fn wait(&mut self) -> Duration {
        let gap = self.policy.gap_before(self.admitted);
        if gap.is_zero() {
            return gap;
        }
        if let Some(last) = self.last_admission {
            self.pauses += 1;
            sleep_until(last + gap).await;
        }
        gap
    }

    fn record(&mut self) {
        self.admitted += 1;
        self.last_admission = Some(Instant::now());
    }
}

/// Enforces a fixed minimum interval between successive admissions.
#[derive(Debug, Clone)]
pub struct SteadyGovernor {
    pacer: Pacer,
}

impl SteadyGovernor {
    pub fn new(interval: Duration) -> Self {
        Self {
            pacer: Pacer::new(PacingPolicy::steady(interval)),
        }
    }
}

#[async_trait::async_trait]
impl RateGovernor for SteadyGovernor {
    async fn permit(&mut self) {
        self.pacer.wait().await;
    }

    fn admitted(&mut self) {
        self.pacer.record();
    }

    fn pauses(&self) -> u64 {
        self.pacer.pauses
    }
}

/// Admits `size` items back-to-back, then waits `pause` before the next batch.
#[derive(Debug, Clone)]
pub struct BatchGovernor {
    pacer: Pacer,
}

impl BatchGovernor {
    pub fn new(size: usize, pause: Duration) -> Self {
        Self {
            pacer: Pacer::new(PacingPolicy::batch(size.max(1), pause)),
        }
    }
}

#[async_trait::async_trait]
impl RateGovernor for BatchGovernor {
    async fn permit(&mut self) {
        let gap = self.pacer.wait().await;
        if !gap.is_zero() {
            probe_debug!(
                "batch boundary after {} admissions, paused {:?}",
                self.pacer.admitted,
                gap
            );
        }
    }

    fn admitted(&mut self) {
        self.pacer.record();
    }

    fn pauses(&self) -> u64 {
        self.pacer.pauses
    }
}

/// Builds the governor strategy matching a configured pacing policy.
pub fn governor_for(policy: PacingPolicy) -> Box<dyn RateGovernor> {
    match policy {
        PacingPolicy::Steady { interval_ms } => {
            Box::new(SteadyGovernor::new(Duration::from_millis(interval_ms)))
        }
        PacingPolicy::Batch { size, pause_ms } => {
            Box::new(BatchGovernor::new(size, Duration::from_millis(pause_ms)))
        }
    }
}
