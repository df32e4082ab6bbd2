use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_WORKER_COUNT: usize = 5;
pub const DEFAULT_INTERVAL_MS: u64 = 3_000;
pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("worker count must be at least 1")]
    NoWorkers,
    #[error("batch size must be at least 1")]
    EmptyBatch,
    #[error("queue capacity must be at least 1")]
    NoQueueCapacity,
    #[error("call timeout must be greater than zero")]
    ZeroCallTimeout,
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// How admissions are spaced out in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PacingPolicy {
    /// A fixed minimum interval between successive admissions.
    Steady { interval_ms: u64 },
    /// `size` admissions back-to-back, then a pause before the next batch.
    Batch { size: usize, pause_ms: u64 },
}

impl PacingPolicy {
    pub fn steady(interval: Duration) -> Self {
        PacingPolicy::Steady {
            interval_ms: saturating_millis(interval),
        }
    }

    pub fn batch(size: usize, pause: Duration) -> Self {
        PacingPolicy::Batch {
            size,
            pause_ms: saturating_millis(pause),
        }
    }

    /// Minimum gap between the previous admission and the next one, given how
    /// many items were admitted so far.
    pub fn gap_before(&self, admitted: u64) -> Duration {
        if admitted == 0 {
            return Duration::ZERO;
        }
        match *self {
            PacingPolicy::Steady { interval_ms } => Duration::from_millis(interval_ms),
            PacingPolicy::Batch { size, pause_ms } => {
                if admitted % size.max(1) as u64 == 0 {
                    Duration::from_millis(pause_ms)
                } else {
                    Duration::ZERO
                }
            }
        }
    }

    /// Number of non-zero waits imposed while admitting `items` items.
    pub fn expected_pauses(&self, items: u64) -> u64 {
        (0..items)
            .filter(|admitted| !self.gap_before(*admitted).is_zero())
            .count() as u64
    }

    /// Lower bound on the time needed to admit `items` items.
    pub fn minimum_admission_time(&self, items: u64) -> Duration {
        (0..items).map(|admitted| self.gap_before(admitted)).sum()
    }
}

impl Default for PacingPolicy {
    fn default() -> Self {
        PacingPolicy::Steady {
            interval_ms: DEFAULT_INTERVAL_MS,
        }
    }
}

/// What the result sink writes for each outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SinkPolicy {
    /// One structured record per successful check.
    #[default]
    Full,
    /// Only the bare identifier, and only when the verdict is positive.
    ValidOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub worker_count: usize,
    pub pacing: PacingPolicy,
    pub sink_policy: SinkPolicy,
    pub call_timeout_ms: u64,
    /// Capacity of the bounded admission queue between dispatcher and workers.
    pub queue_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            pacing: PacingPolicy::default(),
            sink_policy: SinkPolicy::default(),
            call_timeout_ms: DEFAULT_CALL_TIMEOUT_MS,
            queue_capacity: DEFAULT_WORKER_COUNT,
        }
    }
}

impl PipelineConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_count == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if let PacingPolicy::Batch { size: 0, .. } = self.pacing {
            return Err(ConfigError::EmptyBatch);
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::NoQueueCapacity);
        }
        if self.call_timeout_ms == 0 {
            return Err(ConfigError::ZeroCallTimeout);
        }
        Ok(())
    }
}
