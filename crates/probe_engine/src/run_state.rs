use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Counters for one run, shared by reference between the dispatcher and the workers.
#[derive(Debug, Default)]
pub struct RunState {
    pending: AtomicUsize,
    admitted: AtomicUsize,
    produced: AtomicUsize,
    failed: AtomicUsize,
    valid: AtomicUsize,
    completed: AtomicBool,
}

/// Point-in-time copy of [`RunState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunCounts {
    pub pending: usize,
    pub admitted: usize,
    pub produced: usize,
    pub failed: usize,
    pub valid: usize,
}

impl RunState {
    pub fn new(pending: usize) -> Self {
        Self {
            pending: AtomicUsize::new(pending),
            ..Self::default()
        }
    }

    pub(crate) fn record_admission(&self) {
        self.pending.fetch_sub(1, Ordering::AcqRel);
        self.admitted.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn record_outcome(&self, success: bool, valid: bool) {
        if !success {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        if valid {
            self.valid.fetch_add(1, Ordering::Relaxed);
        }
        self.produced.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn mark_completed(&self) {
        self.completed.store(true, Ordering::Release);
    }

    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    pub fn admitted(&self) -> usize {
        self.admitted.load(Ordering::Acquire)
    }

    pub fn produced(&self) -> usize {
        self.produced.load(Ordering::Acquire)
    }

    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> RunCounts {
        RunCounts {
            pending: self.pending(),
            admitted: self.admitted(),
            produced: self.produced(),
            failed: self.failed.load(Ordering::Relaxed),
            valid: self.valid.load(Ordering::Relaxed),
        }
    }
}
