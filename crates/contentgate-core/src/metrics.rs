//! Global atomic counters for evaluation observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. at the end of a batch).

use std::sync::atomic::{AtomicU64, Ordering};

use crate::report::EvaluatorStatus;
use crate::verdict::FinalVerdict;

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters, no allocations and no locking.
pub struct Metrics {
    evaluations: AtomicU64,
    auto_published: AtomicU64,
    human_queued: AtomicU64,
    rejected: AtomicU64,
    evaluator_timeouts: AtomicU64,
    evaluator_errors: AtomicU64,
    conflicts: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            evaluations: AtomicU64::new(0),
            auto_published: AtomicU64::new(0),
            human_queued: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            evaluator_timeouts: AtomicU64::new(0),
            evaluator_errors: AtomicU64::new(0),
            conflicts: AtomicU64::new(0),
        }
    }

    /// Count one decided evaluation under its verdict.
    pub fn record_verdict(&self, verdict: FinalVerdict) {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        let counter = match verdict {
            FinalVerdict::AutoPublish => &self.auto_published,
            FinalVerdict::HumanQueue => &self.human_queued,
            FinalVerdict::Reject => &self.rejected,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "evaluations", verdict = %verdict, "counter incremented");
    }

    /// Count a non-completed evaluator run. Completed runs are ignored.
    pub fn record_evaluator_status(&self, status: EvaluatorStatus) {
        match status {
            EvaluatorStatus::Completed => {}
            EvaluatorStatus::Timeout => {
                self.evaluator_timeouts.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(metric = "evaluator_timeouts", "counter incremented");
            }
            EvaluatorStatus::Error => {
                self.evaluator_errors.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(metric = "evaluator_errors", "counter incremented");
            }
        }
    }

    pub fn add_conflicts(&self, n: usize) {
        self.conflicts.fetch_add(n as u64, Ordering::Relaxed);
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            evaluations = self.evaluations(),
            auto_published = self.auto_published(),
            human_queued = self.human_queued(),
            rejected = self.rejected(),
            evaluator_timeouts = self.evaluator_timeouts(),
            evaluator_errors = self.evaluator_errors(),
            conflicts = self.conflicts(),
        );
    }

    pub fn evaluations(&self) -> u64 {
        self.evaluations.load(Ordering::Relaxed)
    }

    pub fn auto_published(&self) -> u64 {
        self.auto_published.load(Ordering::Relaxed)
    }

    pub fn human_queued(&self) -> u64 {
        self.human_queued.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn evaluator_timeouts(&self) -> u64 {
        self.evaluator_timeouts.load(Ordering::Relaxed)
    }

    pub fn evaluator_errors(&self) -> u64 {
        self.evaluator_errors.load(Ordering::Relaxed)
    }

    pub fn conflicts(&self) -> u64 {
        self.conflicts.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        for counter in [
            &self.evaluations,
            &self.auto_published,
            &self.human_queued,
            &self.rejected,
            &self.evaluator_timeouts,
            &self.evaluator_errors,
            &self.conflicts,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdicts_are_counted_per_outcome() {
        let m = Metrics::new();
        m.record_verdict(FinalVerdict::AutoPublish);
        m.record_verdict(FinalVerdict::Reject);
        m.record_verdict(FinalVerdict::Reject);
        assert_eq!(m.evaluations(), 3);
        assert_eq!(m.auto_published(), 1);
        assert_eq!(m.human_queued(), 0);
        assert_eq!(m.rejected(), 2);
    }

    #[test]
    fn completed_status_is_not_counted() {
        let m = Metrics::new();
        m.record_evaluator_status(EvaluatorStatus::Completed);
        m.record_evaluator_status(EvaluatorStatus::Timeout);
        m.record_evaluator_status(EvaluatorStatus::Error);
        assert_eq!(m.evaluator_timeouts(), 1);
        assert_eq!(m.evaluator_errors(), 1);
    }

    #[test]
    fn reset_zeroes_all() {
        let m = Metrics::new();
        m.record_verdict(FinalVerdict::HumanQueue);
        m.record_evaluator_status(EvaluatorStatus::Error);
        m.add_conflicts(2);
        m.reset();
        assert_eq!(m.evaluations(), 0);
        assert_eq!(m.human_queued(), 0);
        assert_eq!(m.evaluator_errors(), 0);
        assert_eq!(m.conflicts(), 0);
    }
}
