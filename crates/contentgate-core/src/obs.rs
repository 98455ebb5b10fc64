//! Structured observability hooks for the evaluation lifecycle.
//!
//! This module provides:
//! - Evaluation-scoped tracing spans via the `EvaluationSpan` RAII guard
//! - Emission functions for lifecycle events: start, evaluator finish,
//!   conflict, verdict, batch finish
//!
//! Events are emitted at `info!` level (configurable via `CONTENTGATE_LOG`).

use tracing::{info, warn};

use crate::conflict::Conflict;
use crate::evaluators::AgentId;
use crate::report::EvaluatorStatus;
use crate::verdict::{DecisionRule, FinalVerdict};

/// RAII guard that enters an evaluation-scoped span.
///
/// Holds an entered span, so it must not be kept across `.await`; async code
/// uses [`evaluation_span`] with `Instrument` instead.
///
/// ```ignore
/// let _span = EvaluationSpan::enter("pumpkin-01");
/// // tracing calls here carry content_id = "pumpkin-01"
/// ```
pub struct EvaluationSpan {
    _span: tracing::span::EnteredSpan,
}

impl EvaluationSpan {
    pub fn enter(content_id: &str) -> Self {
        Self {
            _span: evaluation_span(content_id).entered(),
        }
    }
}

/// Span tagged with the content id, for instrumenting futures.
pub fn evaluation_span(content_id: &str) -> tracing::Span {
    tracing::info_span!("contentgate.evaluation", content_id = %content_id)
}

pub fn emit_evaluation_started(content_id: &str, classification: &str, slides: usize) {
    info!(
        event = "evaluation.started",
        content_id = %content_id,
        classification = %classification,
        slides = slides,
    );
}

/// Emit event: one evaluator finished. Non-completed statuses log at warn.
pub fn emit_evaluator_finished(
    content_id: &str,
    agent: AgentId,
    score: u8,
    status: EvaluatorStatus,
    duration_ms: u64,
) {
    if status == EvaluatorStatus::Completed {
        info!(
            event = "evaluator.finished",
            content_id = %content_id,
            agent = %agent,
            score = score,
            status = %status,
            duration_ms = duration_ms,
        );
    } else {
        warn!(
            event = "evaluator.finished",
            content_id = %content_id,
            agent = %agent,
            score = score,
            status = %status,
            duration_ms = duration_ms,
        );
    }
}

pub fn emit_conflict_detected(content_id: &str, conflict: &Conflict) {
    info!(
        event = "conflict.detected",
        content_id = %content_id,
        kind = %conflict.kind,
        severity = %conflict.severity,
        resolution = %conflict.resolution,
        description = %conflict.description,
    );
}

/// Emit event: verdict decided, with the rule that fired.
pub fn emit_verdict_decided(
    content_id: &str,
    verdict: FinalVerdict,
    rule: DecisionRule,
    confidence: f64,
    duration_ms: u64,
) {
    info!(
        event = "verdict.decided",
        content_id = %content_id,
        verdict = %verdict,
        rule = %rule,
        confidence = confidence,
        duration_ms = duration_ms,
    );
}

pub fn emit_batch_finished(items: usize, timing_conflicts: usize, duration_ms: u64) {
    info!(
        event = "batch.finished",
        items = items,
        timing_conflicts = timing_conflicts,
        duration_ms = duration_ms,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluation_span_create() {
        let _span = EvaluationSpan::enter("test-content-id");
    }
}
