//! Result aggregation and the public evaluation entry points.
//!
//! [`EvaluationEngine`] owns a validated policy and a [`Coordinator`]. One
//! evaluation is: fan out to the evaluators, detect conflicts, decide, and
//! package everything into an immutable [`EvaluationResult`]. Batches fan out
//! every item concurrently and run the cross-item timing check before any
//! verdict is decided.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::time::Instant;
use tracing::Instrument;

use crate::conflict::{self, Conflict, SlotRequest};
use crate::coordinator::{Coordinator, EvaluatorRunner, FanOutReport};
use crate::error::EngineResult;
use crate::evaluators::safety::RedFlag;
use crate::evaluators::AgentId;
use crate::metrics::METRICS;
use crate::model::{ContentItem, SafetyClassification};
use crate::obs;
use crate::policy::EvaluationPolicy;
use crate::report::{self, EvaluatorResult};
use crate::verdict::{self, DecisionRule, FinalVerdict, VerdictMachine};

/// Complete, immutable outcome of evaluating one content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub content_id: String,
    pub safety_classification: SafetyClassification,
    /// One result per evaluator, in [`AgentId::ALL`] order.
    pub evaluator_results: [EvaluatorResult; 5],
    pub conflicts: Vec<Conflict>,
    /// Mean of the five scores. Informational only; never routes.
    pub confidence_score: f64,
    /// Always zero: the engine has no code path that asks a person anything.
    pub questions_asked: u32,
    pub total_execution_time_ms: u64,
    pub final_verdict: FinalVerdict,
    pub publishable: bool,
    pub decision_rule: DecisionRule,
    pub reasons: Vec<String>,
    /// Work items for the reviewer when the item is queued.
    pub intervention_points: Vec<String>,
    pub policy_version: String,
    pub evaluated_at: DateTime<Utc>,
}

impl EvaluationResult {
    pub fn result_for(&self, agent: AgentId) -> &EvaluatorResult {
        &self.evaluator_results[agent.index()]
    }

    pub fn red_flags(&self) -> &[RedFlag] {
        report::safety_report(&self.evaluator_results)
            .map(|s| s.red_flags.as_slice())
            .unwrap_or(&[])
    }

    pub fn auto_publishable(&self) -> bool {
        report::automation_judgment(&self.evaluator_results)
            .map(|j| j.auto_publishable)
            .unwrap_or(false)
    }

    /// SHA-256 over the result with every timing field and the timestamp
    /// zeroed. Two evaluations of the same item under the same policy yield
    /// the same digest.
    pub fn decision_digest(&self) -> String {
        let mut normalized = self.clone();
        normalized.total_execution_time_ms = 0;
        normalized.evaluated_at = DateTime::<Utc>::default();
        for result in normalized.evaluator_results.iter_mut() {
            result.execution_time_ms = 0;
        }
        let bytes = serde_json::to_vec(&normalized).unwrap_or_default();
        hex::encode(Sha256::digest(&bytes))
    }
}

/// Fan-out output for one item, waiting for conflicts and a verdict.
struct PendingEvaluation {
    content_id: String,
    classification: SafetyClassification,
    slot_request: SlotRequest,
    fan_out: FanOutReport,
    machine: VerdictMachine,
    started: Instant,
}

/// Evaluates content items under one validated policy.
#[derive(Clone)]
pub struct EvaluationEngine {
    policy: Arc<EvaluationPolicy>,
    coordinator: Coordinator,
}

impl EvaluationEngine {
    /// Validates `policy`; an invalid policy is the only fatal error.
    pub fn new(policy: EvaluationPolicy) -> EngineResult<Self> {
        policy.validate()?;
        Ok(Self {
            policy: Arc::new(policy),
            coordinator: Coordinator::default(),
        })
    }

    /// Replace the evaluator runner.
    pub fn with_runner(mut self, runner: Arc<dyn EvaluatorRunner>) -> Self {
        self.coordinator = Coordinator::new(runner);
        self
    }

    pub fn policy(&self) -> &EvaluationPolicy {
        &self.policy
    }

    pub async fn evaluate(&self, item: ContentItem) -> EngineResult<EvaluationResult> {
        let pending = self.fan_out(item).await?;
        self.finalize(pending, Vec::new())
    }

    /// Evaluate every item concurrently. Results keep input order.
    pub async fn evaluate_batch(&self, items: Vec<ContentItem>) -> EngineResult<Vec<EvaluationResult>> {
        let started = Instant::now();
        let pending = join_all(items.into_iter().map(|item| self.fan_out(item)))
            .await
            .into_iter()
            .collect::<EngineResult<Vec<_>>>()?;

        let requests: Vec<SlotRequest> = pending.iter().map(|p| p.slot_request.clone()).collect();
        let timing = conflict::detect_timing_conflicts(&requests);
        let timing_conflicts = timing.iter().filter(|c| !c.is_empty()).count();

        let results = pending
            .into_iter()
            .zip(timing)
            .map(|(p, extra)| self.finalize(p, extra))
            .collect::<EngineResult<Vec<_>>>()?;

        obs::emit_batch_finished(
            results.len(),
            timing_conflicts,
            started.elapsed().as_millis() as u64,
        );
        METRICS.flush();
        Ok(results)
    }

    async fn fan_out(&self, item: ContentItem) -> EngineResult<PendingEvaluation> {
        let started = Instant::now();
        let content_id = item.content_id();
        let span = obs::evaluation_span(&content_id);

        let mut machine = VerdictMachine::new();
        machine.begin()?;

        obs::emit_evaluation_started(
            &content_id,
            &item.safety_classification.to_string(),
            item.slides.len(),
        );
        let classification = item.safety_classification;
        let slot_request = SlotRequest::new(&item);

        let fan_out = self
            .coordinator
            .fan_out(&content_id, Arc::new(item), Arc::clone(&self.policy))
            .instrument(span)
            .await;

        Ok(PendingEvaluation {
            content_id,
            classification,
            slot_request,
            fan_out,
            machine,
            started,
        })
    }

    fn finalize(
        &self,
        mut pending: PendingEvaluation,
        extra_conflicts: Vec<Conflict>,
    ) -> EngineResult<EvaluationResult> {
        let _span = obs::EvaluationSpan::enter(&pending.content_id);
        let results = pending.fan_out.results;

        let mut conflicts = conflict::detect_conflicts(&results, &self.policy);
        conflicts.extend(extra_conflicts);
        for c in &conflicts {
            obs::emit_conflict_detected(&pending.content_id, c);
        }
        METRICS.add_conflicts(conflicts.len());

        let decision = verdict::decide(&self.policy, pending.classification, &results, &conflicts);
        let final_verdict = pending.machine.conclude(decision.verdict)?;

        let confidence_score =
            results.iter().map(|r| r.score as f64).sum::<f64>() / results.len() as f64;
        let intervention_points = report::automation_judgment(&results)
            .map(|j| j.intervention_points.clone())
            .unwrap_or_default();
        let total_execution_time_ms = pending.started.elapsed().as_millis() as u64;

        obs::emit_verdict_decided(
            &pending.content_id,
            final_verdict,
            decision.rule,
            confidence_score,
            total_execution_time_ms,
        );
        METRICS.record_verdict(final_verdict);

        Ok(EvaluationResult {
            content_id: pending.content_id,
            safety_classification: pending.classification,
            evaluator_results: results,
            conflicts,
            confidence_score,
            questions_asked: 0,
            total_execution_time_ms,
            final_verdict,
            publishable: final_verdict == FinalVerdict::AutoPublish,
            decision_rule: decision.rule,
            reasons: decision.reasons,
            intervention_points,
            policy_version: self.policy.version.clone(),
            evaluated_at: Utc::now(),
        })
    }
}

/// Evaluate one item, validating `policy` first.
pub async fn evaluate(policy: &EvaluationPolicy, item: ContentItem) -> EngineResult<EvaluationResult> {
    EvaluationEngine::new(policy.clone())?.evaluate(item).await
}

/// Evaluate a batch, validating `policy` first.
pub async fn evaluate_batch(
    policy: &EvaluationPolicy,
    items: Vec<ContentItem>,
) -> EngineResult<Vec<EvaluationResult>> {
    EvaluationEngine::new(policy.clone())?
        .evaluate_batch(items)
        .await
}
