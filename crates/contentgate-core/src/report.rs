//! Per-evaluator result types.
//!
//! Every evaluator returns an [`EvaluatorResult`]: a 0–100 score, free-form
//! findings, and an [`EvaluatorDetails`] payload that the conflict detector
//! and verdict engine read. Failed or timed-out evaluators carry
//! [`EvaluatorDetails::Unavailable`] and a zero score.

use serde::{Deserialize, Serialize};

use crate::evaluators::automation::AutomationJudgment;
use crate::evaluators::cost::CostReport;
use crate::evaluators::quality::QualityBreakdown;
use crate::evaluators::safety::SafetyReport;
use crate::evaluators::structure::StructureBreakdown;
use crate::evaluators::AgentId;

/// How an evaluator invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluatorStatus {
    Completed,
    Error,
    Timeout,
}

impl std::fmt::Display for EvaluatorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Error => write!(f, "error"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

/// An evaluator's own opinion. Only the safety detector may veto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentVerdict {
    Pass,
    Review,
    Veto,
}

/// Evaluator-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvaluatorDetails {
    Structure(StructureBreakdown),
    Quality(QualityBreakdown),
    Automation(AutomationJudgment),
    Safety(SafetyReport),
    Cost(CostReport),
    /// The evaluator did not complete.
    Unavailable,
}

/// Output of one evaluator for one content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorResult {
    pub agent_id: AgentId,
    /// 0–100. Always 0 unless `status == Completed`.
    pub score: u8,
    pub verdict: Option<AgentVerdict>,
    pub findings: Vec<String>,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
    pub execution_time_ms: u64,
    pub status: EvaluatorStatus,
    pub details: EvaluatorDetails,
}

impl EvaluatorResult {
    /// A completed result. `score` is clamped to 100.
    pub fn completed(agent_id: AgentId, score: u32, details: EvaluatorDetails) -> Self {
        Self {
            agent_id,
            score: score.min(100) as u8,
            verdict: None,
            findings: Vec::new(),
            issues: Vec::new(),
            warnings: Vec::new(),
            execution_time_ms: 0,
            status: EvaluatorStatus::Completed,
            details,
        }
    }

    /// A synthesized result for an evaluator that errored or timed out.
    pub fn failed(
        agent_id: AgentId,
        status: EvaluatorStatus,
        reason: impl Into<String>,
        execution_time_ms: u64,
    ) -> Self {
        Self {
            agent_id,
            score: 0,
            verdict: None,
            findings: Vec::new(),
            issues: vec![reason.into()],
            warnings: Vec::new(),
            execution_time_ms,
            status,
            details: EvaluatorDetails::Unavailable,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == EvaluatorStatus::Completed
    }

    /// Re-establish the score/status invariant on results produced by an
    /// injected runner.
    pub(crate) fn enforce_invariants(&mut self, expected: AgentId) {
        self.agent_id = expected;
        self.score = self.score.min(100);
        if !self.is_completed() {
            self.score = 0;
            self.details = EvaluatorDetails::Unavailable;
        }
    }
}

/// Judgment of the automation evaluator, if it completed.
pub fn automation_judgment(results: &[EvaluatorResult]) -> Option<&AutomationJudgment> {
    results.iter().find_map(|r| match &r.details {
        EvaluatorDetails::Automation(j) if r.is_completed() => Some(j),
        _ => None,
    })
}

/// Report of the safety evaluator, if it completed.
pub fn safety_report(results: &[EvaluatorResult]) -> Option<&SafetyReport> {
    results.iter().find_map(|r| match &r.details {
        EvaluatorDetails::Safety(s) if r.is_completed() => Some(s),
        _ => None,
    })
}

/// Report of the cost evaluator, if it completed.
pub fn cost_report(results: &[EvaluatorResult]) -> Option<&CostReport> {
    results.iter().find_map(|r| match &r.details {
        EvaluatorDetails::Cost(c) if r.is_completed() => Some(c),
        _ => None,
    })
}

/// Score of the given evaluator, if it completed.
pub fn completed_score(results: &[EvaluatorResult], agent: AgentId) -> Option<u8> {
    results
        .iter()
        .find(|r| r.agent_id == agent && r.is_completed())
        .map(|r| r.score)
}
