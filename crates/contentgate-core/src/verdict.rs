//! Verdict engine: a total decision table and the per-item state machine.
//!
//! [`decide`] maps evaluator results and conflicts to exactly one
//! [`FinalVerdict`] by walking a fixed priority table:
//!
//! 1. any CRITICAL red flag, or a conflict resolving to reject → `REJECT`
//! 2. DANGEROUS / FORBIDDEN without a configured auto-rule → `HUMAN_QUEUE`
//! 3. CAUTION / CONDITIONAL → `HUMAN_QUEUE`
//! 4. every gate passed → `AUTO_PUBLISH`
//! 5. otherwise → `HUMAN_QUEUE`
//!
//! The last row is unconditional, so the table has no gaps. Nothing here can
//! block on a person: an uncertain item is queued, never asked about.

use serde::{Deserialize, Serialize};

use crate::conflict::{Conflict, ConflictResolution};
use crate::error::{VerdictError, VerdictResult};
use crate::evaluators::safety::RedFlagSeverity;
use crate::evaluators::AgentId;
use crate::model::SafetyClassification;
use crate::policy::EvaluationPolicy;
use crate::report::{self, EvaluatorResult};

/// Routing outcome for one content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinalVerdict {
    AutoPublish,
    HumanQueue,
    Reject,
}

impl std::fmt::Display for FinalVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AutoPublish => write!(f, "AUTO_PUBLISH"),
            Self::HumanQueue => write!(f, "HUMAN_QUEUE"),
            Self::Reject => write!(f, "REJECT"),
        }
    }
}

/// The decision-table row that produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionRule {
    CriticalRedFlag,
    HighRiskClassification,
    ReviewClassification,
    AllGatesPassed,
    Fallback,
}

impl std::fmt::Display for DecisionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CriticalRedFlag => write!(f, "critical_red_flag"),
            Self::HighRiskClassification => write!(f, "high_risk_classification"),
            Self::ReviewClassification => write!(f, "review_classification"),
            Self::AllGatesPassed => write!(f, "all_gates_passed"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub verdict: FinalVerdict,
    pub rule: DecisionRule,
    /// Human-readable reasons, for the reviewer and the logs.
    pub reasons: Vec<String>,
}

impl Decision {
    fn new(verdict: FinalVerdict, rule: DecisionRule, reasons: Vec<String>) -> Self {
        Self {
            verdict,
            rule,
            reasons,
        }
    }
}

/// Apply the decision table.
pub fn decide(
    policy: &EvaluationPolicy,
    classification: SafetyClassification,
    results: &[EvaluatorResult],
    conflicts: &[Conflict],
) -> Decision {
    let critical = critical_reasons(results, conflicts);
    let auto_rule = policy.routing.has_auto_rule(classification);

    match classification {
        _ if !critical.is_empty() => {
            Decision::new(FinalVerdict::Reject, DecisionRule::CriticalRedFlag, critical)
        }
        SafetyClassification::Dangerous | SafetyClassification::Forbidden if !auto_rule => {
            Decision::new(
                FinalVerdict::HumanQueue,
                DecisionRule::HighRiskClassification,
                vec![format!("{classification} content requires human review")],
            )
        }
        SafetyClassification::Caution | SafetyClassification::Conditional => Decision::new(
            FinalVerdict::HumanQueue,
            DecisionRule::ReviewClassification,
            vec![format!("{classification} content is always reviewed")],
        ),
        // SAFE, or a high-risk class with a configured auto-rule.
        _ => {
            let failed = failed_gates(policy, results, conflicts);
            if failed.is_empty() {
                Decision::new(
                    FinalVerdict::AutoPublish,
                    DecisionRule::AllGatesPassed,
                    vec!["all evaluators passed with no conflicts".to_string()],
                )
            } else {
                Decision::new(FinalVerdict::HumanQueue, DecisionRule::Fallback, failed)
            }
        }
    }
}

fn critical_reasons(results: &[EvaluatorResult], conflicts: &[Conflict]) -> Vec<String> {
    let mut reasons: Vec<String> = report::safety_report(results)
        .map(|s| {
            s.red_flags
                .iter()
                .filter(|f| f.severity == RedFlagSeverity::Critical)
                .map(|f| format!("critical red flag {}: {}", f.code, f.description))
                .collect()
        })
        .unwrap_or_default();

    if reasons.is_empty() {
        reasons.extend(
            conflicts
                .iter()
                .filter(|c| c.resolution == ConflictResolution::Reject)
                .map(|c| format!("{} conflict resolves to reject: {}", c.kind, c.description)),
        );
    }
    reasons
}

/// Reasons the AUTO_PUBLISH row does not fire; empty when every gate passes.
fn failed_gates(
    policy: &EvaluationPolicy,
    results: &[EvaluatorResult],
    conflicts: &[Conflict],
) -> Vec<String> {
    let mut failed = Vec::new();

    for agent in AgentId::ALL {
        match report::completed_score(results, agent) {
            Some(score) if score >= policy.thresholds.pass_score => {}
            Some(score) => failed.push(format!(
                "{agent} scored {score} (< {})",
                policy.thresholds.pass_score
            )),
            None => failed.push(format!("{agent} did not complete")),
        }
    }

    match report::automation_judgment(results) {
        Some(j) if j.auto_publishable => {}
        Some(j) => failed.push(format!(
            "not auto-publishable ({} intervention point(s))",
            j.intervention_points.len()
        )),
        None => failed.push("no automation judgment".to_string()),
    }

    if !conflicts.is_empty() {
        failed.push(format!("{} unresolved conflict(s)", conflicts.len()));
    }

    failed
}

/// Lifecycle of one item's verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictState {
    #[default]
    Pending,
    Evaluating,
    Decided(FinalVerdict),
}

impl std::fmt::Display for VerdictState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Evaluating => write!(f, "EVALUATING"),
            Self::Decided(v) => write!(f, "{v}"),
        }
    }
}

/// PENDING → EVALUATING → one terminal verdict. Terminal states are final.
#[derive(Debug, Clone, Default)]
pub struct VerdictMachine {
    state: VerdictState,
}

impl VerdictMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> VerdictState {
        self.state
    }

    pub fn begin(&mut self) -> VerdictResult<()> {
        match self.state {
            VerdictState::Pending => {
                self.state = VerdictState::Evaluating;
                Ok(())
            }
            from => Err(illegal(from, VerdictState::Evaluating)),
        }
    }

    pub fn conclude(&mut self, verdict: FinalVerdict) -> VerdictResult<FinalVerdict> {
        match self.state {
            VerdictState::Evaluating => {
                self.state = VerdictState::Decided(verdict);
                Ok(verdict)
            }
            from => Err(illegal(from, VerdictState::Decided(verdict))),
        }
    }
}

fn illegal(from: VerdictState, to: VerdictState) -> VerdictError {
    VerdictError::IllegalTransition {
        from: from.to_string(),
        to: to.to_string(),
    }
}
