//! The five independent evaluators.
//!
//! Each evaluator is a pure function `(&ContentItem, &EvaluationPolicy) ->
//! EvaluatorResult`. [`AgentId`] is the tagged set that names them and
//! dispatches to the right function; the coordinator fans out over
//! [`AgentId::ALL`].
//!
//! - [`structure`]: slide shape and required fields
//! - [`quality`]: five 20-point quality dimensions
//! - [`automation`]: template fit, ambiguity, intervention points
//! - [`safety`]: red flags; the only evaluator with veto power
//! - [`cost`]: rendering cost and budget compliance

pub mod automation;
pub mod cost;
pub mod quality;
pub mod safety;
pub mod structure;

use serde::{Deserialize, Serialize};

use crate::model::ContentItem;
use crate::policy::EvaluationPolicy;
use crate::report::{AgentVerdict, EvaluatorResult};

/// Identifier of one of the five evaluators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentId {
    StructureChecker,
    QualityScorer,
    AutomationJudge,
    SafetyDetector,
    CostEstimator,
}

impl AgentId {
    /// Fixed fan-out order; also the order of `EvaluationResult::evaluator_results`.
    pub const ALL: [AgentId; 5] = [
        Self::StructureChecker,
        Self::QualityScorer,
        Self::AutomationJudge,
        Self::SafetyDetector,
        Self::CostEstimator,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::StructureChecker => 0,
            Self::QualityScorer => 1,
            Self::AutomationJudge => 2,
            Self::SafetyDetector => 3,
            Self::CostEstimator => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::StructureChecker => "structure_checker",
            Self::QualityScorer => "quality_scorer",
            Self::AutomationJudge => "automation_judge",
            Self::SafetyDetector => "safety_detector",
            Self::CostEstimator => "cost_estimator",
        }
    }

    /// Run this evaluator synchronously.
    pub fn evaluate(self, item: &ContentItem, policy: &EvaluationPolicy) -> EvaluatorResult {
        match self {
            Self::StructureChecker => structure::evaluate(item, policy),
            Self::QualityScorer => quality::evaluate(item, policy),
            Self::AutomationJudge => automation::evaluate(item, policy),
            Self::SafetyDetector => safety::evaluate(item, policy),
            Self::CostEstimator => cost::evaluate(item, policy),
        }
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pass/review opinion from a score.
pub(crate) fn opinion(score: u8, policy: &EvaluationPolicy) -> AgentVerdict {
    if score >= policy.thresholds.pass_score {
        AgentVerdict::Pass
    } else {
        AgentVerdict::Review
    }
}

/// `points * part / whole`, floored; `0` when `whole == 0`.
pub(crate) fn proportional(points: u32, part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    (points as usize * part.min(whole) / whole) as u32
}

/// Case-insensitive substring match against any marker.
pub(crate) fn first_marker<'a>(text: &str, markers: &'a [String]) -> Option<&'a str> {
    let haystack = text.to_lowercase();
    markers
        .iter()
        .find(|m| !m.is_empty() && haystack.contains(&m.to_lowercase()))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_all_order() {
        for (i, agent) in AgentId::ALL.iter().enumerate() {
            assert_eq!(agent.index(), i);
        }
    }

    #[test]
    fn test_agent_serde_uses_snake_case() {
        let json = serde_json::to_string(&AgentId::SafetyDetector).unwrap();
        assert_eq!(json, "\"safety_detector\"");
        assert_eq!(AgentId::SafetyDetector.to_string(), "safety_detector");
    }

    #[test]
    fn test_proportional() {
        assert_eq!(proportional(30, 7, 8), 26);
        assert_eq!(proportional(30, 8, 8), 30);
        assert_eq!(proportional(30, 0, 0), 0);
        assert_eq!(proportional(20, 5, 3), 20);
    }

    #[test]
    fn test_first_marker_case_insensitive() {
        let markers = vec!["Toxic".to_string(), "위험".to_string()];
        assert_eq!(first_marker("highly TOXIC for dogs", &markers), Some("Toxic"));
        assert_eq!(first_marker("절대 위험해요", &markers), Some("위험"));
        assert_eq!(first_marker("fine", &markers), None);
    }
}
