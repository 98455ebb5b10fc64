//! Conflict detection across evaluator outputs.
//!
//! Each conflict kind is a named predicate over the five results. A predicate
//! only fires on details from evaluators that completed; an unavailable
//! result never produces a conflict. Every detected conflict is unresolved;
//! the verdict engine routes on them, it never resolves them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::evaluators::safety::RedFlagSeverity;
use crate::evaluators::AgentId;
use crate::model::ContentItem;
use crate::policy::EvaluationPolicy;
use crate::report::{self, EvaluatorResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// Automation says publish, safety raised a serious flag.
    Judgment,
    /// Automation says publish, quality is below the conflict threshold.
    Quality,
    /// Automation says publish, the deck is over budget.
    Budget,
    /// Two distinct items requested the same publish slot (batch only).
    Timing,
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Judgment => write!(f, "judgment"),
            Self::Quality => write!(f, "quality"),
            Self::Budget => write!(f, "budget"),
            Self::Timing => write!(f, "timing"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl From<RedFlagSeverity> for ConflictSeverity {
    fn from(severity: RedFlagSeverity) -> Self {
        match severity {
            RedFlagSeverity::Low => Self::Low,
            RedFlagSeverity::Medium => Self::Medium,
            RedFlagSeverity::High => Self::High,
            RedFlagSeverity::Critical => Self::Critical,
        }
    }
}

impl std::fmt::Display for ConflictSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    HoldForReview,
    Reject,
}

impl std::fmt::Display for ConflictResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HoldForReview => write!(f, "hold_for_review"),
            Self::Reject => write!(f, "reject"),
        }
    }
}

/// A contradiction between evaluators, or between items in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub kind: ConflictKind,
    pub agents_involved: Vec<AgentId>,
    /// Other content ids involved. Only populated for timing conflicts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_content: Vec<String>,
    pub description: String,
    pub severity: ConflictSeverity,
    pub resolution: ConflictResolution,
}

/// Run every per-item conflict predicate over one set of evaluator results.
pub fn detect_conflicts(results: &[EvaluatorResult], policy: &EvaluationPolicy) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    let auto_publishable = report::automation_judgment(results)
        .map(|j| j.auto_publishable)
        .unwrap_or(false);
    if !auto_publishable {
        return conflicts;
    }

    if let Some(worst) = report::safety_report(results)
        .and_then(|s| s.max_severity())
        .filter(|s| *s >= RedFlagSeverity::High)
    {
        conflicts.push(Conflict {
            kind: ConflictKind::Judgment,
            agents_involved: vec![AgentId::AutomationJudge, AgentId::SafetyDetector],
            related_content: Vec::new(),
            description: format!(
                "automation judged the item auto-publishable but safety raised a {worst} red flag"
            ),
            severity: worst.into(),
            resolution: if worst == RedFlagSeverity::Critical {
                ConflictResolution::Reject
            } else {
                ConflictResolution::HoldForReview
            },
        });
    }

    if let Some(quality) = report::completed_score(results, AgentId::QualityScorer)
        .filter(|q| *q < policy.thresholds.quality_conflict_score)
    {
        conflicts.push(Conflict {
            kind: ConflictKind::Quality,
            agents_involved: vec![AgentId::AutomationJudge, AgentId::QualityScorer],
            related_content: Vec::new(),
            description: format!(
                "automation judged the item auto-publishable but quality scored {quality} (< {})",
                policy.thresholds.quality_conflict_score
            ),
            severity: ConflictSeverity::High,
            resolution: ConflictResolution::HoldForReview,
        });
    }

    if let Some(cost) = report::cost_report(results).filter(|c| !c.budget_compliant) {
        conflicts.push(Conflict {
            kind: ConflictKind::Budget,
            agents_involved: vec![AgentId::AutomationJudge, AgentId::CostEstimator],
            related_content: Vec::new(),
            description: format!(
                "automation judged the item auto-publishable but cost {:.4} exceeds budget {:.4}",
                cost.total_cost, cost.budget
            ),
            severity: ConflictSeverity::Medium,
            resolution: ConflictResolution::HoldForReview,
        });
    }

    conflicts
}

/// One batch entry's claim on a publish slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRequest {
    pub content_id: String,
    /// [`ContentItem::content_digest`](crate::model::ContentItem::content_digest)
    pub content_digest: String,
    pub publish_slot: Option<DateTime<Utc>>,
}

impl SlotRequest {
    pub fn new(item: &ContentItem) -> Self {
        Self {
            content_id: item.content_id(),
            content_digest: item.content_digest(),
            publish_slot: item.publish_slot,
        }
    }

    fn same_item(&self, other: &SlotRequest) -> bool {
        self.content_id == other.content_id && self.content_digest == other.content_digest
    }

    /// How a conflicting item is named to the others. A different item
    /// reusing this id is told apart by a digest prefix.
    fn label_for(&self, other: &SlotRequest) -> String {
        if self.content_id == other.content_id {
            let short = other.content_digest.get(..8).unwrap_or(&other.content_digest);
            format!("{} ({short})", other.content_id)
        } else {
            other.content_id.clone()
        }
    }
}

/// Cross-item timing check for a batch.
///
/// Returns one conflict list per request, in batch order. Requests sharing a
/// slot with at least one *distinct* item get a single timing conflict naming
/// the others. Repeated submissions of the same item (same id and digest)
/// never conflict with each other; two different items reusing one id do.
pub fn detect_timing_conflicts(requests: &[SlotRequest]) -> Vec<Vec<Conflict>> {
    let mut by_slot: BTreeMap<DateTime<Utc>, Vec<&SlotRequest>> = BTreeMap::new();
    for request in requests {
        if let Some(slot) = request.publish_slot {
            by_slot.entry(slot).or_default().push(request);
        }
    }

    requests
        .iter()
        .map(|request| {
            let Some(slot) = request.publish_slot else {
                return Vec::new();
            };
            let mut others: Vec<String> = by_slot
                .get(&slot)
                .into_iter()
                .flatten()
                .filter(|other| !request.same_item(other))
                .map(|other| request.label_for(other))
                .collect();
            others.sort();
            others.dedup();
            if others.is_empty() {
                return Vec::new();
            }
            vec![Conflict {
                kind: ConflictKind::Timing,
                agents_involved: Vec::new(),
                description: format!(
                    "publish slot {} is also requested by {}",
                    slot.to_rfc3339(),
                    others.join(", ")
                ),
                related_content: others,
                severity: ConflictSeverity::Low,
                resolution: ConflictResolution::HoldForReview,
            }]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluators::automation::AutomationJudgment;
    use crate::evaluators::cost::CostReport;
    use crate::evaluators::quality::QualityBreakdown;
    use crate::evaluators::safety::{RedFlag, RedFlagCategory, SafetyReport};
    use crate::report::{EvaluatorDetails, EvaluatorStatus};
    use chrono::TimeZone;

    fn results(auto: bool, quality: u32, flags: Vec<RedFlagSeverity>, compliant: bool) -> Vec<EvaluatorResult> {
        let automation = AutomationJudgment {
            template_compatibility: 40,
            automation_readiness: 30,
            intervention_risk: 30,
            matched_template: Some(4),
            intervention_points: Vec::new(),
            auto_publishable: auto,
        };
        let safety = SafetyReport {
            food_safety: 40,
            policy_compliance: 30,
            brand_compliance: 30,
            red_flags: flags
                .into_iter()
                .map(|severity| RedFlag {
                    category: RedFlagCategory::Safety,
                    severity,
                    code: "test".to_string(),
                    description: "test flag".to_string(),
                })
                .collect(),
        };
        let cost = CostReport {
            images: 4,
            overlay_ops: 4,
            total_cost: if compliant { 0.19 } else { 0.9 },
            cost_per_slide: 0.0475,
            baseline_cost: 0.325,
            budget: 0.5,
            budget_compliant: compliant,
            efficiency_score: 100,
        };
        let quality_details = QualityBreakdown {
            accuracy: 20,
            tone: 20,
            format: 20,
            coherence: 20,
            policy_compliance: 20,
        };
        vec![
            EvaluatorResult::completed(AgentId::QualityScorer, quality, EvaluatorDetails::Quality(quality_details)),
            EvaluatorResult::completed(AgentId::AutomationJudge, 100, EvaluatorDetails::Automation(automation)),
            EvaluatorResult::completed(AgentId::SafetyDetector, 100, EvaluatorDetails::Safety(safety)),
            EvaluatorResult::completed(AgentId::CostEstimator, 100, EvaluatorDetails::Cost(cost)),
        ]
    }

    #[test]
    fn test_clean_results_have_no_conflicts() {
        let policy = EvaluationPolicy::default();
        assert!(detect_conflicts(&results(true, 100, vec![], true), &policy).is_empty());
    }

    #[test]
    fn test_nothing_conflicts_without_auto_publish_claim() {
        let policy = EvaluationPolicy::default();
        let r = results(false, 10, vec![RedFlagSeverity::Critical], false);
        assert!(detect_conflicts(&r, &policy).is_empty());
    }

    #[test]
    fn test_judgment_conflict_mirrors_worst_flag() {
        let policy = EvaluationPolicy::default();
        let r = results(true, 100, vec![RedFlagSeverity::Medium, RedFlagSeverity::High], true);
        let conflicts = detect_conflicts(&r, &policy);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::Judgment);
        assert_eq!(conflicts[0].severity, ConflictSeverity::High);
        assert_eq!(conflicts[0].resolution, ConflictResolution::HoldForReview);

        let r = results(true, 100, vec![RedFlagSeverity::Critical], true);
        let conflicts = detect_conflicts(&r, &policy);
        assert_eq!(conflicts[0].resolution, ConflictResolution::Reject);
    }

    #[test]
    fn test_medium_flags_alone_do_not_conflict() {
        let policy = EvaluationPolicy::default();
        let r = results(true, 100, vec![RedFlagSeverity::Medium], true);
        assert!(detect_conflicts(&r, &policy).is_empty());
    }

    #[test]
    fn test_quality_and_budget_conflicts() {
        let policy = EvaluationPolicy::default();
        let conflicts = detect_conflicts(&results(true, 60, vec![], false), &policy);
        let kinds: Vec<ConflictKind> = conflicts.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![ConflictKind::Quality, ConflictKind::Budget]);
    }

    #[test]
    fn test_unavailable_quality_never_conflicts() {
        let policy = EvaluationPolicy::default();
        let mut r = results(true, 60, vec![], true);
        r[0] = EvaluatorResult::failed(AgentId::QualityScorer, EvaluatorStatus::Timeout, "slow", 5000);
        assert!(detect_conflicts(&r, &policy).is_empty());
    }

    fn request(id: &str, digest: &str, slot: Option<DateTime<Utc>>) -> SlotRequest {
        SlotRequest {
            content_id: id.to_string(),
            content_digest: digest.to_string(),
            publish_slot: slot,
        }
    }

    #[test]
    fn test_timing_conflicts_need_distinct_items() {
        let slot = Utc.with_ymd_and_hms(2026, 10, 20, 9, 0, 0).single();
        let other = Utc.with_ymd_and_hms(2026, 10, 20, 18, 0, 0).single();
        let requests = vec![
            request("a", "aaaa", slot),
            request("b", "bbbb", slot),
            request("c", "cccc", other),
            request("c", "cccc", other),
            request("d", "dddd", None),
        ];
        let conflicts = detect_timing_conflicts(&requests);
        assert_eq!(conflicts.len(), 5);
        assert_eq!(conflicts[0][0].related_content, vec!["b".to_string()]);
        assert_eq!(conflicts[1][0].related_content, vec!["a".to_string()]);
        assert_eq!(conflicts[1][0].severity, ConflictSeverity::Low);
        assert!(conflicts[2].is_empty());
        assert!(conflicts[3].is_empty());
        assert!(conflicts[4].is_empty());
    }

    #[test]
    fn test_reused_id_with_different_content_conflicts() {
        let slot = Utc.with_ymd_and_hms(2026, 10, 20, 9, 0, 0).single();
        let requests = vec![
            request("pumpkin-01", "0123456789abcdef", slot),
            request("pumpkin-01", "fedcba9876543210", slot),
        ];
        let conflicts = detect_timing_conflicts(&requests);
        assert_eq!(
            conflicts[0][0].related_content,
            vec!["pumpkin-01 (fedcba98)".to_string()]
        );
        assert_eq!(
            conflicts[1][0].related_content,
            vec!["pumpkin-01 (01234567)".to_string()]
        );
    }
}
