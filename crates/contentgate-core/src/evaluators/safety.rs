//! Safety / red-flag detector.
//!
//! The only evaluator with veto power. Score = food-safety plausibility
//! (0–40) + policy compliance (0–30) + brand compliance (0–30). Independently
//! of the score it emits [`RedFlag`]s; a [`RedFlagSeverity::Critical`] flag is
//! the zero-tolerance trigger the verdict engine rejects on. HIGH and MEDIUM
//! flags only cost points.

use serde::{Deserialize, Serialize};

use super::{first_marker, opinion, AgentId};
use crate::model::{ContentItem, SafetyClassification, SlideType};
use crate::policy::EvaluationPolicy;
use crate::report::{AgentVerdict, EvaluatorDetails, EvaluatorResult};

const PLAUSIBILITY_POINTS: u32 = 40;
const POLICY_POINTS: u32 = 30;
const POLICY_FLAG_PENALTY: u32 = 15;
const LOCAL_NAME: u32 = 10;
const ENGLISH_NAME: u32 = 5;
const COVER_NAMES_TOPIC: u32 = 5;
const CTA_PRESENT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedFlagCategory {
    Safety,
    Policy,
    Brand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RedFlagSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl RedFlagSeverity {
    /// Plausibility points lost for a safety flag of this severity.
    fn safety_penalty(self) -> u32 {
        match self {
            Self::Low => 5,
            Self::Medium => 10,
            Self::High => 20,
            Self::Critical => 40,
        }
    }
}

impl std::fmt::Display for RedFlagSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// A detected safety, policy or brand violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedFlag {
    pub category: RedFlagCategory,
    pub severity: RedFlagSeverity,
    /// Stable machine-readable code, e.g. `missing_danger_warning`.
    pub code: String,
    pub description: String,
}

impl RedFlag {
    fn new(
        category: RedFlagCategory,
        severity: RedFlagSeverity,
        code: &str,
        description: impl Into<String>,
    ) -> Self {
        Self {
            category,
            severity,
            code: code.to_string(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyReport {
    /// 0–40
    pub food_safety: u8,
    /// 0–30
    pub policy_compliance: u8,
    /// 0–30
    pub brand_compliance: u8,
    pub red_flags: Vec<RedFlag>,
}

impl SafetyReport {
    pub fn total(&self) -> u32 {
        self.food_safety as u32 + self.policy_compliance as u32 + self.brand_compliance as u32
    }

    pub fn has_critical(&self) -> bool {
        self.red_flags
            .iter()
            .any(|f| f.severity == RedFlagSeverity::Critical)
    }

    /// Worst severity among the flags.
    pub fn max_severity(&self) -> Option<RedFlagSeverity> {
        self.red_flags.iter().map(|f| f.severity).max()
    }
}

pub fn evaluate(item: &ContentItem, policy: &EvaluationPolicy) -> EvaluatorResult {
    let mut red_flags = Vec::new();

    let food_safety = food_safety(item, policy, &mut red_flags);
    let policy_compliance = policy_compliance(item, policy, &mut red_flags);
    let brand_compliance = brand_compliance(item, &mut red_flags);

    let report = SafetyReport {
        food_safety: food_safety as u8,
        policy_compliance: policy_compliance as u8,
        brand_compliance: brand_compliance as u8,
        red_flags,
    };

    let findings: Vec<String> = report
        .red_flags
        .iter()
        .map(|f| format!("[{}] {}: {}", f.severity, f.code, f.description))
        .collect();
    let issues: Vec<String> = report
        .red_flags
        .iter()
        .filter(|f| f.severity >= RedFlagSeverity::High)
        .map(|f| f.description.clone())
        .collect();
    let veto = report.has_critical();

    let mut result = EvaluatorResult::completed(
        AgentId::SafetyDetector,
        report.total(),
        EvaluatorDetails::Safety(report),
    );
    result.verdict = Some(if veto {
        AgentVerdict::Veto
    } else {
        opinion(result.score, policy)
    });
    result.findings = findings;
    result.issues = issues;
    result
}

fn food_safety(item: &ContentItem, policy: &EvaluationPolicy, flags: &mut Vec<RedFlag>) -> u32 {
    let class = item.safety_classification;
    let mut raised = Vec::new();

    if class.is_high_risk()
        && first_marker(&item.warning_text(), &policy.safety.danger_markers).is_none()
    {
        raised.push(RedFlag::new(
            RedFlagCategory::Safety,
            RedFlagSeverity::Critical,
            "missing_danger_warning",
            format!("{class} subject without an explicit danger warning"),
        ));
    }

    if item.has_amount_guide() {
        match class {
            SafetyClassification::Forbidden => raised.push(RedFlag::new(
                RedFlagCategory::Safety,
                RedFlagSeverity::Critical,
                "feeding_guide_for_forbidden",
                "feeding amounts given for a FORBIDDEN subject",
            )),
            SafetyClassification::Dangerous => raised.push(RedFlag::new(
                RedFlagCategory::Safety,
                RedFlagSeverity::High,
                "feeding_guide_for_dangerous",
                "feeding amounts given for a DANGEROUS subject",
            )),
            _ => {}
        }
    }

    if class.requires_review() && !item.has_caution_text() {
        raised.push(RedFlag::new(
            RedFlagCategory::Safety,
            RedFlagSeverity::High,
            "missing_caution",
            format!("{class} subject without stated cautions"),
        ));
    }

    let penalty: u32 = raised.iter().map(|f| f.severity.safety_penalty()).sum();
    flags.extend(raised);
    PLAUSIBILITY_POINTS.saturating_sub(penalty)
}

fn policy_compliance(item: &ContentItem, policy: &EvaluationPolicy, flags: &mut Vec<RedFlag>) -> u32 {
    let text = item.all_text();
    let mut raised = Vec::new();

    if first_marker(&text, &policy.safety.disclosure_markers).is_none() {
        raised.push(RedFlag::new(
            RedFlagCategory::Policy,
            RedFlagSeverity::Medium,
            "missing_disclosure",
            "mandatory veterinary disclosure not found",
        ));
    }

    if item.safety_classification != SafetyClassification::Safe {
        if let Some(claim) = first_marker(&text, &policy.safety.absolute_safety_claims) {
            raised.push(RedFlag::new(
                RedFlagCategory::Policy,
                RedFlagSeverity::High,
                "contradictory_claim",
                format!(
                    "'{claim}' contradicts the {} classification",
                    item.safety_classification
                ),
            ));
        }
    }

    if let Some(claim) = first_marker(&text, &policy.safety.medical_claims) {
        raised.push(RedFlag::new(
            RedFlagCategory::Policy,
            RedFlagSeverity::High,
            "medical_claim",
            format!("medical claim '{claim}'"),
        ));
    }

    let penalty = POLICY_FLAG_PENALTY * raised.len() as u32;
    flags.extend(raised);
    POLICY_POINTS.saturating_sub(penalty)
}

fn brand_compliance(item: &ContentItem, flags: &mut Vec<RedFlag>) -> u32 {
    let mut score = 0;

    if !item.topic_kr.trim().is_empty() {
        score += LOCAL_NAME;
    } else {
        flags.push(RedFlag::new(
            RedFlagCategory::Brand,
            RedFlagSeverity::Low,
            "missing_localized_name",
            "korean topic name missing",
        ));
    }

    if !item.topic_en.trim().is_empty() {
        score += ENGLISH_NAME;
    } else {
        flags.push(RedFlag::new(
            RedFlagCategory::Brand,
            RedFlagSeverity::Low,
            "missing_english_name",
            "english topic name missing",
        ));
    }

    let cover_title = item
        .slides
        .iter()
        .find(|s| s.slide_type == SlideType::Cover)
        .and_then(|s| s.title_text())
        .map(str::to_lowercase)
        .unwrap_or_default();
    let names = [item.topic_kr.trim(), item.topic_en.trim()];
    if names
        .iter()
        .any(|n| !n.is_empty() && cover_title.contains(&n.to_lowercase()))
    {
        score += COVER_NAMES_TOPIC;
    } else {
        flags.push(RedFlag::new(
            RedFlagCategory::Brand,
            RedFlagSeverity::Low,
            "cover_missing_topic",
            "cover title does not name the topic",
        ));
    }

    if item.has_slide_type(SlideType::Cta) {
        score += CTA_PRESENT;
    } else {
        flags.push(RedFlag::new(
            RedFlagCategory::Brand,
            RedFlagSeverity::Medium,
            "missing_cta",
            "no call-to-action slide",
        ));
    }

    score
}
