//! Automation judge.
//!
//! Decides whether an item can flow to publishing without a person touching
//! it. Quality is someone else's job. Score = template compatibility (0–40) +
//! automation readiness (0–30) + intervention risk (0–30).
//!
//! Every condition a reviewer would have to sort out becomes one
//! human-readable intervention point. Intervention points are only read by the
//! verdict engine and, for queued items, by the reviewer; the judge is never
//! re-invoked to resolve them.

use serde::{Deserialize, Serialize};

use super::{first_marker, opinion, proportional, AgentId};
use crate::model::ContentItem;
use crate::policy::EvaluationPolicy;
use crate::report::{EvaluatorDetails, EvaluatorResult};

const TEMPLATE_POINTS: u32 = 40;
const READINESS_POINTS: u32 = 30;
const RISK_POINTS: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationJudgment {
    /// 0–40
    pub template_compatibility: u8,
    /// 0–30
    pub automation_readiness: u8,
    /// 0–30
    pub intervention_risk: u8,
    /// Approved template the deck matches, if any.
    pub matched_template: Option<usize>,
    pub intervention_points: Vec<String>,
    pub auto_publishable: bool,
}

impl AutomationJudgment {
    pub fn total(&self) -> u32 {
        self.template_compatibility as u32
            + self.automation_readiness as u32
            + self.intervention_risk as u32
    }
}

pub fn evaluate(item: &ContentItem, policy: &EvaluationPolicy) -> EvaluatorResult {
    let mut intervention_points = Vec::new();
    let mut findings = Vec::new();

    let (template, matched_template) = template_compatibility(item, policy);
    match matched_template {
        Some(n) => findings.push(format!("matches approved {n}-slide template")),
        None => findings.push(format!(
            "{} slides match no approved template {:?}",
            item.slides.len(),
            policy.automation.approved_slide_counts
        )),
    }

    let readiness = automation_readiness(item, policy, &mut intervention_points);
    let risk = intervention_risk(item, policy, &mut intervention_points);

    let mut judgment = AutomationJudgment {
        template_compatibility: template as u8,
        automation_readiness: readiness as u8,
        intervention_risk: risk as u8,
        matched_template,
        intervention_points,
        auto_publishable: false,
    };
    let score = judgment.total();
    judgment.auto_publishable = score >= policy.thresholds.auto_publish_score as u32
        && judgment.intervention_points.is_empty();

    let warnings = judgment.intervention_points.clone();
    let auto_publishable = judgment.auto_publishable;

    let mut result = EvaluatorResult::completed(
        AgentId::AutomationJudge,
        score,
        EvaluatorDetails::Automation(judgment),
    );
    result.verdict = Some(opinion(result.score, policy));
    findings.push(format!("auto_publishable = {auto_publishable}"));
    result.findings = findings;
    result.warnings = warnings;
    result
}

fn template_compatibility(item: &ContentItem, policy: &EvaluationPolicy) -> (u32, Option<usize>) {
    let count = item.slides.len();
    if count == 0 {
        return (0, None);
    }
    if policy.automation.approved_slide_counts.contains(&count) {
        (TEMPLATE_POINTS, Some(count))
    } else {
        (policy.automation.non_standard_credit as u32, None)
    }
}

/// Distinct ambiguity tokens in `amount_guide`, longest first so that a
/// token contained in a longer one is not counted twice.
pub fn ambiguity_tokens<'a>(amount_guide: &str, policy: &'a EvaluationPolicy) -> Vec<&'a str> {
    let mut tokens: Vec<&String> = policy.automation.ambiguity_tokens.iter().collect();
    tokens.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));

    let mut remaining = amount_guide.to_lowercase();
    let mut matched = Vec::new();
    for token in tokens {
        let needle = token.to_lowercase();
        if !needle.is_empty() && remaining.contains(&needle) {
            remaining = remaining.replace(&needle, " ");
            matched.push(token.as_str());
        }
    }
    matched
}

fn automation_readiness(
    item: &ContentItem,
    policy: &EvaluationPolicy,
    intervention_points: &mut Vec<String>,
) -> u32 {
    if !item.has_amount_guide() {
        intervention_points.push("REVIEW: amount guide missing".to_string());
        return 0;
    }

    let tokens = ambiguity_tokens(&item.amount_guide, policy);
    for token in &tokens {
        intervention_points.push(format!(
            "REVIEW: amount guide formatting unclear ('{token}')"
        ));
    }
    let penalty = policy.automation.ambiguity_penalty as u32 * tokens.len() as u32;
    READINESS_POINTS.saturating_sub(penalty)
}

fn intervention_risk(
    item: &ContentItem,
    policy: &EvaluationPolicy,
    intervention_points: &mut Vec<String>,
) -> u32 {
    let class = item.safety_classification;
    let mut checks: Vec<(&str, bool)> = vec![
        ("korean topic name", !item.topic_kr.trim().is_empty()),
        ("english topic name", !item.topic_en.trim().is_empty()),
        ("caption text", !item.captions.text.trim().is_empty()),
        (
            "caption hashtags",
            item.captions.hashtags.iter().any(|h| !h.trim().is_empty()),
        ),
    ];
    if class != crate::model::SafetyClassification::Safe {
        checks.push(("stated cautions", item.has_caution_text()));
    }
    if class.is_high_risk() {
        checks.push((
            "danger warning",
            first_marker(&item.warning_text(), &policy.safety.danger_markers).is_some(),
        ));
    }

    let required = checks.len();
    let mut present = 0;
    for (field, ok) in checks {
        if ok {
            present += 1;
        } else {
            intervention_points.push(format!("REVIEW: missing {field} for {class} content"));
        }
    }
    proportional(RISK_POINTS, present, required)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Captions, SafetyClassification, Slide, SlideType};

    fn item(slides: usize, amount_guide: &str) -> ContentItem {
        let mut deck = vec![Slide::new(SlideType::Cover, "고구마", "먹어도 돼요")];
        for i in 0..slides.saturating_sub(2) {
            deck.push(Slide::new(SlideType::Content, &format!("내용 {i}"), "설명"));
        }
        deck.push(Slide::new(SlideType::Cta, "저장", "팔로우"));
        ContentItem {
            id: Some("sweet-potato".to_string()),
            topic_kr: "고구마".to_string(),
            topic_en: "sweet potato".to_string(),
            safety_classification: SafetyClassification::Safe,
            slides: deck,
            captions: Captions {
                text: "고구마 가이드".to_string(),
                hashtags: vec!["#고구마".to_string()],
            },
            amount_guide: amount_guide.to_string(),
            benefits: vec![],
            cautions: vec![],
            publish_slot: None,
        }
    }

    fn judgment(r: &EvaluatorResult) -> AutomationJudgment {
        match &r.details {
            EvaluatorDetails::Automation(j) => j.clone(),
            other => panic!("unexpected details {other:?}"),
        }
    }

    #[test]
    fn test_clean_guide_is_auto_publishable() {
        let r = evaluate(&item(4, "소형 2조각 | 중형 3조각 | 대형 4조각"), &EvaluationPolicy::default());
        let j = judgment(&r);
        assert_eq!(r.score, 100);
        assert!(j.auto_publishable);
        assert!(j.intervention_points.is_empty());
        assert_eq!(j.matched_template, Some(4));
    }

    #[test]
    fn test_ambiguity_token_adds_one_intervention_point() {
        let r = evaluate(&item(10, "체중 5kg당 1-2조각"), &EvaluationPolicy::default());
        let j = judgment(&r);
        assert_eq!(j.intervention_points.len(), 1);
        assert!(j.intervention_points[0].starts_with("REVIEW: amount guide formatting unclear"));
        assert!(!j.auto_publishable);
        assert_eq!(j.automation_readiness, 20);
    }

    #[test]
    fn test_overlapping_tokens_count_once() {
        let policy = EvaluationPolicy::default();
        assert_eq!(ambiguity_tokens("적당량 급여", &policy), vec!["적당량"]);
        assert_eq!(ambiguity_tokens("조금 또는 약간", &policy).len(), 2);
    }

    #[test]
    fn test_non_standard_count_gets_partial_credit() {
        let j = judgment(&evaluate(&item(5, "소형 1조각"), &EvaluationPolicy::default()));
        assert_eq!(j.template_compatibility, 20);
        assert_eq!(j.matched_template, None);
    }

    #[test]
    fn test_missing_amount_guide_is_intervention() {
        let j = judgment(&evaluate(&item(4, "  "), &EvaluationPolicy::default()));
        assert_eq!(j.automation_readiness, 0);
        assert_eq!(j.intervention_points, vec!["REVIEW: amount guide missing".to_string()]);
        assert!(!j.auto_publishable);
    }

    #[test]
    fn test_high_risk_requires_danger_warning() {
        let mut it = item(4, "급여 금지");
        it.safety_classification = SafetyClassification::Forbidden;
        it.cautions = vec!["익혀서".to_string()];
        let j = judgment(&evaluate(&it, &EvaluationPolicy::default()));
        assert!(j
            .intervention_points
            .iter()
            .any(|p| p.contains("danger warning")));
        assert_eq!(j.intervention_risk, 25);
    }
}
