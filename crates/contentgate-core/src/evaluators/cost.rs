//! Cost estimator.
//!
//! `total_cost = images × image_unit_price + overlay_ops × overlay_unit_price
//! + storage_cost`. One image per slide; one overlay pass per slide that
//! carries text. The efficiency score runs 0–105: decks cheaper than the
//! baseline template earn up to five bonus points. The evaluator score is the
//! efficiency clamped to 100, and an over-budget deck never scores a pass.

use serde::{Deserialize, Serialize};

use super::{opinion, AgentId};
use crate::model::ContentItem;
use crate::policy::EvaluationPolicy;
use crate::report::{EvaluatorDetails, EvaluatorResult};

const MAX_BONUS: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostReport {
    pub images: usize,
    pub overlay_ops: usize,
    pub total_cost: f64,
    pub cost_per_slide: f64,
    pub baseline_cost: f64,
    pub budget: f64,
    pub budget_compliant: bool,
    /// 0–105
    pub efficiency_score: u8,
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

/// Price a deck under the policy's cost model.
pub fn estimate(item: &ContentItem, policy: &EvaluationPolicy) -> CostReport {
    let prices = &policy.cost;
    let images = item.slides.len();
    let overlay_ops = item.slides.iter().filter(|s| !s.text().is_empty()).count();

    let total_cost = images as f64 * prices.image_unit_price
        + overlay_ops as f64 * prices.overlay_unit_price
        + prices.storage_cost;
    let baseline_cost = prices.baseline_slides as f64
        * (prices.image_unit_price + prices.overlay_unit_price)
        + prices.storage_cost;

    let efficiency = if baseline_cost <= 0.0 {
        100.0
    } else if total_cost <= baseline_cost {
        100.0 + ((baseline_cost - total_cost) / baseline_cost * 10.0).round().min(MAX_BONUS)
    } else {
        (100.0 - ((total_cost - baseline_cost) / baseline_cost * 50.0).round()).max(0.0)
    };

    CostReport {
        images,
        overlay_ops,
        total_cost: round4(total_cost),
        cost_per_slide: if images == 0 {
            0.0
        } else {
            round4(total_cost / images as f64)
        },
        baseline_cost: round4(baseline_cost),
        budget: prices.per_item_budget,
        budget_compliant: total_cost <= prices.per_item_budget,
        efficiency_score: efficiency as u8,
    }
}

pub fn evaluate(item: &ContentItem, policy: &EvaluationPolicy) -> EvaluatorResult {
    let report = estimate(item, policy);

    let mut findings = vec![format!(
        "total {:.4} for {} slide(s), {:.4}/slide, baseline {:.4}",
        report.total_cost, report.images, report.cost_per_slide, report.baseline_cost
    )];
    let mut issues = Vec::new();
    if report.budget_compliant {
        findings.push(format!("within budget {:.4}", report.budget));
    } else {
        issues.push(format!(
            "total cost {:.4} exceeds budget {:.4}",
            report.total_cost, report.budget
        ));
    }

    let mut score = report.efficiency_score as u32;
    if !report.budget_compliant {
        score = score.min(policy.thresholds.pass_score.saturating_sub(1) as u32);
    }

    let mut result = EvaluatorResult::completed(
        AgentId::CostEstimator,
        score,
        EvaluatorDetails::Cost(report),
    );
    result.verdict = Some(opinion(result.score, policy));
    result.findings = findings;
    result.issues = issues;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::AgentVerdict;
    use crate::model::{Captions, SafetyClassification, Slide, SlideType};

    fn deck(slides: usize) -> ContentItem {
        ContentItem {
            id: Some("banana".to_string()),
            topic_kr: "바나나".to_string(),
            topic_en: "banana".to_string(),
            safety_classification: SafetyClassification::Safe,
            slides: (0..slides)
                .map(|i| Slide::new(SlideType::Content, &format!("s{i}"), "text"))
                .collect(),
            captions: Captions::default(),
            amount_guide: String::new(),
            benefits: vec![],
            cautions: vec![],
            publish_slot: None,
        }
    }

    #[test]
    fn test_four_slides_below_baseline_earn_bonus() {
        let report = estimate(&deck(4), &EvaluationPolicy::default());
        assert!((report.total_cost - 0.19).abs() < 1e-9);
        assert!(report.budget_compliant);
        assert_eq!(report.efficiency_score, 104);
    }

    #[test]
    fn test_evaluator_score_is_clamped() {
        let r = evaluate(&deck(4), &EvaluationPolicy::default());
        assert_eq!(r.score, 100);
    }

    #[test]
    fn test_over_budget_is_flagged() {
        let report = estimate(&deck(12), &EvaluationPolicy::default());
        assert!(!report.budget_compliant);
        assert!(report.efficiency_score < 100);

        let r = evaluate(&deck(12), &EvaluationPolicy::default());
        assert!(r.issues.iter().any(|i| i.contains("exceeds budget")));
    }

    #[test]
    fn test_over_budget_never_passes() {
        let policy = EvaluationPolicy::default();
        let report = estimate(&deck(11), &policy);
        assert!(!report.budget_compliant);
        assert!(report.efficiency_score >= policy.thresholds.pass_score);

        let r = evaluate(&deck(11), &policy);
        assert_eq!(r.score, policy.thresholds.pass_score - 1);
        assert_eq!(r.verdict, Some(AgentVerdict::Review));
    }

    #[test]
    fn test_textless_slides_skip_overlay() {
        let mut item = deck(4);
        item.slides[0].title = None;
        item.slides[0].subtitle = None;
        let report = estimate(&item, &EvaluationPolicy::default());
        assert_eq!(report.overlay_ops, 3);
        assert_eq!(report.images, 4);
    }

    #[test]
    fn test_empty_deck_costs_storage_only() {
        let report = estimate(&deck(0), &EvaluationPolicy::default());
        assert_eq!(report.cost_per_slide, 0.0);
        assert!((report.total_cost - 0.01).abs() < 1e-9);
    }
}
