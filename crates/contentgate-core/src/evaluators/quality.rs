//! Quality scorer: five fixed 20-point dimensions.
//!
//! | Dimension          | Checks                                                    |
//! |--------------------|-----------------------------------------------------------|
//! | accuracy           | classification consistent with stated benefits/cautions   |
//! | tone               | emotive markers within the policy bound                   |
//! | format             | title/subtitle character-length bounds                    |
//! | coherence          | cover → benefit → caution → cta ordering                  |
//! | policy compliance  | warning count for the danger level, placed early, compact |

use serde::{Deserialize, Serialize};

use super::{opinion, proportional, AgentId};
use crate::model::{ContentItem, ContentSection, SafetyClassification, SlideType};
use crate::policy::EvaluationPolicy;
use crate::report::{EvaluatorDetails, EvaluatorResult};

const DIMENSION: u32 = 20;
const MISMATCH_PENALTY: u32 = 10;
const EXCESS_MARKER_PENALTY: u32 = 4;
const COHERENCE_STEP: u32 = 5;
const PLACEMENT_PENALTY: u32 = 5;

/// Per-dimension scores, each 0–20.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityBreakdown {
    pub accuracy: u8,
    pub tone: u8,
    pub format: u8,
    pub coherence: u8,
    pub policy_compliance: u8,
}

impl QualityBreakdown {
    pub fn total(&self) -> u32 {
        [
            self.accuracy,
            self.tone,
            self.format,
            self.coherence,
            self.policy_compliance,
        ]
        .iter()
        .map(|v| *v as u32)
        .sum()
    }
}

pub fn evaluate(item: &ContentItem, policy: &EvaluationPolicy) -> EvaluatorResult {
    let mut findings = Vec::new();
    let mut warnings = Vec::new();

    let breakdown = QualityBreakdown {
        accuracy: accuracy(item, &mut warnings) as u8,
        tone: tone(item, policy, &mut warnings) as u8,
        format: format(item, policy, &mut warnings) as u8,
        coherence: coherence(item, &mut warnings) as u8,
        policy_compliance: policy_compliance(item, policy, &mut warnings) as u8,
    };

    findings.push(format!(
        "accuracy {}, tone {}, format {}, coherence {}, policy {}",
        breakdown.accuracy,
        breakdown.tone,
        breakdown.format,
        breakdown.coherence,
        breakdown.policy_compliance
    ));

    let mut result = EvaluatorResult::completed(
        AgentId::QualityScorer,
        breakdown.total(),
        EvaluatorDetails::Quality(breakdown),
    );
    result.verdict = Some(opinion(result.score, policy));
    result.findings = findings;
    result.warnings = warnings;
    result
}

fn accuracy(item: &ContentItem, warnings: &mut Vec<String>) -> u32 {
    let class = item.safety_classification;
    let mut penalty = 0;

    if !class.is_high_risk() && !item.has_benefit_text() {
        penalty += MISMATCH_PENALTY;
        warnings.push(format!("accuracy: no stated benefits for a {class} subject"));
    }
    if class.is_high_risk() && item.benefits.iter().any(|b| !b.trim().is_empty()) {
        penalty += MISMATCH_PENALTY;
        warnings.push(format!("accuracy: benefits promoted for a {class} subject"));
    }
    if class != SafetyClassification::Safe && !item.has_caution_text() {
        penalty += MISMATCH_PENALTY;
        warnings.push(format!("accuracy: no cautions for a {class} subject"));
    }

    DIMENSION.saturating_sub(penalty)
}

fn tone(item: &ContentItem, policy: &EvaluationPolicy, warnings: &mut Vec<String>) -> u32 {
    let mut text: String = item
        .slides
        .iter()
        .map(|s| s.text())
        .collect::<Vec<_>>()
        .join("\n");
    text.push('\n');
    text.push_str(&item.captions.text);
    let text = text.to_lowercase();

    let used: usize = policy
        .quality
        .emotive_markers
        .iter()
        .filter(|m| !m.is_empty())
        .map(|m| text.matches(&m.to_lowercase()).count())
        .sum();

    let allowed = policy.quality.max_emotive_markers;
    if used <= allowed {
        return DIMENSION;
    }
    warnings.push(format!("tone: {used} emotive markers (max {allowed})"));
    DIMENSION.saturating_sub(EXCESS_MARKER_PENALTY * (used - allowed) as u32)
}

fn format(item: &ContentItem, policy: &EvaluationPolicy, warnings: &mut Vec<String>) -> u32 {
    let bounds = &policy.quality;
    let mut compliant = 0usize;

    for (idx, slide) in item.slides.iter().enumerate() {
        let title_ok = slide
            .title_text()
            .map(|t| t.chars().count() <= bounds.title_max_chars)
            .unwrap_or(false);
        let subtitle_ok = slide
            .subtitle_text()
            .map(|s| s.chars().count() <= bounds.subtitle_max_chars)
            .unwrap_or(true);

        if title_ok && subtitle_ok {
            compliant += 1;
        } else {
            warnings.push(format!("format: slide {idx} text outside length bounds"));
        }
    }

    proportional(DIMENSION, compliant, item.slides.len())
}

fn coherence(item: &ContentItem, warnings: &mut Vec<String>) -> u32 {
    let slides = &item.slides;
    let mut score = 0;

    if slides.first().map(|s| s.slide_type) == Some(SlideType::Cover) {
        score += COHERENCE_STEP;
    }
    if slides.last().map(|s| s.slide_type) == Some(SlideType::Cta) {
        score += COHERENCE_STEP;
    }

    let first_benefit = item.section_slides(ContentSection::Benefit).first().copied();
    let first_caution = item.section_slides(ContentSection::Caution).first().copied();
    match (first_benefit, first_caution) {
        (Some(b), Some(c)) => {
            score += COHERENCE_STEP;
            if b < c {
                score += COHERENCE_STEP;
            } else {
                warnings.push("coherence: caution slides precede benefit slides".to_string());
            }
        }
        _ => warnings.push("coherence: deck lacks a benefit or caution slide".to_string()),
    }

    score
}

fn policy_compliance(item: &ContentItem, policy: &EvaluationPolicy, warnings: &mut Vec<String>) -> u32 {
    let required = policy
        .quality
        .min_warnings
        .for_class(item.safety_classification);
    let stated = item.cautions.iter().filter(|c| !c.trim().is_empty()).count();

    let mut score = if required == 0 {
        DIMENSION
    } else {
        proportional(DIMENSION, stated, required)
    };
    if stated < required {
        warnings.push(format!(
            "policy: {stated} warning(s) stated, {required} required for {}",
            item.safety_classification
        ));
    }

    let caution_slides = item.section_slides(ContentSection::Caution);
    if caution_slides.len() > policy.quality.max_caution_slides {
        score = score.saturating_sub(PLACEMENT_PENALTY);
        warnings.push(format!(
            "policy: warnings spread across {} slides",
            caution_slides.len()
        ));
    }

    let midpoint = item.slides.len().div_ceil(2);
    match caution_slides.first() {
        Some(&first) if first > midpoint => {
            score = score.saturating_sub(PLACEMENT_PENALTY);
            warnings.push(format!("policy: first warning only on slide {first}"));
        }
        None if required > 0 => {
            score = score.saturating_sub(PLACEMENT_PENALTY);
            warnings.push("policy: warnings not rendered on any slide".to_string());
        }
        _ => {}
    }

    score
}
