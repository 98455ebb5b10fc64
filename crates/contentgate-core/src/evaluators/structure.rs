//! Content structure checker.
//!
//! Validates shape, not meaning. Score = slide structure (0–50) + format
//! compliance (0–30) + self-scoring (0–20). Missing fields become `issues`
//! and reduce the score; nothing here ever fails.

use serde::{Deserialize, Serialize};

use super::{opinion, proportional, AgentId};
use crate::model::{ContentItem, SlideType};
use crate::policy::EvaluationPolicy;
use crate::report::{EvaluatorDetails, EvaluatorResult};

const FIRST_COVER: u32 = 15;
const LAST_CTA: u32 = 15;
const COUNT_IN_RANGE: u32 = 10;
const SINGLE_COVER_AND_CTA: u32 = 10;
const FORMAT_POINTS: u32 = 30;
const BENEFIT_TEXT: u32 = 7;
const CAUTION_TEXT: u32 = 7;
const AMOUNT_TEXT: u32 = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureBreakdown {
    /// 0–50
    pub slide_structure: u8,
    /// 0–30
    pub format_compliance: u8,
    /// 0–20
    pub self_scoring: u8,
}

impl StructureBreakdown {
    pub fn total(&self) -> u32 {
        self.slide_structure as u32 + self.format_compliance as u32 + self.self_scoring as u32
    }
}

pub fn evaluate(item: &ContentItem, policy: &EvaluationPolicy) -> EvaluatorResult {
    let mut issues = Vec::new();
    let mut findings = Vec::new();

    let slide_structure = slide_structure(item, policy, &mut issues);
    let format_compliance = format_compliance(item, &mut issues);
    let self_scoring = self_scoring(item, &mut issues);

    let breakdown = StructureBreakdown {
        slide_structure: slide_structure as u8,
        format_compliance: format_compliance as u8,
        self_scoring: self_scoring as u8,
    };
    findings.push(format!(
        "structure {}/50, format {}/30, self-scoring {}/20",
        breakdown.slide_structure, breakdown.format_compliance, breakdown.self_scoring
    ));

    let mut result = EvaluatorResult::completed(
        AgentId::StructureChecker,
        breakdown.total(),
        EvaluatorDetails::Structure(breakdown),
    );
    result.verdict = Some(opinion(result.score, policy));
    result.findings = findings;
    result.issues = issues;
    result
}

fn slide_structure(item: &ContentItem, policy: &EvaluationPolicy, issues: &mut Vec<String>) -> u32 {
    let slides = &item.slides;
    if slides.is_empty() {
        issues.push("deck has no slides".to_string());
        return 0;
    }

    let mut score = 0;

    if slides.first().map(|s| s.slide_type) == Some(SlideType::Cover) {
        score += FIRST_COVER;
    } else {
        issues.push("first slide is not a cover".to_string());
    }

    if slides.last().map(|s| s.slide_type) == Some(SlideType::Cta) {
        score += LAST_CTA;
    } else {
        issues.push("last slide is not a cta".to_string());
    }

    let bounds = &policy.structure;
    if (bounds.min_slides..=bounds.max_slides).contains(&slides.len()) {
        score += COUNT_IN_RANGE;
    } else {
        issues.push(format!(
            "slide count {} outside {}..={}",
            slides.len(),
            bounds.min_slides,
            bounds.max_slides
        ));
    }

    let covers = slides.iter().filter(|s| s.slide_type == SlideType::Cover).count();
    let ctas = slides.iter().filter(|s| s.slide_type == SlideType::Cta).count();
    if covers == 1 && ctas == 1 {
        score += SINGLE_COVER_AND_CTA;
    } else {
        issues.push(format!(
            "expected exactly one cover and one cta, found {covers} cover(s) and {ctas} cta(s)"
        ));
    }

    score
}

fn format_compliance(item: &ContentItem, issues: &mut Vec<String>) -> u32 {
    if item.slides.is_empty() {
        return 0;
    }

    let mut required = 0usize;
    let mut present = 0usize;

    // Every slide, the cta included, carries a title and a subtitle.
    for (idx, slide) in item.slides.iter().enumerate() {
        for (field, text) in [("title", slide.title_text()), ("subtitle", slide.subtitle_text())] {
            required += 1;
            if text.is_some() {
                present += 1;
            } else {
                issues.push(format!("slide {idx} ({}): missing {field}", slide.slide_type));
            }
        }
    }

    if !item.captions.text.trim().is_empty() {
        required += 1;
        if item.captions.hashtags.iter().any(|h| !h.trim().is_empty()) {
            present += 1;
        } else {
            issues.push("caption has text but no hashtags".to_string());
        }
    }

    proportional(FORMAT_POINTS, present, required)
}

fn self_scoring(item: &ContentItem, issues: &mut Vec<String>) -> u32 {
    let mut score = 0;
    if item.has_benefit_text() {
        score += BENEFIT_TEXT;
    } else {
        issues.push("no benefit text".to_string());
    }
    if item.has_caution_text() {
        score += CAUTION_TEXT;
    } else {
        issues.push("no caution text".to_string());
    }
    if item.has_amount_guide() {
        score += AMOUNT_TEXT;
    } else {
        issues.push("no amount guide".to_string());
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Captions, ContentSection, SafetyClassification, Slide};

    fn deck() -> ContentItem {
        ContentItem {
            id: Some("pumpkin".to_string()),
            topic_kr: "호박".to_string(),
            topic_en: "pumpkin".to_string(),
            safety_classification: SafetyClassification::Safe,
            slides: vec![
                Slide::new(SlideType::Cover, "호박", "강아지 호박 괜찮을까?"),
                Slide::new(SlideType::Content, "효능", "식이섬유가 풍부해요")
                    .with_section(ContentSection::Benefit),
                Slide::new(SlideType::Content, "주의", "익혀서 주세요")
                    .with_section(ContentSection::Caution),
                Slide::new(SlideType::Cta, "저장하기", "팔로우"),
            ],
            captions: Captions {
                text: "호박 급여 가이드".to_string(),
                hashtags: vec!["#강아지".to_string()],
            },
            amount_guide: "소형 1조각".to_string(),
            benefits: vec!["식이섬유".to_string()],
            cautions: vec!["익혀서".to_string()],
            publish_slot: None,
        }
    }

    #[test]
    fn test_well_formed_deck_scores_100() {
        let r = evaluate(&deck(), &EvaluationPolicy::default());
        assert_eq!(r.score, 100);
        assert!(r.issues.is_empty(), "unexpected issues: {:?}", r.issues);
    }

    #[test]
    fn test_missing_title_is_issue_not_error() {
        let mut item = deck();
        item.slides[1].title = None;
        let r = evaluate(&item, &EvaluationPolicy::default());
        assert!(r.score < 100);
        assert!(r.issues.iter().any(|i| i.contains("slide 1") && i.contains("missing title")));
    }

    #[test]
    fn test_empty_deck_scores_only_self_scoring() {
        let mut item = deck();
        item.slides.clear();
        let r = evaluate(&item, &EvaluationPolicy::default());
        assert_eq!(r.score, 20);
        assert!(r.issues.iter().any(|i| i == "deck has no slides"));
    }

    #[test]
    fn test_wrong_ordering_penalized() {
        let mut item = deck();
        item.slides.swap(0, 3);
        let r = evaluate(&item, &EvaluationPolicy::default());
        match &r.details {
            EvaluatorDetails::Structure(b) => assert_eq!(b.slide_structure, 20),
            other => panic!("unexpected details {other:?}"),
        }
    }

    #[test]
    fn test_cta_needs_a_subtitle() {
        let mut item = deck();
        let last = item.slides.len() - 1;
        item.slides[last].subtitle = None;
        let r = evaluate(&item, &EvaluationPolicy::default());
        assert!(r.score < 100);
        assert!(r
            .issues
            .iter()
            .any(|i| i.contains(&format!("slide {last} (cta)")) && i.contains("missing subtitle")));
    }

    #[test]
    fn test_caption_without_hashtags() {
        let mut item = deck();
        item.captions.hashtags.clear();
        let r = evaluate(&item, &EvaluationPolicy::default());
        assert!(r.issues.iter().any(|i| i.contains("no hashtags")));
        assert!(r.score < 100);
    }
}
