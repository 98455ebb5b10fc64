//! Content fixtures shared by the integration tests.

#![allow(dead_code)]

use contentgate_core::{Captions, ContentItem, ContentSection, SafetyClassification, Slide, SlideType};

/// A SAFE, four-slide deck that every evaluator scores 100.
pub fn pumpkin() -> ContentItem {
    ContentItem {
        id: Some("pumpkin-01".to_string()),
        topic_kr: "호박".to_string(),
        topic_en: "pumpkin".to_string(),
        safety_classification: SafetyClassification::Safe,
        slides: vec![
            Slide::new(SlideType::Cover, "강아지 호박", "먹어도 될까요?"),
            Slide::new(SlideType::Content, "호박의 효능", "식이섬유와 베타카로틴이 풍부해요")
                .with_section(ContentSection::Benefit),
            Slide::new(SlideType::Content, "주의사항", "익혀서 씨와 껍질을 제거해 주세요")
                .with_section(ContentSection::Caution),
            Slide::new(SlideType::Cta, "저장하고 공유하기", "팔로우"),
        ],
        captions: Captions {
            text: "강아지 호박 급여 가이드. 급여 전 수의사와 상담하세요.".to_string(),
            hashtags: vec!["#강아지간식".to_string(), "#호박".to_string()],
        },
        amount_guide: "소형 2조각 | 중형 3조각 | 대형 4조각".to_string(),
        benefits: vec![
            "식이섬유".to_string(),
            "베타카로틴".to_string(),
            "저칼로리".to_string(),
        ],
        cautions: vec![
            "반드시 익혀서 급여".to_string(),
            "씨와 껍질 제거".to_string(),
            "처음에는 한 조각부터".to_string(),
            "설탕과 양념 없이".to_string(),
        ],
        publish_slot: None,
    }
}

/// The pumpkin deck stretched to ten slides with a per-weight amount guide.
pub fn pumpkin_per_weight() -> ContentItem {
    let mut item = pumpkin();
    item.id = Some("pumpkin-02".to_string());
    let cta = item.slides.pop().expect("fixture has a cta");
    for i in 0..6 {
        item.slides.push(
            Slide::new(SlideType::Content, &format!("급여 팁 {}", i + 1), "간식은 하루 열량의 10% 이내")
                .with_section(ContentSection::Other),
        );
    }
    item.slides.push(cta);
    item.amount_guide = "체중 5kg당 1-2조각".to_string();
    item
}

/// A FORBIDDEN deck whose warnings never say why the food is off-limits.
pub fn grape_without_danger_warning() -> ContentItem {
    ContentItem {
        id: Some("grape-01".to_string()),
        topic_kr: "포도".to_string(),
        topic_en: "grape".to_string(),
        safety_classification: SafetyClassification::Forbidden,
        slides: vec![
            Slide::new(SlideType::Cover, "강아지 포도", "먹어도 될까요?"),
            Slide::new(SlideType::Content, "왜 안 될까", "신장에 부담을 줘요")
                .with_section(ContentSection::Benefit),
            Slide::new(SlideType::Content, "먹었다면", "바로 병원에 가세요")
                .with_section(ContentSection::Caution),
            Slide::new(SlideType::Cta, "저장하고 공유하기", "팔로우"),
        ],
        captions: Captions {
            text: "포도 가이드. 이상 증상이 있으면 수의사와 상담하세요.".to_string(),
            hashtags: vec!["#강아지".to_string(), "#포도".to_string()],
        },
        amount_guide: String::new(),
        benefits: vec![],
        cautions: vec![
            "먹었다면 바로 병원으로".to_string(),
            "건포도도 마찬가지".to_string(),
            "손이 닿지 않게 보관".to_string(),
        ],
        publish_slot: None,
    }
}
