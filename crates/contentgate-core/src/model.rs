//! Content item data model.
//!
//! A [`ContentItem`] is produced by the upstream generation pipeline and handed
//! to the engine once. It carries no behavior beyond read-only helpers; shape
//! problems (missing titles, wrong slide order) are *not* rejected here but
//! surfaced by the structure checker as issues.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Subject-matter hazard label assigned upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SafetyClassification {
    Safe,
    Caution,
    Conditional,
    Dangerous,
    Forbidden,
}

impl SafetyClassification {
    pub const ALL: [SafetyClassification; 5] = [
        Self::Safe,
        Self::Caution,
        Self::Conditional,
        Self::Dangerous,
        Self::Forbidden,
    ];

    /// DANGEROUS and FORBIDDEN subjects.
    pub fn is_high_risk(self) -> bool {
        matches!(self, Self::Dangerous | Self::Forbidden)
    }

    /// CAUTION and CONDITIONAL subjects.
    pub fn requires_review(self) -> bool {
        matches!(self, Self::Caution | Self::Conditional)
    }
}

impl std::fmt::Display for SafetyClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Safe => write!(f, "SAFE"),
            Self::Caution => write!(f, "CAUTION"),
            Self::Conditional => write!(f, "CONDITIONAL"),
            Self::Dangerous => write!(f, "DANGEROUS"),
            Self::Forbidden => write!(f, "FORBIDDEN"),
        }
    }
}

/// Layout role of a slide within the deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideType {
    Cover,
    Content,
    Cta,
}

impl std::fmt::Display for SlideType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cover => write!(f, "cover"),
            Self::Content => write!(f, "content"),
            Self::Cta => write!(f, "cta"),
        }
    }
}

/// What a content slide talks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSection {
    Benefit,
    Caution,
    Amount,
    Other,
}

/// One slide of the carousel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    pub slide_type: SlideType,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    /// Only meaningful on `content` slides.
    #[serde(default)]
    pub section: Option<ContentSection>,
}

impl Slide {
    pub fn new(slide_type: SlideType, title: &str, subtitle: &str) -> Self {
        Self {
            slide_type,
            title: Some(title.to_string()),
            subtitle: Some(subtitle.to_string()),
            section: None,
        }
    }

    pub fn with_section(mut self, section: ContentSection) -> Self {
        self.section = Some(section);
        self
    }

    /// Title if present and not blank.
    pub fn title_text(&self) -> Option<&str> {
        non_blank(self.title.as_deref())
    }

    /// Subtitle if present and not blank.
    pub fn subtitle_text(&self) -> Option<&str> {
        non_blank(self.subtitle.as_deref())
    }

    /// Title and subtitle joined for keyword scans.
    pub fn text(&self) -> String {
        let mut out = String::new();
        if let Some(t) = self.title_text() {
            out.push_str(t);
        }
        if let Some(s) = self.subtitle_text() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(s);
        }
        out
    }
}

/// Post caption and hashtags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Captions {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

/// The unit of evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Upstream identifier. When absent a digest of the item is used.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub topic_kr: String,
    #[serde(default)]
    pub topic_en: String,
    pub safety_classification: SafetyClassification,
    #[serde(default)]
    pub slides: Vec<Slide>,
    #[serde(default)]
    pub captions: Captions,
    #[serde(default)]
    pub amount_guide: String,
    /// Stated benefits the slides render.
    #[serde(default)]
    pub benefits: Vec<String>,
    /// Stated cautions / warnings the slides render.
    #[serde(default)]
    pub cautions: Vec<String>,
    /// Requested publish slot, only consulted in batch mode.
    #[serde(default)]
    pub publish_slot: Option<DateTime<Utc>>,
}

impl ContentItem {
    /// Stable identifier: `id` when supplied, otherwise the first 16 hex chars
    /// of the SHA-256 of the item's JSON encoding.
    pub fn content_id(&self) -> String {
        if let Some(id) = non_blank(self.id.as_deref()) {
            return id.to_string();
        }
        self.content_digest()[..16].to_string()
    }

    /// Hex SHA-256 of the item's JSON encoding. Two items are the same
    /// content only when their digests match, whatever their ids say.
    pub fn content_digest(&self) -> String {
        // Serializing a plain data struct cannot fail; fall back to Debug anyway.
        let bytes = serde_json::to_vec(self).unwrap_or_else(|_| format!("{self:?}").into_bytes());
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        hex::encode(hasher.finalize())
    }

    /// Content slides carrying `section`, with their deck index.
    pub fn section_slides(&self, section: ContentSection) -> Vec<usize> {
        self.slides
            .iter()
            .enumerate()
            .filter(|(_, s)| s.slide_type == SlideType::Content && s.section == Some(section))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn has_slide_type(&self, slide_type: SlideType) -> bool {
        self.slides.iter().any(|s| s.slide_type == slide_type)
    }

    /// All human-visible text: slides, caption, benefits, cautions.
    pub fn all_text(&self) -> String {
        let mut parts: Vec<String> = self.slides.iter().map(Slide::text).collect();
        parts.push(self.captions.text.clone());
        parts.extend(self.benefits.iter().cloned());
        parts.extend(self.cautions.iter().cloned());
        parts.join("\n")
    }

    /// Text that may carry warnings: cautions plus caution slides.
    pub fn warning_text(&self) -> String {
        let mut parts = self.cautions.clone();
        for idx in self.section_slides(ContentSection::Caution) {
            parts.push(self.slides[idx].text());
        }
        parts.join("\n")
    }

    pub fn has_benefit_text(&self) -> bool {
        self.benefits.iter().any(|b| !b.trim().is_empty())
            || !self.section_slides(ContentSection::Benefit).is_empty()
    }

    pub fn has_caution_text(&self) -> bool {
        self.cautions.iter().any(|c| !c.trim().is_empty())
            || !self.section_slides(ContentSection::Caution).is_empty()
    }

    pub fn has_amount_guide(&self) -> bool {
        !self.amount_guide.trim().is_empty()
    }
}

pub(crate) fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|v| !v.trim().is_empty())
}
