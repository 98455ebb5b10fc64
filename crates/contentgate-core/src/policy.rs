//! Versioned evaluation policy.
//!
//! Every threshold, keyword list and price the evaluators consult lives here.
//! A policy is loaded once (from [`EvaluationPolicy::default`] or a TOML file),
//! validated, and then passed into each evaluation. Nothing reads ambient
//! state, so identical inputs under an identical policy give identical
//! verdicts.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::model::SafetyClassification;

/// Current revision of the built-in policy.
pub const DEFAULT_POLICY_VERSION: &str = "2026.10";

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Score gates consulted by the conflict detector and verdict engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Every evaluator must reach this score for AUTO_PUBLISH.
    pub pass_score: u8,
    /// Automation judge score needed for `auto_publishable`.
    pub auto_publish_score: u8,
    /// Quality scores below this contradict an auto-publishable judgment.
    pub quality_conflict_score: u8,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            pass_score: 70,
            auto_publish_score: 70,
            quality_conflict_score: 70,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructurePolicy {
    pub min_slides: usize,
    pub max_slides: usize,
}

impl Default for StructurePolicy {
    fn default() -> Self {
        Self {
            min_slides: 4,
            max_slides: 12,
        }
    }
}

/// Minimum number of stated warnings per classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarningMinimums {
    pub safe: usize,
    pub caution: usize,
    pub conditional: usize,
    pub dangerous: usize,
    pub forbidden: usize,
}

impl WarningMinimums {
    pub fn for_class(&self, class: SafetyClassification) -> usize {
        match class {
            SafetyClassification::Safe => self.safe,
            SafetyClassification::Caution => self.caution,
            SafetyClassification::Conditional => self.conditional,
            SafetyClassification::Dangerous => self.dangerous,
            SafetyClassification::Forbidden => self.forbidden,
        }
    }
}

impl Default for WarningMinimums {
    fn default() -> Self {
        Self {
            safe: 1,
            caution: 2,
            conditional: 3,
            dangerous: 3,
            forbidden: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityPolicy {
    pub emotive_markers: Vec<String>,
    pub max_emotive_markers: usize,
    pub title_max_chars: usize,
    pub subtitle_max_chars: usize,
    /// Caution material spread over more slides than this is penalized.
    pub max_caution_slides: usize,
    pub min_warnings: WarningMinimums,
}

impl Default for QualityPolicy {
    fn default() -> Self {
        Self {
            emotive_markers: strings(&["!", "♥", "❤", "ㅋㅋ", "ㅎㅎ", "대박", "최고", "😍"]),
            max_emotive_markers: 3,
            title_max_chars: 20,
            subtitle_max_chars: 40,
            max_caution_slides: 2,
            min_warnings: WarningMinimums::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationPolicy {
    /// Slide counts with an approved rendering template.
    pub approved_slide_counts: Vec<usize>,
    /// Template credit (out of 40) for non-standard, non-empty decks.
    pub non_standard_credit: u8,
    /// Vague quantity words that need a human to interpret.
    pub ambiguity_tokens: Vec<String>,
    /// Readiness points (out of 30) lost per distinct ambiguity token.
    pub ambiguity_penalty: u8,
}

impl Default for AutomationPolicy {
    fn default() -> Self {
        Self {
            approved_slide_counts: vec![4, 6, 8, 10],
            non_standard_credit: 20,
            ambiguity_tokens: strings(&[
                "kg당",
                "적당량",
                "적당히",
                "적당",
                "조금",
                "약간",
                "소량",
                "정도",
                "approximately",
                "a little",
                "per kg",
            ]),
            ambiguity_penalty: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyPolicy {
    /// At least one must appear in the warnings of DANGEROUS/FORBIDDEN items.
    pub danger_markers: Vec<String>,
    /// Mandatory disclosure (e.g. consult a veterinarian).
    pub disclosure_markers: Vec<String>,
    /// Absolute-safety wording that contradicts any non-SAFE label.
    pub absolute_safety_claims: Vec<String>,
    /// Medical claims pet-food content may not make.
    pub medical_claims: Vec<String>,
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        Self {
            danger_markers: strings(&[
                "위험", "금지", "절대", "독성", "중독", "치명", "danger", "toxic", "never",
                "poison",
            ]),
            disclosure_markers: strings(&["수의사", "veterinarian", "vet"]),
            absolute_safety_claims: strings(&[
                "100% 안전",
                "완전 안전",
                "무조건 안전",
                "100% safe",
                "perfectly safe",
            ]),
            medical_claims: strings(&["치료", "완치", "cure", "cures"]),
        }
    }
}

/// Rendering cost model. `per_item_budget` has no default in policy files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostPolicy {
    #[serde(default = "CostPolicy::default_image_unit_price")]
    pub image_unit_price: f64,
    #[serde(default = "CostPolicy::default_overlay_unit_price")]
    pub overlay_unit_price: f64,
    #[serde(default = "CostPolicy::default_storage_cost")]
    pub storage_cost: f64,
    pub per_item_budget: f64,
    /// Slide count of the baseline template used for the efficiency bonus.
    #[serde(default = "CostPolicy::default_baseline_slides")]
    pub baseline_slides: usize,
}

impl CostPolicy {
    fn default_image_unit_price() -> f64 {
        0.04
    }
    fn default_overlay_unit_price() -> f64 {
        0.005
    }
    fn default_storage_cost() -> f64 {
        0.01
    }
    fn default_baseline_slides() -> usize {
        7
    }
}

impl Default for CostPolicy {
    fn default() -> Self {
        Self {
            image_unit_price: Self::default_image_unit_price(),
            overlay_unit_price: Self::default_overlay_unit_price(),
            storage_cost: Self::default_storage_cost(),
            per_item_budget: 0.50,
            baseline_slides: Self::default_baseline_slides(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorPolicy {
    /// Independent wall-clock budget for each evaluator.
    pub evaluator_timeout_ms: u64,
}

impl Default for CoordinatorPolicy {
    fn default() -> Self {
        Self {
            evaluator_timeout_ms: 5_000,
        }
    }
}

/// Placeholder for auto-publishing CONDITIONAL items. Not implemented; must
/// stay disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionalAutoPublish {
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingPolicy {
    /// High-risk classifications exempted from the hard HUMAN_QUEUE route.
    pub high_risk_auto_rules: Vec<SafetyClassification>,
    pub conditional_auto_publish: ConditionalAutoPublish,
}

impl RoutingPolicy {
    pub fn has_auto_rule(&self, class: SafetyClassification) -> bool {
        self.high_risk_auto_rules.contains(&class)
    }
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Complete evaluation policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationPolicy {
    #[serde(default = "EvaluationPolicy::default_version")]
    pub version: String,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub structure: StructurePolicy,
    #[serde(default)]
    pub quality: QualityPolicy,
    #[serde(default)]
    pub automation: AutomationPolicy,
    #[serde(default)]
    pub safety: SafetyPolicy,
    pub cost: CostPolicy,
    #[serde(default)]
    pub coordinator: CoordinatorPolicy,
    #[serde(default)]
    pub routing: RoutingPolicy,
}

impl Default for EvaluationPolicy {
    fn default() -> Self {
        Self {
            version: Self::default_version(),
            thresholds: Thresholds::default(),
            structure: StructurePolicy::default(),
            quality: QualityPolicy::default(),
            automation: AutomationPolicy::default(),
            safety: SafetyPolicy::default(),
            cost: CostPolicy::default(),
            coordinator: CoordinatorPolicy::default(),
            routing: RoutingPolicy::default(),
        }
    }
}

impl EvaluationPolicy {
    fn default_version() -> String {
        DEFAULT_POLICY_VERSION.to_string()
    }

    /// Parse a policy from TOML. Omitted sections take their defaults; the
    /// `[cost]` section and its `per_item_budget` are mandatory.
    pub fn from_toml_str(input: &str) -> ConfigResult<Self> {
        let policy: Self = toml::from_str(input)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Read and validate a policy file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&raw)
    }

    /// Override the per-evaluator timeout (builder pattern).
    pub fn with_evaluator_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.coordinator.evaluator_timeout_ms = timeout_ms;
        self
    }

    /// Check every constant the engine depends on.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.version.trim().is_empty() {
            return Err(ConfigError::invalid("version", "must not be empty"));
        }

        for (field, value) in [
            ("thresholds.pass_score", self.thresholds.pass_score),
            ("thresholds.auto_publish_score", self.thresholds.auto_publish_score),
            (
                "thresholds.quality_conflict_score",
                self.thresholds.quality_conflict_score,
            ),
        ] {
            if value > 100 {
                return Err(ConfigError::invalid(field, format!("{value} exceeds 100")));
            }
        }

        // An over-budget deck is capped at pass_score - 1, and a quality
        // conflict must imply a failed quality gate.
        if self.thresholds.pass_score == 0 {
            return Err(ConfigError::invalid("thresholds.pass_score", "must be > 0"));
        }
        if self.thresholds.quality_conflict_score > self.thresholds.pass_score {
            return Err(ConfigError::invalid(
                "thresholds.quality_conflict_score",
                format!(
                    "{} exceeds pass_score {}",
                    self.thresholds.quality_conflict_score, self.thresholds.pass_score
                ),
            ));
        }

        let s = &self.structure;
        if s.min_slides < 2 {
            return Err(ConfigError::invalid(
                "structure.min_slides",
                "a deck needs at least a cover and a cta",
            ));
        }
        if s.max_slides < s.min_slides {
            return Err(ConfigError::invalid(
                "structure.max_slides",
                format!("{} < min_slides {}", s.max_slides, s.min_slides),
            ));
        }

        let q = &self.quality;
        if q.title_max_chars == 0 || q.subtitle_max_chars == 0 {
            return Err(ConfigError::invalid(
                "quality.title_max_chars",
                "length bounds must be > 0",
            ));
        }
        if q.max_caution_slides == 0 {
            return Err(ConfigError::invalid("quality.max_caution_slides", "must be > 0"));
        }

        let a = &self.automation;
        if a.approved_slide_counts.is_empty() {
            return Err(ConfigError::invalid(
                "automation.approved_slide_counts",
                "at least one approved template is required",
            ));
        }
        if a.non_standard_credit == 0 || a.non_standard_credit >= 40 {
            return Err(ConfigError::invalid(
                "automation.non_standard_credit",
                "must be within 1..40",
            ));
        }
        if a.ambiguity_penalty == 0 || a.ambiguity_penalty > 30 {
            return Err(ConfigError::invalid(
                "automation.ambiguity_penalty",
                "must be within 1..=30",
            ));
        }
        if a.ambiguity_tokens.iter().any(|t| t.trim().is_empty()) {
            return Err(ConfigError::invalid(
                "automation.ambiguity_tokens",
                "tokens must not be blank",
            ));
        }

        if self.safety.danger_markers.is_empty() {
            return Err(ConfigError::invalid(
                "safety.danger_markers",
                "at least one danger marker is required",
            ));
        }

        let c = &self.cost;
        if !c.per_item_budget.is_finite() || c.per_item_budget <= 0.0 {
            return Err(ConfigError::invalid(
                "cost.per_item_budget",
                format!("must be a positive amount, got {}", c.per_item_budget),
            ));
        }
        for (field, price) in [
            ("cost.image_unit_price", c.image_unit_price),
            ("cost.overlay_unit_price", c.overlay_unit_price),
            ("cost.storage_cost", c.storage_cost),
        ] {
            if !price.is_finite() || price < 0.0 {
                return Err(ConfigError::invalid(field, format!("invalid amount {price}")));
            }
        }
        if c.baseline_slides == 0 {
            return Err(ConfigError::invalid("cost.baseline_slides", "must be > 0"));
        }

        if self.coordinator.evaluator_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "coordinator.evaluator_timeout_ms",
                "must be > 0",
            ));
        }

        if self.routing.conditional_auto_publish.enabled {
            return Err(ConfigError::UnsupportedHook {
                hook: "routing.conditional_auto_publish".to_string(),
            });
        }
        if let Some(bad) = self
            .routing
            .high_risk_auto_rules
            .iter()
            .find(|c| !c.is_high_risk())
        {
            return Err(ConfigError::invalid(
                "routing.high_risk_auto_rules",
                format!("{bad} is not a high-risk classification"),
            ));
        }

        Ok(())
    }
}
