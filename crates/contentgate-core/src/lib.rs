//! contentgate core library
//!
//! Evaluates one content item (a slide deck plus captions) with five
//! independent evaluators running concurrently, detects contradictions
//! between their findings, and routes the item to exactly one of
//! `AUTO_PUBLISH`, `HUMAN_QUEUE` or `REJECT`.
//!
//! ```ignore
//! let engine = EvaluationEngine::new(EvaluationPolicy::default())?;
//! let result = engine.evaluate(item).await?;
//! match result.final_verdict {
//!     FinalVerdict::AutoPublish => publish(&result),
//!     FinalVerdict::HumanQueue => enqueue(&result.intervention_points),
//!     FinalVerdict::Reject => discard(&result.reasons),
//! }
//! ```
//!
//! The engine never asks a person anything: an uncertain item is queued with
//! its intervention points, and `questions_asked` is always zero.

pub mod conflict;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod evaluators;
pub mod metrics;
pub mod model;
pub mod obs;
pub mod policy;
pub mod report;
pub mod telemetry;
pub mod verdict;

pub use conflict::{
    detect_conflicts, detect_timing_conflicts, Conflict, ConflictKind, ConflictResolution,
    ConflictSeverity, SlotRequest,
};
pub use coordinator::{Coordinator, EvaluatorRunner, FanOutReport, PureEvaluators};
pub use engine::{evaluate, evaluate_batch, EvaluationEngine, EvaluationResult};
pub use error::{
    ConfigError, ConfigResult, EngineError, EngineResult, EvaluatorError, VerdictError,
    VerdictResult,
};
pub use evaluators::automation::AutomationJudgment;
pub use evaluators::cost::CostReport;
pub use evaluators::quality::QualityBreakdown;
pub use evaluators::safety::{RedFlag, RedFlagCategory, RedFlagSeverity, SafetyReport};
pub use evaluators::structure::StructureBreakdown;
pub use evaluators::AgentId;
pub use metrics::METRICS;
pub use model::{Captions, ContentItem, ContentSection, SafetyClassification, Slide, SlideType};
pub use policy::{EvaluationPolicy, DEFAULT_POLICY_VERSION};
pub use report::{AgentVerdict, EvaluatorDetails, EvaluatorResult, EvaluatorStatus};
pub use telemetry::init_tracing;
pub use verdict::{decide, Decision, DecisionRule, FinalVerdict, VerdictMachine, VerdictState};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
