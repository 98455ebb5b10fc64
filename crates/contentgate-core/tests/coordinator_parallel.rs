//! Fan-out timing, timeout and isolation behavior of the coordinator.

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use contentgate_core::{
    AgentId, ContentItem, Coordinator, EvaluationEngine, EvaluationPolicy, EvaluatorError,
    EvaluatorResult, EvaluatorRunner, EvaluatorStatus, FinalVerdict,
};

/// Delegates to the pure evaluators after sleeping for the listed agents.
struct SlowRunner {
    slow: Vec<AgentId>,
    delay: Duration,
}

#[async_trait]
impl EvaluatorRunner for SlowRunner {
    async fn run(
        &self,
        agent: AgentId,
        item: Arc<ContentItem>,
        policy: Arc<EvaluationPolicy>,
    ) -> Result<EvaluatorResult, EvaluatorError> {
        if self.slow.contains(&agent) {
            tokio::time::sleep(self.delay).await;
        }
        Ok(agent.evaluate(&item, &policy))
    }
}

/// Panics for one agent.
struct PanickingRunner(AgentId);

#[async_trait]
impl EvaluatorRunner for PanickingRunner {
    async fn run(
        &self,
        agent: AgentId,
        item: Arc<ContentItem>,
        policy: Arc<EvaluationPolicy>,
    ) -> Result<EvaluatorResult, EvaluatorError> {
        if agent == self.0 {
            panic!("evaluator blew up");
        }
        Ok(agent.evaluate(&item, &policy))
    }
}

fn policy() -> Arc<EvaluationPolicy> {
    Arc::new(EvaluationPolicy::default())
}

#[tokio::test(start_paused = true)]
async fn test_one_slow_evaluator_bounds_total_time() {
    let coordinator = Coordinator::new(Arc::new(SlowRunner {
        slow: vec![AgentId::QualityScorer],
        delay: Duration::from_millis(50),
    }));

    let report = coordinator
        .fan_out("pumpkin-01", Arc::new(common::pumpkin()), policy())
        .await;

    assert!(report.elapsed_ms >= 50, "elapsed {}", report.elapsed_ms);
    assert!(report.elapsed_ms < 100, "elapsed {}", report.elapsed_ms);
    assert!(report.results.iter().all(|r| r.is_completed()));
    assert!(report.results[AgentId::QualityScorer.index()].execution_time_ms >= 50);
}

#[tokio::test(start_paused = true)]
async fn test_evaluators_run_concurrently() {
    let coordinator = Coordinator::new(Arc::new(SlowRunner {
        slow: AgentId::ALL.to_vec(),
        delay: Duration::from_millis(50),
    }));

    let report = coordinator
        .fan_out("pumpkin-01", Arc::new(common::pumpkin()), policy())
        .await;

    // Sequential execution would take 250ms.
    assert!(report.elapsed_ms >= 50);
    assert!(report.elapsed_ms < 100, "elapsed {}", report.elapsed_ms);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_is_isolated_to_one_evaluator() {
    let coordinator = Coordinator::new(Arc::new(SlowRunner {
        slow: vec![AgentId::CostEstimator],
        delay: Duration::from_secs(60),
    }));
    let policy = Arc::new(EvaluationPolicy::default().with_evaluator_timeout_ms(100));

    let report = coordinator
        .fan_out("pumpkin-01", Arc::new(common::pumpkin()), policy)
        .await;

    let cost = &report.results[AgentId::CostEstimator.index()];
    assert_eq!(cost.status, EvaluatorStatus::Timeout);
    assert_eq!(cost.score, 0);
    assert!(report.elapsed_ms < 1_000);

    for agent in [
        AgentId::StructureChecker,
        AgentId::QualityScorer,
        AgentId::AutomationJudge,
        AgentId::SafetyDetector,
    ] {
        let r = &report.results[agent.index()];
        assert_eq!(r.status, EvaluatorStatus::Completed, "{agent}");
        assert_eq!(r.score, 100, "{agent}");
    }
}

#[tokio::test]
async fn test_panic_is_isolated_to_one_evaluator() {
    let coordinator = Coordinator::new(Arc::new(PanickingRunner(AgentId::SafetyDetector)));

    let report = coordinator
        .fan_out("pumpkin-01", Arc::new(common::pumpkin()), policy())
        .await;

    let safety = &report.results[AgentId::SafetyDetector.index()];
    assert_eq!(safety.status, EvaluatorStatus::Error);
    assert_eq!(safety.score, 0);
    assert!(safety.issues[0].contains("evaluator blew up"));
    assert_eq!(report.results.iter().filter(|r| r.is_completed()).count(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_timed_out_evaluator_blocks_auto_publish() {
    let engine = EvaluationEngine::new(EvaluationPolicy::default().with_evaluator_timeout_ms(100))
        .unwrap()
        .with_runner(Arc::new(SlowRunner {
            slow: vec![AgentId::StructureChecker],
            delay: Duration::from_secs(60),
        }));

    let result = engine.evaluate(common::pumpkin()).await.unwrap();

    assert_eq!(
        result.result_for(AgentId::StructureChecker).status,
        EvaluatorStatus::Timeout
    );
    assert_eq!(result.final_verdict, FinalVerdict::HumanQueue);
    assert!((result.confidence_score - 80.0).abs() < 1e-9);
    assert_eq!(result.questions_asked, 0);
}

#[tokio::test]
async fn test_panicking_safety_detector_never_auto_publishes() {
    let engine = EvaluationEngine::new(EvaluationPolicy::default())
        .unwrap()
        .with_runner(Arc::new(PanickingRunner(AgentId::SafetyDetector)));

    let result = engine.evaluate(common::pumpkin()).await.unwrap();

    assert_eq!(result.final_verdict, FinalVerdict::HumanQueue);
    assert!(result
        .reasons
        .iter()
        .any(|r| r.contains("safety_detector did not complete")));
}

/// The pumpkin deck padded with `extra` content slides.
fn oversized_pumpkin(extra: usize) -> ContentItem {
    let mut item = common::pumpkin();
    let filler = item.slides[1].clone();
    let cta = item.slides.pop().expect("fixture has a cta");
    item.slides.extend(std::iter::repeat(filler).take(extra));
    item.slides.push(cta);
    item
}

#[tokio::test]
async fn test_builtin_evaluators_are_bounded_by_timeout() {
    let policy = Arc::new(EvaluationPolicy::default().with_evaluator_timeout_ms(1));

    let report = Coordinator::default()
        .fan_out("pumpkin-huge", Arc::new(oversized_pumpkin(300_000)), policy)
        .await;

    for r in &report.results {
        assert_eq!(r.status, EvaluatorStatus::Timeout, "{}", r.agent_id);
        assert_eq!(r.score, 0, "{}", r.agent_id);
    }
    assert!(report.elapsed_ms < 250, "elapsed {}", report.elapsed_ms);
}

#[tokio::test]
async fn test_builtin_evaluators_finish_within_timeout() {
    let report = Coordinator::default()
        .fan_out("pumpkin-01", Arc::new(common::pumpkin()), policy())
        .await;

    assert!(report.results.iter().all(|r| r.is_completed()));
    assert!(report.results.iter().all(|r| r.score == 100));
}
