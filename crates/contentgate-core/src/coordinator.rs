//! Parallel execution coordinator.
//!
//! Fans one [`ContentItem`] out to all five evaluators as separate tokio
//! tasks and fans the results back in. Tasks share only immutable `Arc`s, so
//! no locks are involved. Each evaluator has its own timeout; a timeout, error
//! or panic is converted into a zero-score result for that evaluator alone and
//! the other four are unaffected.
//!
//! The fan-in barrier is the only synchronization point, so wall-clock time is
//! roughly the slowest evaluator rather than the sum. Dropping the returned
//! future drops the [`JoinSet`], which aborts every outstanding task; callers
//! never observe a partial fan-in.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::task::{self, JoinSet};
use tokio::time::Instant;
use tracing::{instrument, warn};

use crate::error::EvaluatorError;
use crate::evaluators::AgentId;
use crate::metrics::METRICS;
use crate::model::ContentItem;
use crate::obs;
use crate::policy::EvaluationPolicy;
use crate::report::{EvaluatorResult, EvaluatorStatus};

/// Seam through which the coordinator invokes evaluators.
///
/// Production uses [`PureEvaluators`]; tests inject slow or failing runners.
#[async_trait]
pub trait EvaluatorRunner: Send + Sync {
    async fn run(
        &self,
        agent: AgentId,
        item: Arc<ContentItem>,
        policy: Arc<EvaluationPolicy>,
    ) -> Result<EvaluatorResult, EvaluatorError>;
}

/// Runs the built-in pure evaluators.
///
/// The evaluators are CPU-bound, so each one runs on the blocking pool. The
/// coordinator's timeout then bounds the wait even when an evaluator never
/// yields, and the five run in parallel on a current-thread runtime too.
#[derive(Debug, Clone, Copy, Default)]
pub struct PureEvaluators;

#[async_trait]
impl EvaluatorRunner for PureEvaluators {
    async fn run(
        &self,
        agent: AgentId,
        item: Arc<ContentItem>,
        policy: Arc<EvaluationPolicy>,
    ) -> Result<EvaluatorResult, EvaluatorError> {
        match task::spawn_blocking(move || agent.evaluate(&item, &policy)).await {
            Ok(result) => Ok(result),
            Err(e) => {
                let reason = if e.is_panic() {
                    panic_reason(e.into_panic().as_ref())
                } else {
                    e.to_string()
                };
                Err(EvaluatorError::Failed {
                    agent: agent.to_string(),
                    reason,
                })
            }
        }
    }
}

fn panic_reason(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Fan-in output: one result per evaluator in [`AgentId::ALL`] order.
#[derive(Debug, Clone)]
pub struct FanOutReport {
    pub results: [EvaluatorResult; 5],
    /// Wall-clock time of the whole fan-out/fan-in.
    pub elapsed_ms: u64,
}

/// Fans a content item out to the five evaluators.
#[derive(Clone)]
pub struct Coordinator {
    runner: Arc<dyn EvaluatorRunner>,
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new(Arc::new(PureEvaluators))
    }
}

impl Coordinator {
    pub fn new(runner: Arc<dyn EvaluatorRunner>) -> Self {
        Self { runner }
    }

    /// Run all five evaluators concurrently and wait for every result or its
    /// timeout.
    #[instrument(skip_all, fields(content_id = %content_id))]
    pub async fn fan_out(
        &self,
        content_id: &str,
        item: Arc<ContentItem>,
        policy: Arc<EvaluationPolicy>,
    ) -> FanOutReport {
        let started = Instant::now();
        let timeout = Duration::from_millis(policy.coordinator.evaluator_timeout_ms);

        let mut join_set = JoinSet::new();
        for agent in AgentId::ALL {
            let runner = Arc::clone(&self.runner);
            let item = Arc::clone(&item);
            let policy = Arc::clone(&policy);
            join_set.spawn(async move {
                let result = run_isolated(runner, agent, item, policy, timeout).await;
                (agent, result)
            });
        }

        let mut slots: [Option<EvaluatorResult>; 5] = Default::default();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((agent, result)) => slots[agent.index()] = Some(result),
                Err(e) => warn!(error = %e, "evaluator task did not complete"),
            }
        }

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let results = std::array::from_fn(|i| {
            slots[i].take().unwrap_or_else(|| {
                EvaluatorResult::failed(
                    AgentId::ALL[i],
                    EvaluatorStatus::Error,
                    "evaluator task aborted",
                    elapsed_ms,
                )
            })
        });

        for result in &results {
            METRICS.record_evaluator_status(result.status);
            obs::emit_evaluator_finished(
                content_id,
                result.agent_id,
                result.score,
                result.status,
                result.execution_time_ms,
            );
        }

        FanOutReport {
            results,
            elapsed_ms,
        }
    }
}

/// Run one evaluator under its timeout, converting every failure mode into a
/// synthesized zero-score result.
async fn run_isolated(
    runner: Arc<dyn EvaluatorRunner>,
    agent: AgentId,
    item: Arc<ContentItem>,
    policy: Arc<EvaluationPolicy>,
    timeout: Duration,
) -> EvaluatorResult {
    let started = Instant::now();
    let guarded = AssertUnwindSafe(runner.run(agent, item, policy)).catch_unwind();
    let outcome = tokio::time::timeout(timeout, guarded).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(Ok(Ok(mut result))) => {
            result.enforce_invariants(agent);
            result.execution_time_ms = elapsed_ms;
            result
        }
        Ok(Ok(Err(e))) => {
            warn!(agent = %agent, error = %e, "evaluator failed");
            EvaluatorResult::failed(agent, EvaluatorStatus::Error, e.to_string(), elapsed_ms)
        }
        Ok(Err(panic)) => {
            let reason = panic_reason(panic.as_ref());
            warn!(agent = %agent, reason = %reason, "evaluator panicked");
            EvaluatorResult::failed(
                agent,
                EvaluatorStatus::Error,
                format!("evaluator {agent} panicked: {reason}"),
                elapsed_ms,
            )
        }
        Err(_) => {
            warn!(agent = %agent, timeout_ms = timeout.as_millis() as u64, "evaluator timed out");
            EvaluatorResult::failed(
                agent,
                EvaluatorStatus::Timeout,
                format!("evaluator {agent} timed out after {}ms", timeout.as_millis()),
                elapsed_ms,
            )
        }
    }
}
