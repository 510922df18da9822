//! Local runner: evaluates the agent against each test case in turn.
//! Every case gets its own agent and evaluator, and a failing case is
//! recorded as a zero score instead of aborting the batch.

use crate::agents::{AgentContext, AgentFactory, AgentRegistry, AgentSpec};
use crate::cli::{Credentials, ModelSettings};
use crate::error::LoadError;
use crate::eval::cases::{get_needles, StoredCase, TestId};
use crate::eval::harness::{EvaluatorFactory, Harness, TrialRecord, TrialTask};
use crate::eval::{CaseStatus, TestResult};
use anyhow::Context;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Characters of the model response kept in a result
const RESPONSE_EXCERPT_CHARS: usize = 200;

/// Characters of an error message kept in a result
const ERROR_EXCERPT_CHARS: usize = 100;

/// Local evaluation runner
pub struct LocalEvalRunner<H: Harness> {
    harness: H,
    registry: AgentRegistry,
    evaluator_factory: EvaluatorFactory,
    haystack_dir: PathBuf,
    models: ModelSettings,
}

impl<H: Harness> LocalEvalRunner<H> {
    pub fn new(
        harness: H,
        registry: AgentRegistry,
        evaluator_factory: EvaluatorFactory,
        haystack_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            harness,
            registry,
            evaluator_factory,
            haystack_dir: haystack_dir.into(),
            models: ModelSettings::default(),
        }
    }

    pub fn with_models(mut self, models: ModelSettings) -> Self {
        self.models = models;
        self
    }

    /// Run every case, one at a time, and return one result per case in
    /// input order.
    ///
    /// Only an unresolvable agent spec is an error; per-case failures are
    /// folded into the results.
    pub async fn run_local_tests(
        &self,
        spec: &AgentSpec,
        cases: &[StoredCase],
        credentials: &Credentials,
    ) -> Result<Vec<TestResult>, LoadError> {
        let factory = self.registry.resolve(spec)?;
        let ctx = AgentContext {
            credentials: credentials.clone(),
            models: self.models.clone(),
        };

        info!("Running {} test cases locally with {}", cases.len(), spec);

        let mut results = Vec::with_capacity(cases.len());
        for (idx, case) in cases.iter().enumerate() {
            let test_id = case.id().unwrap_or(TestId::Number(idx as i64 + 1));

            let result = self.run_single_local(factory, &ctx, case, test_id).await;
            info!(
                "[{}/{}] case {} scored {:.2}",
                idx + 1,
                cases.len(),
                result.test_id,
                result.score
            );
            results.push(result);
        }

        Ok(results)
    }

    async fn run_single_local(
        &self,
        factory: AgentFactory,
        ctx: &AgentContext,
        case: &StoredCase,
        test_id: TestId,
    ) -> TestResult {
        let attempt = AssertUnwindSafe(self.evaluate_case(factory, ctx, case)).catch_unwind();

        match attempt.await {
            Ok(Ok(records)) => match records.into_iter().next() {
                Some(record) => TestResult {
                    test_id,
                    score: record.score,
                    response: excerpt(&record.model_response, RESPONSE_EXCERPT_CHARS),
                    duration: record.test_duration_seconds.unwrap_or(0.0),
                    status: CaseStatus::Completed,
                },
                None => {
                    warn!("Case {} produced no results", test_id);
                    TestResult::no_results(test_id)
                }
            },
            Ok(Err(e)) => {
                error!("Case {} failed: {:#}", test_id, e);
                TestResult::failed(test_id, &format!("{:#}", e))
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!("Case {} panicked: {}", test_id, message);
                TestResult::failed(test_id, &message)
            }
        }
    }

    async fn evaluate_case(
        &self,
        factory: AgentFactory,
        ctx: &AgentContext,
        stored: &StoredCase,
    ) -> anyhow::Result<Vec<TrialRecord>> {
        let agent = factory(ctx)?;
        let evaluator = (self.evaluator_factory)(ctx)?;
        let case = stored.parse().context("invalid test case")?;
        let needles = get_needles(&case);

        let task = TrialTask::single_shot(
            needles,
            case.question,
            case.answer,
            self.haystack_dir.clone(),
        );

        self.harness
            .run_one(agent.as_ref(), evaluator.as_ref(), &task)
            .await
    }
}

impl TestResult {
    fn no_results(test_id: TestId) -> Self {
        Self {
            test_id,
            score: 0.0,
            response: "No results".to_string(),
            duration: 0.0,
            status: CaseStatus::NoResults,
        }
    }

    fn failed(test_id: TestId, message: &str) -> Self {
        Self {
            test_id,
            score: 0.0,
            response: format!("Error: {}", excerpt(message, ERROR_EXCERPT_CHARS)),
            duration: 0.0,
            status: CaseStatus::Failed,
        }
    }
}

fn excerpt(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "agent panicked".to_string()
    }
}
