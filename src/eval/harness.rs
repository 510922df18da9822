//! Seam between the runner and whatever actually exercises an agent.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::agents::{Agent, AgentContext};

/// Grades an agent's answer
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// Score `response` against `reference`, 0 to 10
    async fn score(&self, question: &str, reference: &str, response: &str) -> anyhow::Result<f64>;
}

/// Builds a fresh evaluator for a single test case
pub type EvaluatorFactory = fn(&AgentContext) -> anyhow::Result<Box<dyn Evaluator>>;

/// One evaluation task handed to a harness
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialTask {
    pub needles: Vec<String>,
    pub question: String,
    /// Expected answer; the needles themselves when the case has none
    pub reference: String,
    pub haystack_dir: PathBuf,
    pub results_version: u32,
    pub num_tests: u32,
    pub save_results: bool,
    pub save_contexts: bool,
    pub print_ongoing_status: bool,
}

impl TrialTask {
    /// Single-shot task with saving and status output disabled
    pub fn single_shot(
        needles: Vec<String>,
        question: impl Into<String>,
        answer: Option<String>,
        haystack_dir: impl Into<PathBuf>,
    ) -> Self {
        let reference = answer.unwrap_or_else(|| needles.join("\n"));
        Self {
            needles,
            question: question.into(),
            reference,
            haystack_dir: haystack_dir.into(),
            results_version: 1,
            num_tests: 1,
            save_results: false,
            save_contexts: false,
            print_ongoing_status: false,
        }
    }
}

/// Outcome of one trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub score: f64,
    pub model_response: String,
    #[serde(default)]
    pub test_duration_seconds: Option<f64>,
}

/// Runs a task against one agent/evaluator pair and returns once every
/// trial has finished.
#[async_trait]
pub trait Harness: Send + Sync {
    async fn run_one(
        &self,
        agent: &dyn Agent,
        evaluator: &dyn Evaluator,
        task: &TrialTask,
    ) -> anyhow::Result<Vec<TrialRecord>>;
}
