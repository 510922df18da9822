mod cases;
mod evaluator;
mod harness;
mod haystack;
mod local_runner;
mod results;

pub use cases::{
    get_needles, load_local_test_cases, load_local_test_cases_with_rng, StoredCase, TestCase, TestId,
};
pub use evaluator::{parse_score, LlmEvaluator};
pub use harness::{Evaluator, EvaluatorFactory, Harness, TrialRecord, TrialTask};
pub use haystack::{insert_needles, read_haystack, MultiNeedleHaystack};
pub use local_runner::LocalEvalRunner;
pub use results::{CaseStatus, EvalSummary, EvaluationResults, TestResult};

/// Evaluator used when none is supplied
pub fn default_evaluator_factory() -> EvaluatorFactory {
    evaluator::build
}
