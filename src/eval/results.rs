use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::cases::TestId;
use crate::scoring;

/// How a test case ended
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Completed,
    NoResults,
    Failed,
}

/// Result of a single test case
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestResult {
    pub test_id: TestId,
    /// Evaluator score, 0 to 10
    pub score: f64,
    /// Start of the model response, or the error message
    pub response: String,
    /// Seconds the agent spent answering
    pub duration: f64,
    pub status: CaseStatus,
}

/// Summary statistics for a local run
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EvalSummary {
    pub total: u32,
    pub completed: u32,
    pub no_results: u32,
    pub failed: u32,
    /// Mean score over every case, failures included
    pub average_score: f64,
    pub elapsed_seconds: f64,
}

/// Complete record of one local evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResults {
    /// Unique evaluation ID
    pub eval_id: String,
    /// Agent that was evaluated
    pub agent_spec: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub results: Vec<TestResult>,
    pub summary: EvalSummary,
}

impl EvaluationResults {
    pub fn new(agent_spec: &str, eval_id: &str) -> Self {
        Self {
            eval_id: eval_id.to_string(),
            agent_spec: agent_spec.to_string(),
            started_at: Utc::now(),
            completed_at: None,
            results: Vec::new(),
            summary: EvalSummary::default(),
        }
    }

    /// Record the finished results and compute the summary
    pub fn finalize(&mut self, results: Vec<TestResult>, elapsed_seconds: f64) {
        self.completed_at = Some(Utc::now());
        self.results = results;

        let count = |status: CaseStatus| {
            self.results.iter().filter(|r| r.status == status).count() as u32
        };

        self.summary = EvalSummary {
            total: self.results.len() as u32,
            completed: count(CaseStatus::Completed),
            no_results: count(CaseStatus::NoResults),
            failed: count(CaseStatus::Failed),
            average_score: scoring::mean_score(&self.results),
            elapsed_seconds,
        };
    }

    /// Save results to a JSON file
    pub fn save_json(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Write `<eval_id>.json` and `<eval_id>_report.md` into `output_dir`
    pub fn save(&self, output_dir: &std::path::Path) -> anyhow::Result<()> {
        std::fs::create_dir_all(output_dir)?;

        let json_path = output_dir.join(format!("{}.json", self.eval_id));
        self.save_json(&json_path)?;
        tracing::info!("Saved results to {:?}", json_path);

        let report_path = output_dir.join(format!("{}_report.md", self.eval_id));
        std::fs::write(&report_path, self.generate_report())?;
        tracing::info!("Saved report to {:?}", report_path);

        Ok(())
    }

    /// Generate a human-readable report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str(&format!("# Evaluation Report: {}\n\n", self.agent_spec));
        report.push_str(&format!("Evaluation ID: {}\n", self.eval_id));
        report.push_str(&format!("Started: {}\n", self.started_at));
        if let Some(completed) = self.completed_at {
            report.push_str(&format!("Completed: {}\n", completed));
        }
        report.push('\n');

        report.push_str("## Summary\n\n");
        report.push_str(&format!("- Test Cases: {}\n", self.summary.total));
        report.push_str(&format!("- Completed: {}\n", self.summary.completed));
        report.push_str(&format!("- No Results: {}\n", self.summary.no_results));
        report.push_str(&format!("- Failed: {}\n", self.summary.failed));
        report.push_str(&format!(
            "- Average Score: {:.2}/10\n",
            self.summary.average_score
        ));
        report.push_str(&format!("- Time: {:.2}s\n", self.summary.elapsed_seconds));
        report.push('\n');

        report.push_str("## Test Cases\n\n");
        report.push_str("| Test | Status | Score | Duration | Response |\n");
        report.push_str("|------|--------|-------|----------|----------|\n");

        for result in &self.results {
            let response: String = result
                .response
                .chars()
                .take(60)
                .collect::<String>()
                .replace('|', "\\|")
                .replace('\n', " ");
            report.push_str(&format!(
                "| {} | {:?} | {:.1} | {:.2}s | {} |\n",
                result.test_id, result.status, result.score, result.duration, response
            ));
        }

        report
    }
}
