//! Top-level submission pipeline.
//!
//! identity -> agent files -> test cases -> local evaluation -> leaderboard.
//! Every failure ends up as exit code 1 with a message; nothing escapes as a
//! panic or an unhandled error.

use anyhow::{Context, Result};
use serde_json::Value;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

use crate::agents::AgentSpec;
use crate::cli::{
    get_student_info, Credentials, EvalArgs, ModelSettings, ProjectArgs, StudentInfo,
    CONTEXT_LENGTH, DEFAULT_ASSIGNMENT_ID, DEFAULT_LEADERBOARD_URL, DEPTH_PERCENT, HAYSTACK_DIR,
    MANIFEST_FILE, NUM_TEST_CASES, TEST_CASES_FILE,
};
use crate::collect::{collect_agent_files, CollectedFiles, ModuleGraph};
use crate::error::ConfigError;
use crate::eval::{load_local_test_cases, EvaluationResults, Harness, LocalEvalRunner};
use crate::leaderboard::LeaderboardClient;

/// Source of the submitting student's identity
pub type StudentSource = Box<dyn Fn() -> Result<StudentInfo, ConfigError> + Send + Sync>;

/// Everything the pipeline needs besides the harness
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub agent_spec: String,
    pub project_root: PathBuf,
    pub manifest: PathBuf,
    pub test_cases: PathBuf,
    pub num_cases: usize,
    pub haystack_dir: PathBuf,
    pub context_length: usize,
    pub depth_percent: f64,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub models: ModelSettings,
    pub output: Option<PathBuf>,
    pub leaderboard_url: String,
    pub assignment_id: String,
}

impl PipelineOptions {
    /// Options with the stock defaults, rooted at `project_root`
    pub fn new(agent_spec: impl Into<String>, project_root: impl Into<PathBuf>) -> Self {
        Self {
            agent_spec: agent_spec.into(),
            project_root: project_root.into(),
            manifest: PathBuf::from(MANIFEST_FILE),
            test_cases: PathBuf::from(TEST_CASES_FILE),
            num_cases: NUM_TEST_CASES,
            haystack_dir: PathBuf::from(HAYSTACK_DIR),
            context_length: CONTEXT_LENGTH,
            depth_percent: DEPTH_PERCENT,
            api_key: None,
            base_url: None,
            models: ModelSettings::default(),
            output: None,
            leaderboard_url: DEFAULT_LEADERBOARD_URL.to_string(),
            assignment_id: DEFAULT_ASSIGNMENT_ID.to_string(),
        }
    }

    pub fn from_args(project: &ProjectArgs, eval: Option<&EvalArgs>) -> Result<Self> {
        let project_root = match &project.project_root {
            Some(root) => root.clone(),
            None => std::env::current_dir().context("Failed to read current directory")?,
        };

        let mut options = Self::new(project.agent_spec.clone(), project_root);
        options.manifest = project.manifest.clone();

        if let Some(eval) = eval {
            options.test_cases = eval.test_cases.clone();
            options.num_cases = eval.num_cases;
            options.haystack_dir = eval.haystack_dir.clone();
            options.context_length = eval.context_length;
            options.depth_percent = eval.depth_percent;
            options.api_key = eval.api_key.clone();
            options.base_url = eval.base_url.clone();
            options.models = ModelSettings {
                agent_model: eval.agent_model.clone(),
                evaluator_model: eval.evaluator_model.clone(),
            };
            options.output = eval.output.clone();
        }

        Ok(options)
    }

    /// Resolve a possibly relative path against the project root
    pub fn project_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }
}

/// Harvest the agent's files as declared in the project manifest
pub fn collect_files(options: &PipelineOptions) -> Result<CollectedFiles> {
    let graph = ModuleGraph::load(options.project_path(&options.manifest))?;
    let files = collect_agent_files(&options.agent_spec, &graph, &options.project_root)?;
    Ok(files)
}

pub struct SubmissionPipeline<H: Harness> {
    options: PipelineOptions,
    runner: LocalEvalRunner<H>,
    student_source: StudentSource,
}

impl<H: Harness> SubmissionPipeline<H> {
    pub fn new(options: PipelineOptions, runner: LocalEvalRunner<H>) -> Self {
        Self {
            options,
            runner,
            student_source: Box::new(get_student_info),
        }
    }

    /// Replace the environment as the source of student identity
    pub fn with_student_source(mut self, source: StudentSource) -> Self {
        self.student_source = source;
        self
    }

    fn credentials(&self) -> Result<Credentials> {
        if self.options.agent_spec.trim().is_empty() {
            return Err(ConfigError::MissingAgentSpec.into());
        }
        Ok(Credentials::resolve(
            self.options.api_key.clone(),
            self.options.base_url.clone(),
        )?)
    }

    /// Load the battery, run it and print the summary
    async fn evaluate(&self, credentials: &Credentials) -> Result<EvaluationResults> {
        let spec = AgentSpec::parse(&self.options.agent_spec)?;
        let cases_path = self.options.project_path(&self.options.test_cases);

        println!("\nLoading test cases from {}...", self.options.test_cases.display());
        let cases = load_local_test_cases(&cases_path, self.options.num_cases)?;
        println!("Loaded {} test cases", cases.len());

        println!("\nRunning tests...");
        let mut record = EvaluationResults::new(&self.options.agent_spec, &Uuid::new_v4().to_string());
        let start = Instant::now();
        let results = self.runner.run_local_tests(&spec, &cases, credentials).await?;
        let elapsed = start.elapsed().as_secs_f64();
        record.finalize(results, elapsed);

        println!("\nTest Summary:");
        println!("  Completed: {}/{}", record.results.len(), cases.len());
        println!("  Average: {:.2}/10", record.summary.average_score);
        println!("  Time: {:.2}s", elapsed);

        if let Some(output) = &self.options.output {
            record
                .save(output)
                .with_context(|| format!("Failed to save results to {:?}", output))?;
            println!("  Results saved to: {}", output.display());
        }

        Ok(record)
    }

    /// Run the whole pipeline; `Ok(None)` means the leaderboard refused the
    /// submission.
    pub async fn execute(&self) -> Result<Option<Value>> {
        let credentials = self.credentials()?;

        println!("Getting student info...");
        let student_info = (self.student_source)()?;
        println!("Student: {} - {}", student_info.student_id, student_info.name);

        println!("\nCollecting code files for {}...", self.options.agent_spec);
        let files = collect_files(&self.options)?;
        println!("Collected {} files", files.len());

        let record = self.evaluate(&credentials).await?;

        println!("\nSubmitting to leaderboard...");
        let client = LeaderboardClient::new(
            self.options.leaderboard_url.clone(),
            self.options.assignment_id.clone(),
        )?;
        let response = client
            .submit_to_leaderboard(
                &student_info,
                &files,
                &record.results,
                record.summary.elapsed_seconds,
            )
            .await?;

        info!("Leaderboard response: {:?}", response);
        Ok(response)
    }

    /// Evaluate locally without identity checks or submission
    pub async fn execute_local(&self) -> Result<EvaluationResults> {
        let credentials = self.credentials()?;
        self.evaluate(&credentials).await
    }

    /// Full pipeline mapped to a process exit code
    pub async fn run<C>(&self, cancel: C) -> i32
    where
        C: Future<Output = ()>,
    {
        guarded(self.execute(), cancel, |response| match response {
            Some(_) => {
                println!("✓ Submission successful!");
                0
            }
            None => {
                println!("\nLeaderboard Response: None");
                println!("✗ Submission failed");
                1
            }
        })
        .await
    }

    /// Local evaluation mapped to a process exit code
    pub async fn run_local<C>(&self, cancel: C) -> i32
    where
        C: Future<Output = ()>,
    {
        guarded(self.execute_local(), cancel, |_| 0).await
    }
}

/// Race `work` against `cancel` and turn the outcome into an exit code
pub async fn guarded<T, W, C, F>(work: W, cancel: C, on_success: F) -> i32
where
    W: Future<Output = Result<T>>,
    C: Future<Output = ()>,
    F: FnOnce(T) -> i32,
{
    tokio::select! {
        biased;

        _ = cancel => {
            println!("\n\nOperation cancelled by user");
            1
        }
        outcome = work => match outcome {
            Ok(value) => on_success(value),
            Err(err) => {
                println!("\n✗ Error: {}", err);
                eprintln!("{:?}", err);
                1
            }
        },
    }
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed
pub async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
