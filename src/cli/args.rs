use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use super::config::{
    CONTEXT_LENGTH, DEFAULT_ASSIGNMENT_ID, DEFAULT_LEADERBOARD_URL, DEFAULT_MODEL, DEPTH_PERCENT,
    HAYSTACK_DIR, MANIFEST_FILE, NUM_TEST_CASES, TEST_CASES_FILE,
};

/// NEEDLE-SUBMIT: evaluate a retrieval agent and submit it to the leaderboard
///
/// Runs a student agent against the local needle-in-a-haystack battery,
/// averages the scores, and posts the score and agent sources to the
/// assignment leaderboard.
#[derive(Parser, Debug)]
#[command(name = "needle-submit")]
#[command(version = "0.1.0")]
#[command(about = "Evaluate a retrieval agent locally and submit it to the leaderboard")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate the agent and submit the result
    Submit(SubmitArgs),

    /// Evaluate the agent locally without submitting
    Run(RunArgs),

    /// List the source files that would be submitted
    Collect(CollectArgs),

    /// Generate a sample module manifest
    Init(InitArgs),
}

/// Options shared by every command that touches the agent
#[derive(ClapArgs, Debug, Clone)]
pub struct ProjectArgs {
    /// Agent reference in the form "module:Symbol"
    pub agent_spec: String,

    /// Module graph manifest
    #[arg(long, default_value = MANIFEST_FILE)]
    pub manifest: PathBuf,

    /// Project root; defaults to the current directory
    #[arg(long)]
    pub project_root: Option<PathBuf>,
}

/// Options for running the local battery
#[derive(ClapArgs, Debug, Clone)]
pub struct EvalArgs {
    /// Test case file (JSON array)
    #[arg(long, default_value = TEST_CASES_FILE)]
    pub test_cases: PathBuf,

    /// Maximum number of test cases to run
    #[arg(long, default_value_t = NUM_TEST_CASES)]
    pub num_cases: usize,

    /// Directory of haystack text files
    #[arg(long, default_value = HAYSTACK_DIR)]
    pub haystack_dir: PathBuf,

    /// Haystack size in characters
    #[arg(long, default_value_t = CONTEXT_LENGTH)]
    pub context_length: usize,

    /// Depth of the first needle, in percent of the haystack
    #[arg(long, default_value_t = DEPTH_PERCENT)]
    pub depth_percent: f64,

    /// Model API key
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model API base URL
    #[arg(long, env = "BASE_URL")]
    pub base_url: Option<String>,

    /// Model used by the baseline agent
    #[arg(long, env = "AGENT_MODEL", default_value = DEFAULT_MODEL)]
    pub agent_model: String,

    /// Model used to grade responses
    #[arg(long, env = "EVALUATOR_MODEL", default_value = DEFAULT_MODEL)]
    pub evaluator_model: String,

    /// Also write results JSON and a markdown report to this directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct SubmitArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    #[command(flatten)]
    pub eval: EvalArgs,

    /// Leaderboard submission endpoint
    #[arg(long, env = "LEADERBOARD_URL", default_value = DEFAULT_LEADERBOARD_URL)]
    pub leaderboard_url: String,

    /// Assignment identifier
    #[arg(long, env = "ASSIGNMENT_ID", default_value = DEFAULT_ASSIGNMENT_ID)]
    pub assignment_id: String,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    #[command(flatten)]
    pub eval: EvalArgs,
}

#[derive(Parser, Debug)]
pub struct CollectArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Output path for the manifest
    #[arg(short, long, default_value = MANIFEST_FILE)]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}
