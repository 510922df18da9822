//! Error types for needle-submit

use std::path::PathBuf;
use thiserror::Error;

/// Missing or invalid identity and credential settings
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// One or more identity variables are unset or blank
    #[error("Missing environment variables: {}", .0.join(", "))]
    MissingVariables(Vec<String>),

    /// MAIN_CONTRIBUTOR holds something other than human/ai
    #[error("MAIN_CONTRIBUTOR must be 'human' or 'ai', got: '{0}'")]
    InvalidContributor(String),

    /// API key or base URL absent
    #[error("API_KEY and BASE_URL are required")]
    MissingCredentials,

    /// No agent spec given
    #[error("agent_spec is required")]
    MissingAgentSpec,
}

/// Malformed agent spec string
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid agent spec: {0}. Expected 'module:Class'")]
pub struct SpecError(pub String);

/// The agent spec names something that cannot be resolved
#[derive(Error, Debug)]
pub enum LoadError {
    /// Module not declared in the manifest
    #[error("No module named '{0}'")]
    ModuleNotFound(String),

    /// Module exists but does not export the symbol
    #[error("module '{module}' has no attribute '{symbol}'")]
    SymbolNotFound { module: String, symbol: String },

    /// No factory registered for the spec
    #[error("agent '{0}' is not registered")]
    NotRegistered(String),

    /// Manifest could not be read or parsed
    #[error("Failed to load module manifest {path:?}: {message}")]
    Manifest { path: PathBuf, message: String },
}

/// Failure while harvesting agent files
#[derive(Error, Debug)]
pub enum CollectError {
    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Failure while reading the local test case file
#[derive(Error, Debug)]
pub enum CaseLoadError {
    #[error("Failed to read test cases {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse test cases {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from the chat completions endpoint
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("API response contained no choices")]
    EmptyResponse,
}

/// Errors while talking to the leaderboard
#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Leaderboard request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Leaderboard returned a non-JSON body: {0}")]
    InvalidBody(#[source] reqwest::Error),
}
