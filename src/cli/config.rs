use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Leaderboard endpoint used when LEADERBOARD_URL is unset
pub const DEFAULT_LEADERBOARD_URL: &str = "http://101.132.193.95:8000/api/submit";

/// Assignment identifier used when ASSIGNMENT_ID is unset
pub const DEFAULT_ASSIGNMENT_ID: &str = "05";

/// Local test case battery, relative to the project root
pub const TEST_CASES_FILE: &str = "test_cases/test_cases_all_en.json";

/// Maximum number of test cases evaluated per submission
pub const NUM_TEST_CASES: usize = 200;

/// Directory of background essays the needles are hidden in
pub const HAYSTACK_DIR: &str = "PaulGrahamEssays";

/// Haystack size in characters
pub const CONTEXT_LENGTH: usize = 16_000;

/// Depth of the first needle, in percent of the haystack
pub const DEPTH_PERCENT: f64 = 10.0;

/// Module graph manifest, relative to the project root
pub const MANIFEST_FILE: &str = "agent_manifest.yaml";

/// Default model for the baseline agent and the evaluator
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Who did most of the work on the submitted agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MainContributor {
    Human,
    Ai,
}

impl fmt::Display for MainContributor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MainContributor::Human => write!(f, "human"),
            MainContributor::Ai => write!(f, "ai"),
        }
    }
}

impl MainContributor {
    /// Parse a contributor value, case-insensitively
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_lowercase().as_str() {
            "human" => Ok(MainContributor::Human),
            "ai" => Ok(MainContributor::Ai),
            other => Err(ConfigError::InvalidContributor(other.to_string())),
        }
    }
}

/// Identity of the submitting student
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentInfo {
    pub student_id: String,
    pub name: String,
    pub nickname: String,
    pub main_contributor: MainContributor,
}

impl StudentInfo {
    /// Build from an arbitrary variable lookup.
    ///
    /// Every blank variable is reported at once, before the contributor
    /// value is validated.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).unwrap_or_default();

        let student_id = read("STUDENT_ID");
        let name = read("STUDENT_NAME");
        let nickname = read("STUDENT_NICKNAME");
        let contributor = read("MAIN_CONTRIBUTOR").to_lowercase();

        let missing: Vec<String> = [
            ("STUDENT_ID", &student_id),
            ("STUDENT_NAME", &name),
            ("STUDENT_NICKNAME", &nickname),
            ("MAIN_CONTRIBUTOR", &contributor),
        ]
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(key, _)| key.to_string())
        .collect();

        if !missing.is_empty() {
            return Err(ConfigError::MissingVariables(missing));
        }

        Ok(Self {
            student_id,
            name,
            nickname,
            main_contributor: MainContributor::parse(&contributor)?,
        })
    }
}

/// Read the student's identity from the process environment
pub fn get_student_info() -> Result<StudentInfo, ConfigError> {
    StudentInfo::from_lookup(|key| std::env::var(key).ok())
}

/// Model API credentials shared by agents and evaluators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub base_url: String,
}

impl Credentials {
    /// Both values must be present and non-blank
    pub fn resolve(api_key: Option<String>, base_url: Option<String>) -> Result<Self, ConfigError> {
        let api_key = api_key.filter(|v| !v.trim().is_empty());
        let base_url = base_url.filter(|v| !v.trim().is_empty());

        match (api_key, base_url) {
            (Some(api_key), Some(base_url)) => Ok(Self { api_key, base_url }),
            _ => Err(ConfigError::MissingCredentials),
        }
    }
}

/// Model names used by the built-in agent and evaluator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSettings {
    pub agent_model: String,
    pub evaluator_model: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            agent_model: DEFAULT_MODEL.to_string(),
            evaluator_model: DEFAULT_MODEL.to_string(),
        }
    }
}
