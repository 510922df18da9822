use crate::cli::{Credentials, ModelSettings};
use crate::error::SpecError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reference to an agent: a module path and the symbol it exports
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Dotted module reference, e.g. `agents.baseline`
    pub module: String,
    /// Exported agent type, e.g. `BaselineAgent`
    pub symbol: String,
}

impl AgentSpec {
    /// Parse `"module:Symbol"`, splitting at the first colon
    pub fn parse(spec: &str) -> Result<Self, SpecError> {
        let (module, symbol) = spec
            .split_once(':')
            .ok_or_else(|| SpecError(spec.to_string()))?;

        Ok(Self {
            module: module.to_string(),
            symbol: symbol.to_string(),
        })
    }

    /// Top-level package of the module reference
    pub fn base_package(&self) -> &str {
        self.module.split('.').next().unwrap_or(&self.module)
    }
}

impl FromStr for AgentSpec {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for AgentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.symbol)
    }
}

/// An agent under test.
///
/// The harness hands it a long context with needles hidden inside and a
/// question about them; the agent answers in free text.
#[async_trait]
pub trait Agent: Send + Sync {
    async fn respond(&self, context: &str, question: &str) -> anyhow::Result<String>;
}

/// Everything a factory needs to build one agent instance
#[derive(Debug, Clone)]
pub struct AgentContext {
    pub credentials: Credentials,
    pub models: ModelSettings,
}

/// Builds a fresh agent for a single test case
pub type AgentFactory = fn(&AgentContext) -> anyhow::Result<Box<dyn Agent>>;
