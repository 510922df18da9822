use std::collections::BTreeMap;
use std::fmt;

use super::types::{AgentFactory, AgentSpec};
use crate::error::LoadError;

/// Maps agent specs to the factories that build them.
///
/// Agents are compiled into the binary, so "loading" an agent means finding
/// its factory here.
#[derive(Clone, Default)]
pub struct AgentRegistry {
    factories: BTreeMap<String, AgentFactory>,
}

impl fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.factories.keys()).finish()
    }
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the agents shipped in this crate
    pub fn builtin() -> Self {
        Self::new().with("agents.baseline:BaselineAgent", super::baseline::build)
    }

    pub fn with(mut self, spec: &str, factory: AgentFactory) -> Self {
        self.register(spec, factory);
        self
    }

    pub fn register(&mut self, spec: &str, factory: AgentFactory) {
        self.factories.insert(spec.to_string(), factory);
    }

    pub fn resolve(&self, spec: &AgentSpec) -> Result<AgentFactory, LoadError> {
        self.factories
            .get(&spec.to_string())
            .copied()
            .ok_or_else(|| LoadError::NotRegistered(spec.to_string()))
    }

    pub fn specs(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}
