use crate::error::LoadError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One module of the agent's source graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleEntry {
    /// Dotted module name, e.g. `agents.baseline`
    pub name: String,

    /// Source file backing this module, relative to the project root
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Public symbols the module exports
    #[serde(default)]
    pub symbols: Vec<String>,

    /// Modules this one pulls in
    #[serde(default)]
    pub imports: Vec<String>,
}

/// Static declaration of which source files make up an agent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleGraph {
    pub modules: Vec<ModuleEntry>,
}

impl ModuleGraph {
    /// Load the graph from a YAML manifest
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let manifest_error = |message: String| LoadError::Manifest {
            path: path.to_path_buf(),
            message,
        };

        let content = std::fs::read_to_string(path).map_err(|e| manifest_error(e.to_string()))?;
        serde_yaml::from_str(&content).map_err(|e| manifest_error(e.to_string()))
    }

    /// Save the graph as YAML
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Look up a module by name; the last entry wins on duplicates
    pub fn module(&self, name: &str) -> Option<&ModuleEntry> {
        self.modules.iter().rev().find(|m| m.name == name)
    }


    /// Manifest describing the baseline agent shipped with this crate
    pub fn sample() -> Self {
        Self {
            modules: vec![
                ModuleEntry {
                    name: "agents.baseline".to_string(),
                    file: Some(PathBuf::from("src/agents/baseline.rs")),
                    symbols: vec!["BaselineAgent".to_string(), "build".to_string()],
                    imports: vec!["agents.types".to_string(), "llm".to_string()],
                },
                ModuleEntry {
                    name: "agents.types".to_string(),
                    file: Some(PathBuf::from("src/agents/types.rs")),
                    symbols: vec![
                        "Agent".to_string(),
                        "AgentContext".to_string(),
                        "AgentSpec".to_string(),
                    ],
                    imports: vec![],
                },
            ],
        }
    }
}
