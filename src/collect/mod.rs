//! Agent source harvesting.
//!
//! Starting from the module named by an agent spec, walks the declared module
//! graph depth-first and gathers every source file that lives inside the
//! project root. Files under third-party library directories are never
//! collected. A single unreadable file or dangling import is skipped, never
//! fatal.

mod manifest;

pub use manifest::{ModuleEntry, ModuleGraph};

use crate::agents::AgentSpec;
use crate::error::{CollectError, LoadError};
use std::collections::{BTreeMap, HashSet};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Project-relative path (with `/` separators) to raw file bytes
pub type CollectedFiles = BTreeMap<String, Vec<u8>>;

/// Extensions treated as agent source
const SOURCE_SUFFIXES: &[&str] = &["rs", "py"];

/// Path segments that mark installed third-party code
const THIRD_PARTY_MARKERS: &[&str] = &["site-packages", "dist-packages", ".cargo", "vendor"];

/// Collect the source files of the agent named by `spec`.
///
/// Fails only when the spec is malformed or its module/symbol is not
/// declared in `graph`.
pub fn collect_agent_files(
    spec: &str,
    graph: &ModuleGraph,
    project_root: &Path,
) -> Result<CollectedFiles, CollectError> {
    let spec = AgentSpec::parse(spec)?;

    let root = graph
        .module(&spec.module)
        .ok_or_else(|| LoadError::ModuleNotFound(spec.module.clone()))?;

    if !root.symbols.iter().any(|s| s == &spec.symbol) {
        return Err(LoadError::SymbolNotFound {
            module: spec.module.clone(),
            symbol: spec.symbol.clone(),
        }
        .into());
    }

    let project_root = match project_root.canonicalize() {
        Ok(path) => path,
        Err(e) => {
            warn!("Cannot resolve project root {:?}: {}", project_root, e);
            return Ok(CollectedFiles::new());
        }
    };

    let mut walker = Walker {
        graph,
        project_root,
        base_package: spec.base_package(),
        visited: HashSet::new(),
        files: CollectedFiles::new(),
    };
    walker.visit(root);

    debug!(
        "Visited {} modules, collected {} files",
        walker.visited.len(),
        walker.files.len()
    );

    Ok(walker.files)
}

struct Walker<'a> {
    graph: &'a ModuleGraph,
    project_root: PathBuf,
    base_package: &'a str,
    visited: HashSet<String>,
    files: CollectedFiles,
}

impl<'a> Walker<'a> {
    fn visit(&mut self, module: &'a ModuleEntry) {
        if !self.visited.insert(module.name.clone()) {
            return;
        }

        if let Some(file) = &module.file {
            self.collect_file(&module.name, file);
        }

        for import in &module.imports {
            if is_private(import) || !self.in_package(import) {
                continue;
            }

            match self.graph.module(import) {
                Some(next) => self.visit(next),
                None => debug!("Skipping undeclared import '{}' of {}", import, module.name),
            }
        }
    }

    fn collect_file(&mut self, module: &str, file: &Path) {
        let has_source_suffix = file
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| SOURCE_SUFFIXES.contains(&ext))
            .unwrap_or(false);
        if !has_source_suffix {
            return;
        }

        let resolved = match self.project_root.join(file).canonicalize() {
            Ok(path) => path,
            Err(e) => {
                debug!("Skipping {:?} of {}: {}", file, module, e);
                return;
            }
        };

        let Some(relative) = self.relative_project_path(&resolved) else {
            debug!("Skipping {:?} of {}: outside the project", resolved, module);
            return;
        };

        match std::fs::read(&resolved) {
            Ok(content) => {
                self.files.insert(relative, content);
            }
            Err(e) => debug!("Skipping {:?} of {}: {}", resolved, module, e),
        }
    }

    /// Project-relative key for a resolved path, if it belongs to the project
    fn relative_project_path(&self, resolved: &Path) -> Option<String> {
        let relative = resolved.strip_prefix(&self.project_root).ok()?;
        if is_third_party(relative) {
            return None;
        }

        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join("/"))
        }
    }

    /// Plain name prefix, so `pkgextra.y` belongs to `pkg`
    fn in_package(&self, name: &str) -> bool {
        name.starts_with(self.base_package)
    }
}

fn is_private(name: &str) -> bool {
    name.rsplit('.').next().unwrap_or(name).starts_with('_')
}

fn is_third_party(path: &Path) -> bool {
    path.components().any(|c| match c {
        Component::Normal(segment) => segment
            .to_str()
            .map(|s| THIRD_PARTY_MARKERS.contains(&s))
            .unwrap_or(false),
        _ => false,
    })
}
