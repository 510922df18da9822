//! Multi-needle haystack harness.
//!
//! Builds a long context from the haystack essays, plants every needle at
//! evenly spaced depths, asks the agent the case's question and has the
//! evaluator grade the answer.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use super::harness::{Evaluator, Harness, TrialRecord, TrialTask};
use crate::agents::Agent;
use crate::cli::{CONTEXT_LENGTH, DEPTH_PERCENT};

/// Needle-in-a-haystack harness backed by a directory of text files
#[derive(Debug, Clone)]
pub struct MultiNeedleHaystack {
    pub context_length: usize,
    pub depth_percent: f64,
    pub results_dir: PathBuf,
    pub contexts_dir: PathBuf,
}

impl Default for MultiNeedleHaystack {
    fn default() -> Self {
        Self {
            context_length: CONTEXT_LENGTH,
            depth_percent: DEPTH_PERCENT,
            results_dir: PathBuf::from("results"),
            contexts_dir: PathBuf::from("contexts"),
        }
    }
}

#[derive(Serialize)]
struct SavedTrial<'a> {
    question: &'a str,
    needles: &'a [String],
    context_length: usize,
    depth_percent: f64,
    results_version: u32,
    #[serde(flatten)]
    record: &'a TrialRecord,
}

impl MultiNeedleHaystack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context_length(mut self, context_length: usize) -> Self {
        self.context_length = context_length;
        self
    }

    pub fn with_depth_percent(mut self, depth_percent: f64) -> Self {
        self.depth_percent = depth_percent.clamp(0.0, 100.0);
        self
    }

    /// Build the haystack with every needle planted
    pub fn build_context(&self, task: &TrialTask) -> Result<String> {
        let haystack = read_haystack(&task.haystack_dir, self.context_length)?;
        Ok(insert_needles(&haystack, &task.needles, self.depth_percent))
    }

    fn save_trial(&self, task: &TrialTask, name: &str, context: &str, record: &TrialRecord) -> Result<()> {
        if task.save_contexts {
            std::fs::create_dir_all(&self.contexts_dir)?;
            let path = self.contexts_dir.join(format!("{}_context.txt", name));
            std::fs::write(&path, context)
                .with_context(|| format!("Failed to write context {:?}", path))?;
        }

        if task.save_results {
            std::fs::create_dir_all(&self.results_dir)?;
            let saved = SavedTrial {
                question: &task.question,
                needles: &task.needles,
                context_length: self.context_length,
                depth_percent: self.depth_percent,
                results_version: task.results_version,
                record,
            };
            let path = self.results_dir.join(format!("{}_results.json", name));
            std::fs::write(&path, serde_json::to_string_pretty(&saved)?)
                .with_context(|| format!("Failed to write results {:?}", path))?;
        }

        Ok(())
    }
}

#[async_trait]
impl Harness for MultiNeedleHaystack {
    async fn run_one(
        &self,
        agent: &dyn Agent,
        evaluator: &dyn Evaluator,
        task: &TrialTask,
    ) -> Result<Vec<TrialRecord>> {
        if task.needles.is_empty() {
            bail!("test case has no needles");
        }

        let context = self.build_context(task)?;
        let mut records = Vec::with_capacity(task.num_tests as usize);

        for trial in 0..task.num_tests {
            let start = Instant::now();
            let response = agent.respond(&context, &task.question).await?;
            let duration = start.elapsed().as_secs_f64();

            let score = evaluator
                .score(&task.question, &task.reference, &response)
                .await?;

            let record = TrialRecord {
                score,
                model_response: response,
                test_duration_seconds: Some(duration),
            };

            if task.print_ongoing_status {
                info!(
                    "Trial {}/{}: score {:.1}, {} needles, {} chars, {:.2}s",
                    trial + 1,
                    task.num_tests,
                    score,
                    task.needles.len(),
                    context.chars().count(),
                    duration
                );
            }

            if task.save_contexts || task.save_results {
                let name = format!(
                    "v{}_len{}_depth{}_{}",
                    task.results_version,
                    self.context_length,
                    self.depth_percent as u32,
                    Uuid::new_v4().simple()
                );
                self.save_trial(task, &name, &context, &record)?;
            }

            records.push(record);
        }

        Ok(records)
    }
}

/// Concatenate the `.txt` files of `dir` (sorted by name) up to `limit` chars
pub fn read_haystack(dir: &Path, limit: usize) -> Result<String> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read haystack directory {:?}", dir))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("txt"))
        .collect();
    files.sort();

    let mut text = String::new();
    let mut chars = 0;
    for file in &files {
        if chars >= limit {
            break;
        }
        let content = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read haystack file {:?}", file))?;
        chars += content.chars().count();
        text.push_str(&content);
    }

    if let Some((cut, _)) = text.char_indices().nth(limit) {
        text.truncate(cut);
    }

    if text.trim().is_empty() {
        bail!("no haystack text found in {:?}", dir);
    }

    debug!("Loaded {} haystack files into {} chars", files.len(), text.chars().count());
    Ok(text)
}

/// Plant needles from `depth_percent` onwards at evenly spaced depths.
///
/// Each needle lands right after the last sentence end before its target
/// position, so sentences are never split.
pub fn insert_needles(haystack: &str, needles: &[String], depth_percent: f64) -> String {
    let mut context = haystack.to_string();
    if needles.is_empty() {
        return context;
    }

    let interval = (100.0 - depth_percent) / needles.len() as f64;
    let mut depth = depth_percent;

    for needle in needles {
        let needle = needle.trim();

        if depth >= 100.0 {
            context.push(' ');
            context.push_str(needle);
        } else {
            let mut target = ((context.len() as f64) * depth / 100.0) as usize;
            target = target.min(context.len());
            while !context.is_char_boundary(target) {
                target -= 1;
            }

            match context[..target].rfind('.') {
                Some(period) => context.insert_str(period + 1, &format!(" {}", needle)),
                None => context.insert_str(0, &format!("{} ", needle)),
            }
        }

        depth += interval;
    }

    context
}
