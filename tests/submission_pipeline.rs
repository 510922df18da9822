//! End-to-end runs of the submission pipeline against a scratch project,
//! scripted agents and a local fake leaderboard.

mod common;

use async_trait::async_trait;
use axum::http::StatusCode;
use needle_submit::agents::{Agent, AgentContext, AgentRegistry};
use needle_submit::cli::{MainContributor, StudentInfo};
use needle_submit::error::ConfigError;
use needle_submit::eval::{Evaluator, LocalEvalRunner, MultiNeedleHaystack};
use needle_submit::pipeline::{PipelineOptions, SubmissionPipeline};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const SPEC: &str = "student.agent:StudentAgent";

struct ScriptedAgent;

#[async_trait]
impl Agent for ScriptedAgent {
    async fn respond(&self, context: &str, question: &str) -> anyhow::Result<String> {
        if question == "explode" {
            anyhow::bail!("agent exploded while reading {} chars", context.len());
        }
        Ok("The code word is blue.".to_string())
    }
}

fn scripted_agent(_: &AgentContext) -> anyhow::Result<Box<dyn Agent>> {
    Ok(Box::new(ScriptedAgent))
}

/// Full marks when the reference appears verbatim, otherwise 2
struct ContainsEvaluator;

#[async_trait]
impl Evaluator for ContainsEvaluator {
    async fn score(&self, _question: &str, reference: &str, response: &str) -> anyhow::Result<f64> {
        Ok(if response.contains(reference) { 10.0 } else { 2.0 })
    }
}

fn contains_evaluator(_: &AgentContext) -> anyhow::Result<Box<dyn Evaluator>> {
    Ok(Box::new(ContainsEvaluator))
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Scratch project: manifest, agent sources, three cases and a haystack
fn scratch_project() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    write(
        root,
        "agent_manifest.yaml",
        r#"
modules:
  - name: student.agent
    file: student/agent.rs
    symbols: [StudentAgent]
    imports: [student.memory, serde_json]
  - name: student.memory
    file: student/memory.rs
  - name: serde_json
    file: vendor/serde_json/lib.rs
"#,
    );
    write(root, "student/agent.rs", "pub struct StudentAgent;\n");
    write(root, "student/memory.rs", "pub struct Memory;\n");
    write(root, "vendor/serde_json/lib.rs", "// third party\n");

    let cases = json!([
        {"id": 1, "question": "What is the code word?", "needles": ["The code word is blue."]},
        {"id": 2, "question": "explode", "needles": ["Nothing to see."]},
        {"id": 3, "question": "What is the capital?", "needles": ["The capital is Paris."]}
    ]);
    write(
        root,
        "test_cases/test_cases_all_en.json",
        &serde_json::to_string_pretty(&cases).unwrap(),
    );

    write(
        root,
        "PaulGrahamEssays/essay.txt",
        &"Startups are a way to compress a working life into a few years. ".repeat(50),
    );

    dir
}

fn student() -> Result<StudentInfo, ConfigError> {
    Ok(StudentInfo {
        student_id: "2024001".to_string(),
        name: "Ada".to_string(),
        nickname: "ada".to_string(),
        main_contributor: MainContributor::Human,
    })
}

fn pipeline(
    project: &Path,
    leaderboard_url: &str,
    output: &Path,
) -> SubmissionPipeline<MultiNeedleHaystack> {
    let mut options = PipelineOptions::new(SPEC, project);
    options.api_key = Some("test-key".to_string());
    options.base_url = Some("http://127.0.0.1:9".to_string());
    options.leaderboard_url = leaderboard_url.to_string();
    options.output = Some(output.to_path_buf());

    let runner = LocalEvalRunner::new(
        MultiNeedleHaystack::new().with_context_length(1_000),
        AgentRegistry::new().with(SPEC, scripted_agent),
        contains_evaluator,
        project.join("PaulGrahamEssays"),
    );

    SubmissionPipeline::new(options, runner).with_student_source(Box::new(student))
}

fn saved_results(output: &Path) -> Value {
    let json_file = fs::read_dir(output)
        .unwrap()
        .map(|e| e.unwrap().path())
        .find(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
        .expect("results json written");
    serde_json::from_str(&fs::read_to_string(json_file).unwrap()).unwrap()
}

#[tokio::test]
async fn test_failing_case_does_not_stop_submission() {
    let project = scratch_project();
    let output = tempfile::tempdir().unwrap();
    let server = common::spawn_leaderboard(StatusCode::OK, r#"{"status": "ok"}"#).await;

    let code = pipeline(project.path(), &server.url, output.path())
        .run(std::future::pending())
        .await;

    assert_eq!(code, 0);

    let saved = saved_results(output.path());
    let results = saved["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(
        results.iter().map(|r| r["test_id"].clone()).collect::<Vec<_>>(),
        vec![json!(1), json!(2), json!(3)]
    );

    let errors: Vec<&Value> = results
        .iter()
        .filter(|r| r["response"].as_str().unwrap().starts_with("Error: "))
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["score"], 0.0);
    assert_eq!(errors[0]["test_id"], 2);

    let received = server.received();
    assert_eq!(received.len(), 1);
    let payload = &received[0];
    // (10 + 0 + 2) / 3
    assert_eq!(payload["metrics"]["score"], 4.0);

    let files = payload["files"].as_object().unwrap();
    let mut paths: Vec<&String> = files.keys().collect();
    paths.sort();
    assert_eq!(paths, vec!["student/agent.rs", "student/memory.rs"]);
}

#[tokio::test]
async fn test_case_without_question_fails_alone() {
    let project = scratch_project();
    write(
        project.path(),
        "test_cases/test_cases_all_en.json",
        r#"[
            {"id": 1, "question": "What is the code word?", "needles": ["The code word is blue."]},
            {"id": 2, "needles": ["Nothing to see."]},
            {"id": 3.5, "question": "What is the capital?", "needles": ["The capital is Paris."]}
        ]"#,
    );
    let output = tempfile::tempdir().unwrap();
    let server = common::spawn_leaderboard(StatusCode::OK, "{}").await;

    let code = pipeline(project.path(), &server.url, output.path())
        .run(std::future::pending())
        .await;

    assert_eq!(code, 0);

    let saved = saved_results(output.path());
    let results = saved["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[1]["test_id"], 2);
    assert_eq!(results[1]["score"], 0.0);
    assert!(results[1]["response"]
        .as_str()
        .unwrap()
        .starts_with("Error: invalid test case"));
    assert_eq!(results[2]["test_id"], "3.5");

    let received = server.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0]["metrics"]["score"], 4.0);
}

#[tokio::test]
async fn test_rejected_submission_exits_with_failure() {
    let project = scratch_project();
    let output = tempfile::tempdir().unwrap();
    let server = common::spawn_leaderboard(StatusCode::INTERNAL_SERVER_ERROR, "{}").await;

    let code = pipeline(project.path(), &server.url, output.path())
        .run(std::future::pending())
        .await;

    assert_eq!(code, 1);
    assert_eq!(server.received().len(), 1);
}

#[tokio::test]
async fn test_missing_identity_stops_before_any_work() {
    let project = scratch_project();
    let output = tempfile::tempdir().unwrap();
    let server = common::spawn_leaderboard(StatusCode::OK, "{}").await;

    let code = pipeline(project.path(), &server.url, output.path())
        .with_student_source(Box::new(|| {
            Err(ConfigError::MissingVariables(vec!["STUDENT_ID".to_string()]))
        }))
        .run(std::future::pending())
        .await;

    assert_eq!(code, 1);
    assert!(server.received().is_empty());
    assert_eq!(fs::read_dir(output.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_unknown_agent_symbol_is_fatal() {
    let project = scratch_project();
    let output = tempfile::tempdir().unwrap();
    let server = common::spawn_leaderboard(StatusCode::OK, "{}").await;

    let mut options = PipelineOptions::new("student.agent:Missing", project.path());
    options.api_key = Some("k".to_string());
    options.base_url = Some("http://127.0.0.1:9".to_string());
    options.leaderboard_url = server.url.clone();
    options.output = Some(output.path().to_path_buf());

    let runner = LocalEvalRunner::new(
        MultiNeedleHaystack::new(),
        AgentRegistry::new().with(SPEC, scripted_agent),
        contains_evaluator,
        project.path().join("PaulGrahamEssays"),
    );
    let code = SubmissionPipeline::new(options, runner)
        .with_student_source(Box::new(student))
        .run(std::future::pending())
        .await;

    assert_eq!(code, 1);
    assert!(server.received().is_empty());
}

#[tokio::test]
async fn test_cancellation_is_reported_as_failure() {
    let project = scratch_project();
    let output = tempfile::tempdir().unwrap();
    let server = common::spawn_leaderboard(StatusCode::OK, "{}").await;

    let code = pipeline(project.path(), &server.url, output.path())
        .run(async {})
        .await;

    assert_eq!(code, 1);
    assert!(server.received().is_empty());
}

#[tokio::test]
async fn test_local_run_needs_no_identity() {
    let project = scratch_project();
    let output = tempfile::tempdir().unwrap();

    let pipeline = pipeline(project.path(), "http://127.0.0.1:9/api/submit", output.path())
        .with_student_source(Box::new(|| Err(ConfigError::MissingCredentials)));

    let record = pipeline.execute_local().await.unwrap();
    assert_eq!(record.summary.total, 3);
    assert_eq!(record.summary.failed, 1);
    assert_eq!(record.summary.completed, 2);

    assert_eq!(pipeline.run_local(std::future::pending()).await, 0);
}
