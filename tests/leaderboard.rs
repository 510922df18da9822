//! Submission client against a local fake leaderboard

mod common;

use axum::http::StatusCode;
use needle_submit::cli::{MainContributor, StudentInfo};
use needle_submit::collect::CollectedFiles;
use needle_submit::error::SubmissionError;
use needle_submit::eval::{CaseStatus, TestId, TestResult};
use needle_submit::leaderboard::LeaderboardClient;
use serde_json::json;

fn student() -> StudentInfo {
    StudentInfo {
        student_id: "2024001".to_string(),
        name: "Ada".to_string(),
        nickname: "ada".to_string(),
        main_contributor: MainContributor::Human,
    }
}

fn results(scores: &[f64]) -> Vec<TestResult> {
    scores
        .iter()
        .enumerate()
        .map(|(i, &score)| TestResult {
            test_id: TestId::Number(i as i64 + 1),
            score,
            response: "answer".to_string(),
            duration: 0.5,
            status: CaseStatus::Completed,
        })
        .collect()
}

fn files() -> CollectedFiles {
    let mut files = CollectedFiles::new();
    files.insert("student/agent.rs".to_string(), b"hello".to_vec());
    files
}

#[tokio::test]
async fn test_success_returns_body_and_sends_payload() {
    let server = spawn_ok(r#"{"rank": 3, "score": 5.0}"#).await;
    let client = LeaderboardClient::new(&server.url, "05").unwrap();

    let response = client
        .submit_to_leaderboard(&student(), &files(), &results(&[2.0, 4.0, 6.0, 8.0]), 12.0)
        .await
        .unwrap();

    assert_eq!(response, Some(json!({"rank": 3, "score": 5.0})));

    let received = server.received();
    assert_eq!(received.len(), 1);
    let payload = &received[0];
    assert_eq!(payload["metrics"]["score"], 5.0);
    assert_eq!(payload["assignment_id"], "05");
    assert_eq!(payload["files"]["student/agent.rs"], "aGVsbG8=");
    assert_eq!(payload["checksums"]["evaluate.py"], "3n4o5p6a1b2c3d4e5f6g7h8i9j0k1l2m");
    assert_eq!(payload["main_contributor"], "human");
    assert_eq!(payload["student_info"]["name"], "Ada");
}

#[tokio::test]
async fn test_empty_object_is_still_a_response() {
    let server = spawn_ok("{}").await;
    let client = LeaderboardClient::new(&server.url, "05").unwrap();

    let response = client
        .submit_to_leaderboard(&student(), &files(), &results(&[1.0]), 1.0)
        .await
        .unwrap();

    assert_eq!(response, Some(json!({})));
}

#[tokio::test]
async fn test_server_error_yields_no_response() {
    let server = common::spawn_leaderboard(StatusCode::INTERNAL_SERVER_ERROR, "{}").await;
    let client = LeaderboardClient::new(&server.url, "05").unwrap();

    let response = client
        .submit_to_leaderboard(&student(), &files(), &results(&[1.0]), 1.0)
        .await
        .unwrap();

    assert_eq!(response, None);
    assert_eq!(server.received().len(), 1);
}

#[tokio::test]
async fn test_other_success_codes_are_not_accepted() {
    let server = common::spawn_leaderboard(StatusCode::CREATED, "{}").await;
    let client = LeaderboardClient::new(&server.url, "05").unwrap();

    let response = client
        .submit_to_leaderboard(&student(), &files(), &results(&[1.0]), 1.0)
        .await
        .unwrap();

    assert_eq!(response, None);
}

#[tokio::test]
async fn test_non_json_success_body_is_an_error() {
    let server = spawn_ok("<html>ok</html>").await;
    let client = LeaderboardClient::new(&server.url, "05").unwrap();

    let err = client
        .submit_to_leaderboard(&student(), &files(), &results(&[1.0]), 1.0)
        .await
        .unwrap_err();

    assert!(matches!(err, SubmissionError::InvalidBody(_)));
}

#[tokio::test]
async fn test_unreachable_server_is_an_error() {
    // Bind then drop to get a port nobody listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = LeaderboardClient::new(format!("http://{}/api/submit", addr), "05").unwrap();
    let err = client
        .submit_to_leaderboard(&student(), &files(), &results(&[1.0]), 1.0)
        .await
        .unwrap_err();

    assert!(matches!(err, SubmissionError::Request(_)));
}

async fn spawn_ok(body: &str) -> common::FakeLeaderboard {
    common::spawn_leaderboard(StatusCode::OK, body).await
}
