//! Leaderboard submission client.
//!
//! One JSON POST per submission. Only an HTTP 200 counts as accepted; the
//! response body is handed back untouched.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cli::{MainContributor, StudentInfo};
use crate::collect::CollectedFiles;
use crate::error::SubmissionError;
use crate::eval::TestResult;
use crate::scoring;

/// Timeout for the submission request
const SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Checksum placeholder the leaderboard expects for the evaluation script
const EVALUATE_CHECKSUM: &str = "3n4o5p6a1b2c3d4e5f6g7h8i9j0k1l2m";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub score: f64,
}

/// Body of the submission request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionPayload {
    pub student_info: StudentInfo,
    pub assignment_id: String,
    pub metrics: Metrics,
    pub checksums: BTreeMap<String, String>,
    /// Project-relative path to base64 file content
    pub files: BTreeMap<String, String>,
    pub main_contributor: MainContributor,
}

/// Client for the submission endpoint
#[derive(Debug, Clone)]
pub struct LeaderboardClient {
    url: String,
    assignment_id: String,
    http_client: Client,
}

impl LeaderboardClient {
    pub fn new(url: impl Into<String>, assignment_id: impl Into<String>) -> Result<Self, SubmissionError> {
        let http_client = Client::builder()
            .timeout(SUBMIT_TIMEOUT)
            .build()
            .map_err(SubmissionError::Client)?;

        Ok(Self {
            url: url.into(),
            assignment_id: assignment_id.into(),
            http_client,
        })
    }

    /// Assemble the payload for a set of results
    pub fn build_payload(
        &self,
        student_info: &StudentInfo,
        files: &CollectedFiles,
        results: &[TestResult],
    ) -> SubmissionPayload {
        let checksums = BTreeMap::from([(
            "evaluate.py".to_string(),
            EVALUATE_CHECKSUM.to_string(),
        )]);

        let files = files
            .iter()
            .map(|(path, content)| (path.clone(), STANDARD.encode(content)))
            .collect();

        SubmissionPayload {
            student_info: student_info.clone(),
            assignment_id: self.assignment_id.clone(),
            metrics: Metrics {
                score: scoring::average_score(results),
            },
            checksums,
            files,
            main_contributor: student_info.main_contributor,
        }
    }

    /// POST a payload.
    ///
    /// `Ok(None)` when the server answers with anything but 200; `Ok(Some)`
    /// carries the parsed body, which may be an empty object.
    pub async fn submit(&self, payload: &SubmissionPayload) -> Result<Option<Value>, SubmissionError> {
        debug!(
            "Posting {} files with score {} to {}",
            payload.files.len(),
            payload.metrics.score,
            self.url
        );

        let response = self
            .http_client
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(SubmissionError::Request)?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!("Leaderboard rejected submission with status {}", status);
            return Ok(None);
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(SubmissionError::InvalidBody)?;
        Ok(Some(body))
    }

    /// Build the payload for `results` and submit it
    pub async fn submit_to_leaderboard(
        &self,
        student_info: &StudentInfo,
        files: &CollectedFiles,
        results: &[TestResult],
        elapsed_seconds: f64,
    ) -> Result<Option<Value>, SubmissionError> {
        let payload = self.build_payload(student_info, files, results);
        info!(
            "Submitting score {:.4} for {} ({} cases in {:.2}s)",
            payload.metrics.score,
            student_info.student_id,
            results.len(),
            elapsed_seconds
        );
        self.submit(&payload).await
    }
}
