use crate::error::CaseLoadError;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Identifier of a test case, as stored in the case file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TestId {
    Number(i64),
    Text(String),
}

impl TestId {
    /// Any stored id except `null`; non-integer values keep their JSON text
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(TestId::Text(s.clone())),
            Value::Number(n) => Some(match n.as_i64() {
                Some(i) => TestId::Number(i),
                None => TestId::Text(n.to_string()),
            }),
            other => Some(TestId::Text(other.to_string())),
        }
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestId::Number(n) => write!(f, "{}", n),
            TestId::Text(s) => write!(f, "{}", s),
        }
    }
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<TestId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(TestId::from_value))
}

/// A single retrieval test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    #[serde(
        default,
        deserialize_with = "lenient_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<TestId>,

    /// Question asked about the hidden needles
    pub question: String,

    /// Facts planted in the haystack
    #[serde(default)]
    pub needles: Vec<String>,

    /// Reference answer used for grading, when the case provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,

    /// Any other fields of the stored case
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A case exactly as it appears in the case file.
///
/// Cases are only checked against [`TestCase`] when they run, so a malformed
/// entry fails on its own instead of taking the whole file down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoredCase(pub Value);

impl StoredCase {
    /// The stored `id`, if any
    pub fn id(&self) -> Option<TestId> {
        self.0.get("id").and_then(TestId::from_value)
    }

    /// Typed view of the case
    pub fn parse(&self) -> Result<TestCase, serde_json::Error> {
        TestCase::deserialize(&self.0)
    }
}

impl From<TestCase> for StoredCase {
    fn from(case: TestCase) -> Self {
        // A TestCase always serializes to an object
        StoredCase(serde_json::to_value(case).unwrap_or(Value::Null))
    }
}

/// Needles to plant for a test case
pub fn get_needles(case: &TestCase) -> Vec<String> {
    case.needles.clone()
}

/// Load the stored cases, sampling down to `cap` when there are more.
///
/// Only an unreadable file or one that is not a JSON array is an error.
pub fn load_local_test_cases<P: AsRef<Path>>(
    path: P,
    cap: usize,
) -> Result<Vec<StoredCase>, CaseLoadError> {
    load_local_test_cases_with_rng(path, cap, &mut rand::thread_rng())
}

/// Same as [`load_local_test_cases`] with a caller-supplied RNG
pub fn load_local_test_cases_with_rng<P: AsRef<Path>, R: Rng + ?Sized>(
    path: P,
    cap: usize,
    rng: &mut R,
) -> Result<Vec<StoredCase>, CaseLoadError> {
    let path = path.as_ref();

    let content = std::fs::read_to_string(path).map_err(|source| CaseLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let all_cases: Vec<StoredCase> =
        serde_json::from_str(&content).map_err(|source| CaseLoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    if all_cases.len() <= cap {
        return Ok(all_cases);
    }

    Ok(all_cases.choose_multiple(rng, cap).cloned().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn write_cases(n: usize) -> tempfile::NamedTempFile {
        let cases: Vec<Value> = (0..n)
            .map(|i| {
                serde_json::json!({
                    "id": i,
                    "question": format!("What is fact {}?", i),
                    "needles": [format!("Fact {} is true.", i)],
                    "category": "single"
                })
            })
            .collect();
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), serde_json::to_string(&cases).unwrap()).unwrap();
        file
    }

    #[test]
    fn test_small_battery_is_returned_whole_and_in_order() {
        let file = write_cases(5);

        let first = load_local_test_cases(file.path(), 5).unwrap();
        let second = load_local_test_cases(file.path(), 200).unwrap();

        assert_eq!(first, second);
        let ids: Vec<TestId> = first.iter().filter_map(StoredCase::id).collect();
        assert_eq!(ids, (0..5).map(TestId::Number).collect::<Vec<_>>());
        assert_eq!(first[0].parse().unwrap().extra["category"], "single");
    }

    #[test]
    fn test_large_battery_is_sampled_without_replacement() {
        let file = write_cases(50);
        let mut rng = StdRng::seed_from_u64(7);

        let sampled = load_local_test_cases_with_rng(file.path(), 10, &mut rng).unwrap();

        assert_eq!(sampled.len(), 10);
        let ids: HashSet<String> = sampled
            .iter()
            .map(|c| c.id().unwrap().to_string())
            .collect();
        assert_eq!(ids.len(), 10);
        for case in &sampled {
            match case.id() {
                Some(TestId::Number(n)) => assert!((0..50).contains(&n)),
                other => panic!("unexpected id {:?}", other),
            }
        }
    }

    #[test]
    fn test_missing_file() {
        let err = load_local_test_cases("/nonexistent/cases.json", 10).unwrap_err();
        assert!(matches!(err, CaseLoadError::Io { .. }));
    }

    #[test]
    fn test_invalid_json() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "{ not json").unwrap();
        let err = load_local_test_cases(file.path(), 10).unwrap_err();
        assert!(matches!(err, CaseLoadError::Parse { .. }));
    }

    #[test]
    fn test_malformed_cases_still_load() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            r#"[
                {"id": 1, "question": "Q1?", "needles": ["a"]},
                {"id": 2, "needles": ["b"]},
                {"id": 1.5, "question": "Q3?", "needles": ["c"]}
            ]"#,
        )
        .unwrap();

        let cases = load_local_test_cases(file.path(), 200).unwrap();

        assert_eq!(cases.len(), 3);
        assert!(cases[0].parse().is_ok());
        assert!(cases[1].parse().unwrap_err().to_string().contains("question"));
        assert_eq!(cases[2].id(), Some(TestId::Text("1.5".to_string())));
        assert_eq!(cases[2].parse().unwrap().id, Some(TestId::Text("1.5".to_string())));
    }

    #[test]
    fn test_null_id_falls_back() {
        let case = StoredCase(serde_json::json!({"id": null, "question": "Q?"}));
        assert_eq!(case.id(), None);
        assert_eq!(case.parse().unwrap().id, None);
    }

    #[test]
    fn test_non_array_file_is_an_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), r#"{"question": "Q?"}"#).unwrap();
        let err = load_local_test_cases(file.path(), 10).unwrap_err();
        assert!(matches!(err, CaseLoadError::Parse { .. }));
    }

    #[test]
    fn test_string_ids_and_missing_needles() {
        let case: TestCase =
            serde_json::from_str(r#"{"id": "case-a", "question": "Q?"}"#).unwrap();
        assert_eq!(case.id, Some(TestId::Text("case-a".to_string())));
        assert!(get_needles(&case).is_empty());
    }
}
