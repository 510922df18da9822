// Score aggregation for local runs and leaderboard submissions

use crate::eval::TestResult;

/// Decimal places kept in the submitted score
const SUBMITTED_DECIMALS: i32 = 4;

/// Mean score over all results; failed cases count as zero. 0 when empty.
pub fn mean_score(results: &[TestResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    results.iter().map(|r| r.score).sum::<f64>() / results.len() as f64
}

/// Mean score rounded the way the leaderboard expects it
pub fn average_score(results: &[TestResult]) -> f64 {
    round_to(mean_score(results), SUBMITTED_DECIMALS)
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
