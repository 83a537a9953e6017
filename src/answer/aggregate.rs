// src/answer/aggregate.rs

use tracing::trace;

use super::types::AggregatedQuantity;

const TOKEN_SEPARATOR: &str = ", ";
const SUM_PREFIX: &str = "SUM > ";

/// Sum every numeric token of a TAPAS answer such as `"SUM > 3.5, SUM > 2.5"`.
///
/// Tokens are split on `", "` and lose a leading `"SUM > "`. Whatever does not
/// parse as a number is skipped, so this never fails.
pub fn aggregate(answer: &str) -> AggregatedQuantity {
    let sum = answer
        .split(TOKEN_SEPARATOR)
        .map(|token| token.strip_prefix(SUM_PREFIX).unwrap_or(token))
        .filter_map(|token| match token.parse::<f64>() {
            Ok(n) => Some(n),
            Err(_) => {
                trace!(token, "skipping non-numeric token");
                None
            }
        })
        .fold(0.0, |acc, n| acc + n);
    AggregatedQuantity::new(sum)
}
