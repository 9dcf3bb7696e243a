//! Shared guardrails for hop query fan-out and deadlines.

use std::time::Duration;

/// Hard ceiling on path records fetched per (seed, hop class) query.
pub const MAX_PATHS_PER_SEED: usize = 100;
/// Hard ceiling on a single hop query deadline.
pub const MAX_QUERY_TIMEOUT_MS: u64 = 60_000;
/// SQLite VM instructions between deadline checks.
pub const DEADLINE_CHECK_INTERVAL: i32 = 1000;

/// Clamp a requested fan-out into `1..=MAX_PATHS_PER_SEED`.
pub fn clamp_limit(value: usize) -> usize {
    value.clamp(1, MAX_PATHS_PER_SEED)
}

/// Deadline for one hop query, or `None` when disabled.
pub fn query_deadline(timeout_ms: u64) -> Option<Duration> {
    if timeout_ms == 0 {
        return None;
    }
    Some(Duration::from_millis(timeout_ms.min(MAX_QUERY_TIMEOUT_MS)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_limit_bounds() {
        assert_eq!(clamp_limit(0), 1);
        assert_eq!(clamp_limit(5), 5);
        assert_eq!(clamp_limit(10_000), MAX_PATHS_PER_SEED);
        assert_eq!(clamp_limit(usize::MAX), MAX_PATHS_PER_SEED);
    }

    #[test]
    fn deadline_disabled_and_capped() {
        assert_eq!(query_deadline(0), None);
        assert_eq!(query_deadline(250), Some(Duration::from_millis(250)));
        assert_eq!(
            query_deadline(u64::MAX),
            Some(Duration::from_millis(MAX_QUERY_TIMEOUT_MS))
        );
    }
}
