//! Pass/fail gate applied to the final metrics snapshot.
use std::fmt;

use crate::metrics::MetricsSnapshot;


/// Overall p95 must stay strictly below this many milliseconds.
pub const DEFAULT_P95_LATENCY_MS: u64 = 5_000;
/// Failure ratio must stay strictly below this.
pub const DEFAULT_MAX_FAILURE_RATIO: f64 = 0.10;
/// Success ratio must stay strictly above this.
pub const DEFAULT_MIN_SUCCESS_RATIO: f64 = 0.90;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub p95_latency_ms_below: u64,
    pub max_failure_ratio: f64,
    pub min_success_ratio: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            p95_latency_ms_below: DEFAULT_P95_LATENCY_MS,
            max_failure_ratio: DEFAULT_MAX_FAILURE_RATIO,
            min_success_ratio: DEFAULT_MIN_SUCCESS_RATIO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Violation {
    P95Latency { observed_ms: u64, limit_ms: u64 },
    FailureRatio { observed: f64, limit: f64 },
    SuccessRatio { observed: f64, limit: f64 },
    NoRequests,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::P95Latency {
                observed_ms,
                limit_ms,
            } => write!(f, "p95 latency {}ms is not below {}ms", observed_ms, limit_ms),
            Violation::FailureRatio { observed, limit } => write!(
                f,
                "failure rate {:.2}% is not below {:.2}%",
                observed * 100.0,
                limit * 100.0
            ),
            Violation::SuccessRatio { observed, limit } => write!(
                f,
                "success rate {:.2}% is not above {:.2}%",
                observed * 100.0,
                limit * 100.0
            ),
            Violation::NoRequests => f.write_str("no requests completed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Pass,
    Fail(Vec<Violation>),
}

impl Verdict {
    #[must_use]
    pub const fn passed(&self) -> bool {
        matches!(self, Verdict::Pass)
    }

    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        match self {
            Verdict::Pass => &[],
            Verdict::Fail(violations) => violations,
        }
    }
}

/// Check `snapshot` against `thresholds`. All bounds are strict.
#[must_use]
pub fn evaluate(snapshot: &MetricsSnapshot, thresholds: &Thresholds) -> Verdict {
    if snapshot.total() == 0 {
        return Verdict::Fail(vec![Violation::NoRequests]);
    }

    let mut violations = Vec::new();
    if snapshot.p95_latency_ms >= thresholds.p95_latency_ms_below {
        violations.push(Violation::P95Latency {
            observed_ms: snapshot.p95_latency_ms,
            limit_ms: thresholds.p95_latency_ms_below,
        });
    }
    let failure_ratio = snapshot.failure_ratio();
    if failure_ratio >= thresholds.max_failure_ratio {
        violations.push(Violation::FailureRatio {
            observed: failure_ratio,
            limit: thresholds.max_failure_ratio,
        });
    }
    let success_ratio = snapshot.success_ratio();
    if success_ratio <= thresholds.min_success_ratio {
        violations.push(Violation::SuccessRatio {
            observed: success_ratio,
            limit: thresholds.min_success_ratio,
        });
    }

    if violations.is_empty() {
        Verdict::Pass
    } else {
        Verdict::Fail(violations)
    }
}
