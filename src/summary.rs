//! Setup and teardown report lines.
use std::collections::BTreeMap;

use tracing::info;

use crate::args::Scheme;
use crate::classify::Outcome;
use crate::credentials::{CredentialPool, Tier};
use crate::metrics::MetricsSnapshot;
use crate::plan::{ModeKind, ScenarioPlan};
use crate::runner::RunHooks;
use crate::threshold::{Thresholds, Verdict, evaluate};

const BANNER_RULE: &str = "=====================================";

/// What the setup banner describes about the run.
#[derive(Debug, Clone)]
pub struct RunDescription {
    pub mode: ModeKind,
    pub host: String,
    pub protocol: Scheme,
    pub model_name: String,
    pub free_url: String,
    pub premium_url: String,
    pub debug: bool,
}

/// Logs the setup banner and the final report.
pub struct ConsoleReport<'run> {
    description: RunDescription,
    pool: &'run CredentialPool,
    thresholds: Thresholds,
}

impl<'run> ConsoleReport<'run> {
    #[must_use]
    pub const fn new(
        description: RunDescription,
        pool: &'run CredentialPool,
        thresholds: Thresholds,
    ) -> Self {
        Self {
            description,
            pool,
            thresholds,
        }
    }
}

impl RunHooks for ConsoleReport<'_> {
    fn setup(&self, plans: &BTreeMap<Tier, ScenarioPlan>) {
        for line in setup_lines(&self.description, self.pool, plans) {
            info!("{}", line);
        }
    }

    fn teardown(&self, snapshot: &MetricsSnapshot) {
        let verdict = evaluate(snapshot, &self.thresholds);
        for line in teardown_lines(snapshot, &verdict) {
            info!("{}", line);
        }
    }
}

#[must_use]
pub fn setup_lines(
    description: &RunDescription,
    pool: &CredentialPool,
    plans: &BTreeMap<Tier, ScenarioPlan>,
) -> Vec<String> {
    let model = if description.model_name.is_empty() {
        "auto-detect"
    } else {
        description.model_name.as_str()
    };
    let mut lines = vec![
        "=== Tiered Gateway Load Test Setup ===".to_owned(),
        format!("Mode: {}", description.mode),
        format!("Host: {}", description.host),
        format!("Protocol: {}", description.protocol.as_str()),
        format!("Model: {}", model),
        format!("Free tokens: {}", pool.len(Tier::Free)),
        format!("Premium tokens: {}", pool.len(Tier::Premium)),
    ];
    for plan in plans.values() {
        lines.push(plan_line(plan));
    }
    if description.debug {
        lines.push(format!("DEBUG: Free model URL: {}", description.free_url));
        lines.push(format!("DEBUG: Premium model URL: {}", description.premium_url));
        for tier in Tier::ALL {
            if let Some(first) = pool.first(tier) {
                lines.push(format!("DEBUG: {} token user: {}", tier.label(), first.user_id));
            }
        }
    }
    lines.push(BANNER_RULE.to_owned());
    lines
}

fn plan_line(plan: &ScenarioPlan) -> String {
    let mut parts = vec![format!(
        "Scenario {}: {} with up to {} VUs",
        plan.name(),
        plan.executor.name(),
        plan.concurrency()
    )];
    if let Some(iterations) = plan.iterations() {
        parts.push(format!("{} iterations", iterations));
    }
    if let Some(rate) = plan.arrival_rate() {
        parts.push(format!("{} req/s", rate));
    }
    parts.push(format!("ends within {:?}", plan.max_duration()));
    parts.join(", ")
}

#[must_use]
pub fn teardown_lines(snapshot: &MetricsSnapshot, verdict: &Verdict) -> Vec<String> {
    let mut lines = vec![
        "=== Tiered Gateway Load Test Complete ===".to_owned(),
        format!("Auth failures: {}", snapshot.count(Outcome::AuthFailure)),
        format!("Rate limit hits: {}", snapshot.count(Outcome::RateLimited)),
        format!(
            "Token limit hits: {}",
            snapshot.count(Outcome::TokenQuotaExceeded)
        ),
    ];
    for (tier, tier_snapshot) in &snapshot.tiers {
        if tier_snapshot.total() == 0 && tier_snapshot.dropped_iterations == 0 {
            continue;
        }
        lines.push(format!(
            "[{}] requests: {}, success: {}, auth: {}, rate-limited: {}, token-limited: {}, failed: {}, timeouts: {}, dropped: {}, p50/p95/p99/max: {}/{}/{}/{}ms",
            tier.label(),
            tier_snapshot.total(),
            tier_snapshot.counts.success,
            tier_snapshot.counts.auth_failure,
            tier_snapshot.counts.rate_limited,
            tier_snapshot.counts.token_quota_exceeded,
            tier_snapshot.counts.generic_failure,
            tier_snapshot.timeouts,
            tier_snapshot.dropped_iterations,
            tier_snapshot.p50_latency_ms,
            tier_snapshot.p95_latency_ms,
            tier_snapshot.p99_latency_ms,
            tier_snapshot.max_latency_ms,
        ));
    }
    lines.push(format!(
        "Success rate: {:.2}%, failure rate: {:.2}%, p95: {}ms",
        snapshot.success_ratio() * 100.0,
        snapshot.failure_ratio() * 100.0,
        snapshot.p95_latency_ms
    ));
    match verdict {
        Verdict::Pass => lines.push("Thresholds: passed".to_owned()),
        Verdict::Fail(violations) => {
            lines.push("Thresholds: FAILED".to_owned());
            for violation in violations {
                lines.push(format!("  - {}", violation));
            }
        }
    }
    lines.push(BANNER_RULE.to_owned());
    lines
}
