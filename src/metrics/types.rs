use std::collections::BTreeMap;

use crate::classify::Outcome;
use crate::credentials::Tier;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeCounts {
    pub success: u64,
    pub auth_failure: u64,
    pub rate_limited: u64,
    pub token_quota_exceeded: u64,
    pub generic_failure: u64,
}

impl OutcomeCounts {
    pub(super) const fn increment(&mut self, outcome: Outcome) {
        let slot = match outcome {
            Outcome::Success => &mut self.success,
            Outcome::AuthFailure => &mut self.auth_failure,
            Outcome::RateLimited => &mut self.rate_limited,
            Outcome::TokenQuotaExceeded => &mut self.token_quota_exceeded,
            Outcome::GenericFailure => &mut self.generic_failure,
        };
        *slot = slot.saturating_add(1);
    }

    #[must_use]
    pub const fn get(&self, outcome: Outcome) -> u64 {
        match outcome {
            Outcome::Success => self.success,
            Outcome::AuthFailure => self.auth_failure,
            Outcome::RateLimited => self.rate_limited,
            Outcome::TokenQuotaExceeded => self.token_quota_exceeded,
            Outcome::GenericFailure => self.generic_failure,
        }
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        Outcome::ALL
            .iter()
            .fold(0_u64, |acc, outcome| acc.saturating_add(self.get(*outcome)))
    }

    #[must_use]
    pub fn failures(&self) -> u64 {
        self.total().saturating_sub(self.success)
    }

    const fn merged(self, other: &OutcomeCounts) -> Self {
        Self {
            success: self.success.saturating_add(other.success),
            auth_failure: self.auth_failure.saturating_add(other.auth_failure),
            rate_limited: self.rate_limited.saturating_add(other.rate_limited),
            token_quota_exceeded: self
                .token_quota_exceeded
                .saturating_add(other.token_quota_exceeded),
            generic_failure: self.generic_failure.saturating_add(other.generic_failure),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierSnapshot {
    pub counts: OutcomeCounts,
    pub timeouts: u64,
    pub dropped_iterations: u64,
    pub p50_latency_ms: u64,
    pub p95_latency_ms: u64,
    pub p99_latency_ms: u64,
    pub max_latency_ms: u64,
}

impl TierSnapshot {
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.total()
    }

    #[must_use]
    pub fn success_ratio(&self) -> f64 {
        ratio(self.counts.success, self.total())
    }
}

/// Point-in-time copy of everything the aggregator has seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub tiers: BTreeMap<Tier, TierSnapshot>,
    /// 95th percentile across all tiers.
    pub p95_latency_ms: u64,
}

impl MetricsSnapshot {
    #[must_use]
    pub fn tier(&self, tier: Tier) -> TierSnapshot {
        self.tiers.get(&tier).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn counts(&self) -> OutcomeCounts {
        self.tiers
            .values()
            .fold(OutcomeCounts::default(), |acc, tier| acc.merged(&tier.counts))
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts().total()
    }

    #[must_use]
    pub fn successes(&self) -> u64 {
        self.counts().success
    }

    #[must_use]
    pub fn count(&self, outcome: Outcome) -> u64 {
        self.counts().get(outcome)
    }

    #[must_use]
    pub fn timeouts(&self) -> u64 {
        self.tiers
            .values()
            .fold(0_u64, |acc, tier| acc.saturating_add(tier.timeouts))
    }

    #[must_use]
    pub fn dropped_iterations(&self) -> u64 {
        self.tiers
            .values()
            .fold(0_u64, |acc, tier| acc.saturating_add(tier.dropped_iterations))
    }

    /// Share of requests classified as [`Outcome::Success`]; 0 when empty.
    #[must_use]
    pub fn success_ratio(&self) -> f64 {
        let counts = self.counts();
        ratio(counts.success, counts.total())
    }

    /// Share of requests with any non-success outcome; 0 when empty.
    #[must_use]
    pub fn failure_ratio(&self) -> f64 {
        let counts = self.counts();
        ratio(counts.failures(), counts.total())
    }
}

const fn ratio(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 / total as f64
}
