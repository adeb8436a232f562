use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::warn;

use crate::classify::Outcome;
use crate::credentials::Tier;
use crate::error::MetricsError;

use super::histogram::LatencyHistogram;
use super::types::{MetricsSnapshot, OutcomeCounts, TierSnapshot};

const P50: f64 = 0.50;
const P95: f64 = 0.95;
const P99: f64 = 0.99;

#[derive(Debug)]
struct TierState {
    counts: OutcomeCounts,
    timeouts: u64,
    dropped_iterations: u64,
    histogram: LatencyHistogram,
}

impl TierState {
    fn new() -> Result<Self, MetricsError> {
        Ok(Self {
            counts: OutcomeCounts::default(),
            timeouts: 0,
            dropped_iterations: 0,
            histogram: LatencyHistogram::new()?,
        })
    }

    fn snapshot(&self) -> TierSnapshot {
        TierSnapshot {
            counts: self.counts,
            timeouts: self.timeouts,
            dropped_iterations: self.dropped_iterations,
            p50_latency_ms: self.histogram.percentile(P50),
            p95_latency_ms: self.histogram.percentile(P95),
            p99_latency_ms: self.histogram.percentile(P99),
            max_latency_ms: self.histogram.max(),
        }
    }
}

/// The only mutable state shared between virtual users. Each tier has its
/// own lock and every `record` is a single critical section, so counters and
/// the latency distribution never disagree.
#[derive(Debug)]
pub struct MetricsAggregator {
    free: Mutex<TierState>,
    premium: Mutex<TierState>,
}

impl MetricsAggregator {
    /// Create an empty aggregator.
    ///
    /// # Errors
    ///
    /// Returns an error if the latency histograms cannot be allocated.
    pub fn new() -> Result<Self, MetricsError> {
        Ok(Self {
            free: Mutex::new(TierState::new()?),
            premium: Mutex::new(TierState::new()?),
        })
    }

    pub fn record(&self, tier: Tier, outcome: Outcome, latency_ms: u64) {
        let mut state = self.lock(tier);
        state.counts.increment(outcome);
        if let Err(err) = state.histogram.record(latency_ms) {
            warn!("Failed to record {} latency: {}", tier, err);
        }
    }

    pub fn record_timeout(&self, tier: Tier) {
        let mut state = self.lock(tier);
        state.timeouts = state.timeouts.saturating_add(1);
    }

    /// Count an arrival-rate iteration that found no free virtual user.
    pub fn record_dropped(&self, tier: Tier) {
        let mut state = self.lock(tier);
        state.dropped_iterations = state.dropped_iterations.saturating_add(1);
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut snapshot = MetricsSnapshot::default();
        let mut overall: Option<LatencyHistogram> = None;
        for tier in Tier::ALL {
            let state = self.lock(tier);
            snapshot.tiers.insert(tier, state.snapshot());
            let Some(merged) = overall.as_mut() else {
                overall = Some(state.histogram.clone());
                continue;
            };
            if let Err(err) = merged.merge(&state.histogram) {
                warn!("Failed to merge {} latencies: {}", tier, err);
            }
        }
        snapshot.p95_latency_ms = overall.map_or(0, |merged| merged.percentile(P95));
        snapshot
    }

    fn lock(&self, tier: Tier) -> MutexGuard<'_, TierState> {
        let state = match tier {
            Tier::Free => &self.free,
            Tier::Premium => &self.premium,
        };
        state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
