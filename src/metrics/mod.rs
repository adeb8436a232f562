//! Run-wide aggregation of classified outcomes and latency distributions.
mod aggregator;
mod histogram;
mod types;


pub use aggregator::MetricsAggregator;
pub use histogram::LatencyHistogram;
pub use types::{MetricsSnapshot, OutcomeCounts, TierSnapshot};
