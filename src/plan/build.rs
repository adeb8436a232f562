use std::collections::BTreeMap;

use tracing::debug;

use crate::credentials::{PoolSizes, Tier};
use crate::error::PlanError;

use super::types::{Executor, Mode, ScenarioPlan};

/// Build one plan per tier that has credentials.
///
/// Concurrency is always clamped to the tier's pool size so no more
/// identities are in flight than exist. Empty tiers get no plan.
///
/// # Errors
///
/// Returns [`PlanError::NoScenarios`] when no tier has credentials.
pub fn plan(mode: &Mode, pool_sizes: PoolSizes) -> Result<BTreeMap<Tier, ScenarioPlan>, PlanError> {
    let mut plans = BTreeMap::new();
    for tier in Tier::ALL {
        let available = pool_sizes.get(tier);
        if available == 0 {
            debug!("Skipping {} tier: no credentials.", tier);
            continue;
        }
        let executor = executor_for(mode, tier, available);
        plans.insert(
            tier,
            ScenarioPlan {
                tier,
                mode: mode.kind(),
                executor,
            },
        );
    }

    if plans.is_empty() {
        return Err(PlanError::NoScenarios {
            mode: mode.kind().as_str(),
        });
    }
    Ok(plans)
}

fn executor_for(mode: &Mode, tier: Tier, available: usize) -> Executor {
    match mode {
        Mode::Burst(settings) => Executor::SharedIterations {
            vus: settings.vus.get().min(available),
            iterations: settings.iterations.get(),
            max_duration: settings.max_duration,
        },
        Mode::Soak(settings) => {
            let max_vus = settings.max_vus.get().min(available);
            let pre_allocated_vus = settings.min_vus.get().min(max_vus);
            Executor::ConstantArrivalRate {
                rate_per_sec: settings.rate(tier),
                pre_allocated_vus,
                max_vus,
                duration: settings.duration,
            }
        }
        Mode::RateProbe(settings) => Executor::ConstantVus {
            vus: settings.vus.get().min(available),
            duration: settings.duration,
        },
    }
}
