//! Executes scenario plans against the dispatcher, one task per tier.
mod executors;


use std::collections::BTreeMap;
use std::sync::Arc;

use futures_util::future::join_all;
use tokio::time::Instant;
use tracing::debug;

use crate::credentials::Tier;
use crate::dispatch::RequestDispatcher;
use crate::error::AppResult;
use crate::metrics::MetricsSnapshot;
use crate::plan::{Executor, ScenarioPlan};
use crate::shutdown::ShutdownSender;

use executors::{IterationBudget, deadline_after, run_arrival_rate, run_looping_vus};

/// Run-level callbacks, each invoked exactly once.
pub trait RunHooks: Send + Sync {
    fn setup(&self, plans: &BTreeMap<Tier, ScenarioPlan>);
    fn teardown(&self, snapshot: &MetricsSnapshot);
}

pub struct ScenarioRunner {
    dispatcher: RequestDispatcher,
    shutdown_tx: ShutdownSender,
}

impl ScenarioRunner {
    #[must_use]
    pub const fn new(dispatcher: RequestDispatcher, shutdown_tx: ShutdownSender) -> Self {
        Self {
            dispatcher,
            shutdown_tx,
        }
    }

    /// Run every tier's plan concurrently and return the final snapshot.
    ///
    /// Teardown sees the snapshot even when a tier fails.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error raised by a tier (a missing credential
    /// tier or a panicked task).
    pub async fn run(
        &self,
        plans: &BTreeMap<Tier, ScenarioPlan>,
        hooks: &dyn RunHooks,
    ) -> AppResult<MetricsSnapshot> {
        hooks.setup(plans);

        let tasks = plans.values().map(|plan| {
            let dispatcher = self.dispatcher.clone();
            let shutdown_tx = self.shutdown_tx.clone();
            let plan = *plan;
            tokio::spawn(async move { run_scenario(&dispatcher, plan, &shutdown_tx).await })
        });
        let results = join_all(tasks).await;

        let snapshot = self.dispatcher.metrics().snapshot();
        hooks.teardown(&snapshot);

        for result in results {
            result??;
        }
        Ok(snapshot)
    }
}

async fn run_scenario(
    dispatcher: &RequestDispatcher,
    plan: ScenarioPlan,
    shutdown_tx: &ShutdownSender,
) -> AppResult<u64> {
    let started = Instant::now();
    let tier = plan.tier;
    let completed = match plan.executor {
        Executor::SharedIterations {
            vus,
            iterations,
            max_duration,
        } => {
            let budget = Arc::new(IterationBudget::new(iterations));
            run_looping_vus(
                dispatcher,
                tier,
                vus,
                deadline_after(max_duration),
                Some(budget),
                shutdown_tx,
            )
            .await?
        }
        Executor::ConstantArrivalRate {
            rate_per_sec,
            pre_allocated_vus,
            max_vus,
            duration,
        } => {
            run_arrival_rate(
                dispatcher,
                tier,
                rate_per_sec,
                pre_allocated_vus,
                max_vus,
                duration,
                shutdown_tx,
            )
            .await?
            .completed
        }
        Executor::ConstantVus { vus, duration } => {
            run_looping_vus(
                dispatcher,
                tier,
                vus,
                deadline_after(duration),
                None,
                shutdown_tx,
            )
            .await?
        }
    };
    debug!(
        "Scenario {} finished {} iterations in {:.2?}.",
        plan.name(),
        completed,
        started.elapsed()
    );
    Ok(completed)
}
