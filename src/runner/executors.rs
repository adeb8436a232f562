use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Semaphore, TryAcquireError};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior, interval, sleep_until};
use tracing::debug;

use crate::credentials::Tier;
use crate::dispatch::RequestDispatcher;
use crate::error::{AppResult, PoolError};
use crate::shutdown::ShutdownSender;

/// Ceiling on any single run window, keeps deadline arithmetic in range.
const MAX_RUN_DURATION: Duration = Duration::from_secs(60 * 60 * 24 * 365);
const MIN_ARRIVAL_PERIOD: Duration = Duration::from_micros(1);

type VuHandle = JoinHandle<Result<u64, PoolError>>;

/// Iterations shared by all users of a shared-iterations scenario.
pub(super) struct IterationBudget {
    limit: u64,
    claimed: AtomicU64,
}

impl IterationBudget {
    pub(super) const fn new(limit: u64) -> Self {
        Self {
            limit,
            claimed: AtomicU64::new(0),
        }
    }

    pub(super) fn try_claim(&self) -> bool {
        loop {
            let current = self.claimed.load(Ordering::Relaxed);
            if current >= self.limit {
                return false;
            }
            let Some(next) = current.checked_add(1) else {
                return false;
            };
            if self
                .claimed
                .compare_exchange(current, next, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                return true;
            }
        }
    }
}

pub(super) fn deadline_after(duration: Duration) -> Instant {
    Instant::now() + duration.min(MAX_RUN_DURATION)
}

/// Closed-loop users: each runs iterations back-to-back until the deadline,
/// shutdown, or (when given) the shared budget is spent.
pub(super) async fn run_looping_vus(
    dispatcher: &RequestDispatcher,
    tier: Tier,
    vus: usize,
    deadline: Instant,
    budget: Option<Arc<IterationBudget>>,
    shutdown_tx: &ShutdownSender,
) -> AppResult<u64> {
    let mut handles: Vec<VuHandle> = Vec::with_capacity(vus);
    for _ in 0..vus {
        let dispatcher = dispatcher.clone();
        let budget = budget.clone();
        let shutdown_tx = shutdown_tx.clone();
        let mut shutdown_rx = shutdown_tx.subscribe();

        handles.push(tokio::spawn(async move {
            let mut completed: u64 = 0;
            loop {
                if Instant::now() >= deadline {
                    break;
                }
                if let Some(budget) = budget.as_ref()
                    && !budget.try_claim()
                {
                    break;
                }
                let result = tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    result = dispatcher.dispatch_once(tier) => result,
                };
                if let Err(err) = result {
                    drop(shutdown_tx.send(()));
                    return Err(err);
                }
                completed = completed.saturating_add(1);
            }
            Ok(completed)
        }));
    }
    join_vus(handles).await
}

/// Iterations finished by an arrival-rate run and the most iterations it
/// ever held in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct ArrivalTally {
    pub(super) completed: u64,
    pub(super) peak_in_flight: usize,
}

/// Open-loop arrivals: one iteration per tick, each borrowing a user slot.
/// A tick that finds every slot busy is counted as dropped. Finished
/// iterations are reaped on every tick, so at most `max_vus` stay tracked.
pub(super) async fn run_arrival_rate(
    dispatcher: &RequestDispatcher,
    tier: Tier,
    rate_per_sec: f64,
    pre_allocated_vus: usize,
    max_vus: usize,
    duration: Duration,
    shutdown_tx: &ShutdownSender,
) -> AppResult<ArrivalTally> {
    let slots = Arc::new(Semaphore::new(max_vus));
    let mut ticker = interval(arrival_period(rate_per_sec, duration));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
    let run_end = sleep_until(deadline_after(duration));
    tokio::pin!(run_end);
    let mut shutdown_rx = shutdown_tx.subscribe();
    let mut in_flight: JoinSet<Result<u64, PoolError>> = JoinSet::new();
    let mut tally = ArrivalTally {
        completed: 0,
        peak_in_flight: 0,
    };
    let mut scaled_up = false;

    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => break,
            () = &mut run_end => break,
            _ = ticker.tick() => {}
        }

        while let Some(joined) = in_flight.try_join_next() {
            match joined? {
                Ok(count) => tally.completed = tally.completed.saturating_add(count),
                Err(err) => {
                    in_flight.abort_all();
                    return Err(err.into());
                }
            }
        }

        let permit = match Arc::clone(&slots).try_acquire_owned() {
            Ok(permit) => permit,
            Err(TryAcquireError::NoPermits) => {
                dispatcher.metrics().record_dropped(tier);
                continue;
            }
            Err(TryAcquireError::Closed) => break,
        };

        let busy = max_vus.saturating_sub(slots.available_permits());
        if !scaled_up && busy > pre_allocated_vus {
            scaled_up = true;
            debug!(
                "{} tier needs more than {} pre-allocated VUs, growing toward {}.",
                tier.label(),
                pre_allocated_vus,
                max_vus
            );
        }

        let dispatcher = dispatcher.clone();
        let shutdown_tx = shutdown_tx.clone();
        let mut iteration_shutdown_rx = shutdown_tx.subscribe();
        in_flight.spawn(async move {
            let _slot = permit;
            let result = tokio::select! {
                _ = iteration_shutdown_rx.recv() => return Ok(0),
                result = dispatcher.dispatch_once(tier) => result,
            };
            match result {
                Ok(_) => Ok(1),
                Err(err) => {
                    drop(shutdown_tx.send(()));
                    Err(err)
                }
            }
        });
        tally.peak_in_flight = tally.peak_in_flight.max(in_flight.len());
    }

    let mut first_error = None;
    while let Some(joined) = in_flight.join_next().await {
        match joined? {
            Ok(count) => tally.completed = tally.completed.saturating_add(count),
            Err(err) => {
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
    }
    if let Some(err) = first_error {
        return Err(err.into());
    }
    Ok(tally)
}

pub(super) fn arrival_period(rate_per_sec: f64, duration: Duration) -> Duration {
    let ceiling = duration.max(MIN_ARRIVAL_PERIOD);
    Duration::try_from_secs_f64(rate_per_sec.recip())
        .unwrap_or(ceiling)
        .clamp(MIN_ARRIVAL_PERIOD, ceiling)
}

async fn join_vus(handles: Vec<VuHandle>) -> AppResult<u64> {
    let mut completed: u64 = 0;
    let mut first_error = None;
    for handle in handles {
        match handle.await? {
            Ok(count) => completed = completed.saturating_add(count),
            Err(err) => {
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
    }
    if let Some(err) = first_error {
        return Err(err.into());
    }
    Ok(completed)
}

