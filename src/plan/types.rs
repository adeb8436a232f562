use std::fmt;
use std::time::Duration;

use crate::args::{PositiveU64, PositiveUsize};
use crate::credentials::Tier;
use crate::error::PlanError;

/// Safety ceiling for burst runs, so a degraded target cannot stall the run.
pub const DEFAULT_BURST_MAX_DURATION: Duration = Duration::from_secs(600);
/// Virtual users started up front for a soak run.
pub const DEFAULT_SOAK_MIN_VUS: usize = 10;
/// Upper bound of virtual users a soak run may grow to.
pub const DEFAULT_SOAK_MAX_VUS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeKind {
    Burst,
    Soak,
    RateProbe,
}

impl ModeKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ModeKind::Burst => "burst",
            ModeKind::Soak => "soak",
            ModeKind::RateProbe => "rate-limit-test",
        }
    }

    const fn scenario_suffix(self) -> &'static str {
        match self {
            ModeKind::Burst => "burst",
            ModeKind::Soak => "soak",
            ModeKind::RateProbe => "rate_limit",
        }
    }
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ModeKind {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "burst" => Ok(ModeKind::Burst),
            "soak" => Ok(ModeKind::Soak),
            "rate-limit-test" | "rate-probe" | "rate_probe" | "probe" => Ok(ModeKind::RateProbe),
            _ => Err(PlanError::UnsupportedMode {
                value: s.to_owned(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurstSettings {
    pub vus: PositiveUsize,
    pub iterations: PositiveU64,
    pub max_duration: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoakSettings {
    pub duration: Duration,
    pub rate_free: f64,
    pub rate_premium: f64,
    pub min_vus: PositiveUsize,
    pub max_vus: PositiveUsize,
}

impl SoakSettings {
    #[must_use]
    pub const fn rate(&self, tier: Tier) -> f64 {
        match tier {
            Tier::Free => self.rate_free,
            Tier::Premium => self.rate_premium,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeSettings {
    pub vus: PositiveUsize,
    pub duration: Duration,
}

/// Load shape with its parameters, resolved once from configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mode {
    Burst(BurstSettings),
    Soak(SoakSettings),
    RateProbe(ProbeSettings),
}

impl Mode {
    #[must_use]
    pub const fn kind(&self) -> ModeKind {
        match self {
            Mode::Burst(_) => ModeKind::Burst,
            Mode::Soak(_) => ModeKind::Soak,
            Mode::RateProbe(_) => ModeKind::RateProbe,
        }
    }
}

/// How the runtime schedules virtual users for one tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Executor {
    /// `vus` users share a fixed pool of iterations.
    SharedIterations {
        vus: usize,
        iterations: u64,
        max_duration: Duration,
    },
    /// Iterations start at a fixed rate; users are borrowed per iteration.
    ConstantArrivalRate {
        rate_per_sec: f64,
        pre_allocated_vus: usize,
        max_vus: usize,
        duration: Duration,
    },
    /// `vus` users loop back-to-back until the duration ends.
    ConstantVus { vus: usize, duration: Duration },
}

impl Executor {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Executor::SharedIterations { .. } => "shared-iterations",
            Executor::ConstantArrivalRate { .. } => "constant-arrival-rate",
            Executor::ConstantVus { .. } => "constant-vus",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenarioPlan {
    pub tier: Tier,
    pub mode: ModeKind,
    pub executor: Executor,
}

impl ScenarioPlan {
    /// Scenario label such as `free_burst` or `premium_rate_limit`.
    #[must_use]
    pub fn name(&self) -> String {
        format!("{}_{}", self.tier, self.mode.scenario_suffix())
    }

    /// Most virtual users this plan can have in flight at once.
    #[must_use]
    pub const fn concurrency(&self) -> usize {
        match self.executor {
            Executor::SharedIterations { vus, .. } | Executor::ConstantVus { vus, .. } => vus,
            Executor::ConstantArrivalRate { max_vus, .. } => max_vus,
        }
    }

    #[must_use]
    pub const fn iterations(&self) -> Option<u64> {
        match self.executor {
            Executor::SharedIterations { iterations, .. } => Some(iterations),
            Executor::ConstantArrivalRate { .. } | Executor::ConstantVus { .. } => None,
        }
    }

    #[must_use]
    pub const fn arrival_rate(&self) -> Option<f64> {
        match self.executor {
            Executor::ConstantArrivalRate { rate_per_sec, .. } => Some(rate_per_sec),
            Executor::SharedIterations { .. } | Executor::ConstantVus { .. } => None,
        }
    }

    #[must_use]
    pub const fn duration(&self) -> Option<Duration> {
        match self.executor {
            Executor::ConstantArrivalRate { duration, .. }
            | Executor::ConstantVus { duration, .. } => Some(duration),
            Executor::SharedIterations { .. } => None,
        }
    }

    /// Hard wall-clock bound on the scenario.
    #[must_use]
    pub const fn max_duration(&self) -> Duration {
        match self.executor {
            Executor::SharedIterations { max_duration, .. } => max_duration,
            Executor::ConstantArrivalRate { duration, .. }
            | Executor::ConstantVus { duration, .. } => duration,
        }
    }
}
