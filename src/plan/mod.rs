//! Turns a mode and the pool sizes into one execution plan per tier.
mod build;
mod types;


pub use build::plan;
pub use types::{
    BurstSettings, DEFAULT_BURST_MAX_DURATION, DEFAULT_SOAK_MAX_VUS, DEFAULT_SOAK_MIN_VUS,
    Executor, Mode, ModeKind, ProbeSettings, ScenarioPlan, SoakSettings,
};
