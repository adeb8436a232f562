use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Unsupported mode '{value}'. Use burst, soak, or rate-limit-test.")]
    UnsupportedMode { value: String },
    #[error("No scenarios to run for mode '{mode}' (both tiers are empty).")]
    NoScenarios { mode: &'static str },
}
