mod app;
mod config;
mod http;
mod metrics;
mod plan;
mod pool;
mod validation;

#[cfg(test)]
mod test_support;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use http::HttpError;
pub use metrics::MetricsError;
pub use plan::PlanError;
pub use pool::PoolError;
pub use validation::ValidationError;
