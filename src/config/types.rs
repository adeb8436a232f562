use std::time::Duration;

use serde::Deserialize;

use crate::args::Scheme;
use crate::args::parsers::parse_duration_value;
use crate::error::ValidationError;

/// Every field is optional; anything set on the command line or through
/// the environment wins over the file.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub mode: Option<String>,
    pub cluster_domain: Option<String>,
    pub host: Option<String>,
    pub protocol: Option<Scheme>,
    #[serde(alias = "model_name")]
    pub model: Option<String>,
    pub burst_iterations: Option<u64>,
    pub burst_vus: Option<usize>,
    pub burst_max_duration: Option<DurationValue>,
    pub soak_duration: Option<DurationValue>,
    pub soak_rate_free: Option<f64>,
    pub soak_rate_premium: Option<f64>,
    pub soak_min_vus: Option<usize>,
    pub soak_max_vus: Option<usize>,
    pub rate_limit_duration: Option<DurationValue>,
    pub rate_limit_vus: Option<usize>,
    pub max_tokens_free: Option<u32>,
    pub max_tokens_premium: Option<u32>,
    #[serde(alias = "request_timeout")]
    pub timeout: Option<DurationValue>,
    #[serde(alias = "token_file_path")]
    pub token_file: Option<String>,
    pub use_sample_tokens: Option<bool>,
    pub sample_size: Option<usize>,
    pub auth_scheme: Option<String>,
    pub path_prefix: Option<String>,
    pub free_path_prefix: Option<String>,
    pub premium_path_prefix: Option<String>,
    pub completions_path: Option<String>,
    pub debug: Option<bool>,
    pub thresholds: Option<ThresholdsConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ThresholdsConfig {
    pub p95_ms: Option<u64>,
    pub max_failure_rate: Option<f64>,
    pub min_success_rate: Option<f64>,
}

/// Seconds as a number, or a string with a unit such as `"5m"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self) -> Result<Duration, ValidationError> {
        match self {
            DurationValue::Seconds(secs) => {
                if *secs == 0 {
                    Err(ValidationError::DurationZero)
                } else {
                    Ok(Duration::from_secs(*secs))
                }
            }
            DurationValue::Text(text) => parse_duration_value(text),
        }
    }
}
