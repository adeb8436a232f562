use clap::Parser;
use std::time::Duration;

use super::defaults::{
    DEFAULT_AUTH_SCHEME, DEFAULT_COMPLETIONS_PATH, DEFAULT_PATH_PREFIX, DEFAULT_TOKEN_FILE_PATH,
};
use super::parsers::{
    parse_bool_env, parse_duration_arg, parse_mode, parse_positive_u64, parse_positive_usize,
    parse_rate, parse_ratio,
};
use super::types::{PositiveU64, PositiveUsize, Scheme};
use crate::plan::ModeKind;

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Load harness for tiered inference gateways: burst, soak, and rate-limit probes with per-tier outcome classification.",
    next_help_heading = "Advanced Options"
)]
pub struct HarnessArgs {
    /// Load shape to run (burst, soak, rate-limit-test)
    #[arg(
        long,
        env = "MODE",
        default_value = "burst",
        value_parser = parse_mode,
        help_heading = "Common Options"
    )]
    pub mode: ModeKind,

    /// Cluster domain; the host defaults to maas.<domain>
    #[arg(
        long = "cluster-domain",
        env = "CLUSTER_DOMAIN",
        default_value = "",
        help_heading = "Common Options"
    )]
    pub cluster_domain: String,

    /// Gateway host (overrides the cluster-domain default)
    #[arg(long, env = "HOST", help_heading = "Common Options")]
    pub host: Option<String>,

    /// URL scheme
    #[arg(
        long,
        env = "PROTOCOL",
        default_value = "http",
        value_enum,
        ignore_case = true,
        help_heading = "Common Options"
    )]
    pub protocol: Scheme,

    /// Model identifier, e.g. facebook/opt-125m
    #[arg(
        long = "model",
        env = "MODEL_NAME",
        default_value = "",
        help_heading = "Common Options"
    )]
    pub model_name: String,

    /// Total iterations shared by all burst users
    #[arg(
        long = "burst-iterations",
        env = "BURST_ITERATIONS",
        default_value = "100",
        value_parser = parse_positive_u64
    )]
    pub burst_iterations: PositiveU64,

    /// Virtual users per tier in burst mode
    #[arg(
        long = "burst-vus",
        env = "BURST_VUS",
        default_value = "10",
        value_parser = parse_positive_usize
    )]
    pub burst_vus: PositiveUsize,

    /// Wall-clock ceiling for a burst run (supports ms/s/m/h)
    #[arg(
        long = "burst-max-duration",
        env = "BURST_MAX_DURATION",
        default_value = "10m",
        value_parser = parse_duration_arg
    )]
    pub burst_max_duration: Duration,

    /// Soak duration (supports ms/s/m/h)
    #[arg(
        long = "soak-duration",
        env = "SOAK_DURATION",
        default_value = "5m",
        value_parser = parse_duration_arg
    )]
    pub soak_duration: Duration,

    /// Free tier arrival rate in requests per second
    #[arg(
        long = "soak-rate-free",
        env = "SOAK_RATE_FREE",
        default_value = "2",
        value_parser = parse_rate
    )]
    pub soak_rate_free: f64,

    /// Premium tier arrival rate in requests per second
    #[arg(
        long = "soak-rate-premium",
        env = "SOAK_RATE_PREMIUM",
        default_value = "5",
        value_parser = parse_rate
    )]
    pub soak_rate_premium: f64,

    /// Virtual users started up front in soak mode
    #[arg(
        long = "soak-min-vus",
        env = "SOAK_MIN_VUS",
        default_value = "10",
        value_parser = parse_positive_usize
    )]
    pub soak_min_vus: PositiveUsize,

    /// Most virtual users a soak run may use
    #[arg(
        long = "soak-max-vus",
        env = "SOAK_MAX_VUS",
        default_value = "50",
        value_parser = parse_positive_usize
    )]
    pub soak_max_vus: PositiveUsize,

    /// Rate-limit probe duration (supports ms/s/m/h)
    #[arg(
        long = "rate-limit-duration",
        env = "RATE_LIMIT_DURATION",
        default_value = "2m",
        value_parser = parse_duration_arg
    )]
    pub rate_limit_duration: Duration,

    /// Virtual users per tier in rate-limit probe mode
    #[arg(
        long = "rate-limit-vus",
        env = "RATE_LIMIT_VUS",
        default_value = "50",
        value_parser = parse_positive_usize
    )]
    pub rate_limit_vus: PositiveUsize,

    /// max_tokens sent by free tier requests
    #[arg(long = "max-tokens-free", env = "MAX_TOKENS_FREE", default_value = "50")]
    pub max_tokens_free: u32,

    /// max_tokens sent by premium tier requests
    #[arg(
        long = "max-tokens-premium",
        env = "MAX_TOKENS_PREMIUM",
        default_value = "100"
    )]
    pub max_tokens_premium: u32,

    /// Request timeout (supports ms/s/m/h)
    #[arg(
        long = "timeout",
        env = "REQUEST_TIMEOUT",
        default_value = "30s",
        value_parser = parse_duration_arg,
        help_heading = "Common Options"
    )]
    pub request_timeout: Duration,

    /// Credential file with `free` and `premium` arrays
    #[arg(
        long = "token-file",
        env = "TOKEN_FILE_PATH",
        default_value = DEFAULT_TOKEN_FILE_PATH,
        help_heading = "Common Options"
    )]
    pub token_file_path: String,

    /// Generate sample credentials instead of reading the token file
    #[arg(
        long = "use-sample-tokens",
        env = "USE_SAMPLE_TOKENS",
        value_parser = parse_bool_env
    )]
    pub use_sample_tokens: bool,

    /// Sample credentials generated per tier
    #[arg(
        long = "sample-size",
        env = "SAMPLE_SIZE",
        default_value = "50",
        value_parser = parse_positive_usize
    )]
    pub sample_size: PositiveUsize,

    /// Authorization scheme placed before the token
    #[arg(long = "auth-scheme", env = "AUTH_SCHEME", default_value = DEFAULT_AUTH_SCHEME)]
    pub auth_scheme: String,

    /// Path segment in front of the model slug
    #[arg(long = "path-prefix", env = "PATH_PREFIX", default_value = DEFAULT_PATH_PREFIX)]
    pub path_prefix: String,

    /// Free tier override for --path-prefix
    #[arg(long = "free-path-prefix", env = "FREE_PATH_PREFIX")]
    pub free_path_prefix: Option<String>,

    /// Premium tier override for --path-prefix
    #[arg(long = "premium-path-prefix", env = "PREMIUM_PATH_PREFIX")]
    pub premium_path_prefix: Option<String>,

    /// Completion endpoint below the model path
    #[arg(
        long = "completions-path",
        env = "COMPLETIONS_PATH",
        default_value = DEFAULT_COMPLETIONS_PATH
    )]
    pub completions_path: String,

    /// Fail the run when overall p95 latency reaches this many milliseconds
    #[arg(
        long = "threshold-p95-ms",
        default_value = "5000",
        value_parser = parse_positive_u64
    )]
    pub threshold_p95_ms: PositiveU64,

    /// Fail the run when the failure ratio reaches this value
    #[arg(
        long = "threshold-max-failure-rate",
        default_value = "0.1",
        value_parser = parse_ratio
    )]
    pub threshold_max_failure_rate: f64,

    /// Fail the run unless the success ratio exceeds this value
    #[arg(
        long = "threshold-min-success-rate",
        default_value = "0.9",
        value_parser = parse_ratio
    )]
    pub threshold_min_success_rate: f64,

    /// Log every request (and non-200 bodies)
    #[arg(long = "debug", short = 'v', env = "DEBUG", value_parser = parse_bool_env)]
    pub debug: bool,

    /// Config file (TOML or JSON)
    #[arg(long = "config", env = "TIERSTRESS_CONFIG")]
    pub config: Option<String>,
}
