use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::parsers::{validate_rate, validate_ratio};
use crate::args::{HarnessArgs, PositiveU64, PositiveUsize};
use crate::error::{ConfigError, ValidationError};
use crate::plan::ModeKind;

use super::types::{ConfigFile, DurationValue};

/// Applies configuration values to CLI arguments.
///
/// Only options left at their built-in default are filled from the file.
///
/// # Errors
///
/// Returns an error when a config value is invalid.
pub fn apply_config(
    args: &mut HarnessArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> Result<(), ConfigError> {
    if !is_explicit(matches, "mode")
        && let Some(mode) = config.mode.as_deref()
    {
        args.mode = mode
            .parse::<ModeKind>()
            .map_err(|err| ConfigError::InvalidMode { source: err })?;
    }

    if !is_explicit(matches, "cluster_domain")
        && let Some(domain) = config.cluster_domain.clone()
    {
        args.cluster_domain = domain;
    }

    if !is_explicit(matches, "host")
        && let Some(host) = config.host.clone()
    {
        args.host = Some(host);
    }

    if !is_explicit(matches, "protocol")
        && let Some(protocol) = config.protocol
    {
        args.protocol = protocol;
    }

    if !is_explicit(matches, "model_name")
        && let Some(model) = config.model.clone()
    {
        args.model_name = model;
    }

    apply_burst(args, matches, config)?;
    apply_soak(args, matches, config)?;

    if !is_explicit(matches, "rate_limit_duration")
        && let Some(duration) = config.rate_limit_duration.as_ref()
    {
        args.rate_limit_duration = duration_field(duration, "rate_limit_duration")?;
    }

    if !is_explicit(matches, "rate_limit_vus")
        && let Some(vus) = config.rate_limit_vus
    {
        args.rate_limit_vus = ensure_positive_usize(vus, "rate_limit_vus")?;
    }

    if !is_explicit(matches, "max_tokens_free")
        && let Some(tokens) = config.max_tokens_free
    {
        args.max_tokens_free = tokens;
    }

    if !is_explicit(matches, "max_tokens_premium")
        && let Some(tokens) = config.max_tokens_premium
    {
        args.max_tokens_premium = tokens;
    }

    if !is_explicit(matches, "request_timeout")
        && let Some(timeout) = config.timeout.as_ref()
    {
        args.request_timeout = duration_field(timeout, "timeout")?;
    }

    apply_credentials(args, matches, config)?;
    apply_route(args, matches, config);

    if !is_explicit(matches, "debug")
        && let Some(debug) = config.debug
    {
        args.debug = debug;
    }

    apply_thresholds(args, matches, config)
}

fn apply_burst(
    args: &mut HarnessArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> Result<(), ConfigError> {
    if !is_explicit(matches, "burst_iterations")
        && let Some(iterations) = config.burst_iterations
    {
        args.burst_iterations = ensure_positive_u64(iterations, "burst_iterations")?;
    }

    if !is_explicit(matches, "burst_vus")
        && let Some(vus) = config.burst_vus
    {
        args.burst_vus = ensure_positive_usize(vus, "burst_vus")?;
    }

    if !is_explicit(matches, "burst_max_duration")
        && let Some(duration) = config.burst_max_duration.as_ref()
    {
        args.burst_max_duration = duration_field(duration, "burst_max_duration")?;
    }
    Ok(())
}

fn apply_soak(
    args: &mut HarnessArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> Result<(), ConfigError> {
    if !is_explicit(matches, "soak_duration")
        && let Some(duration) = config.soak_duration.as_ref()
    {
        args.soak_duration = duration_field(duration, "soak_duration")?;
    }

    if !is_explicit(matches, "soak_rate_free")
        && let Some(rate) = config.soak_rate_free
    {
        args.soak_rate_free = validate_rate(rate).map_err(|err| invalid("soak_rate_free", err))?;
    }

    if !is_explicit(matches, "soak_rate_premium")
        && let Some(rate) = config.soak_rate_premium
    {
        args.soak_rate_premium =
            validate_rate(rate).map_err(|err| invalid("soak_rate_premium", err))?;
    }

    if !is_explicit(matches, "soak_min_vus")
        && let Some(vus) = config.soak_min_vus
    {
        args.soak_min_vus = ensure_positive_usize(vus, "soak_min_vus")?;
    }

    if !is_explicit(matches, "soak_max_vus")
        && let Some(vus) = config.soak_max_vus
    {
        args.soak_max_vus = ensure_positive_usize(vus, "soak_max_vus")?;
    }
    Ok(())
}

fn apply_credentials(
    args: &mut HarnessArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> Result<(), ConfigError> {
    if !is_explicit(matches, "token_file_path")
        && let Some(path) = config.token_file.clone()
    {
        args.token_file_path = path;
    }

    if !is_explicit(matches, "use_sample_tokens")
        && let Some(use_sample) = config.use_sample_tokens
    {
        args.use_sample_tokens = use_sample;
    }

    if !is_explicit(matches, "sample_size")
        && let Some(size) = config.sample_size
    {
        args.sample_size = ensure_positive_usize(size, "sample_size")?;
    }
    Ok(())
}

fn apply_route(args: &mut HarnessArgs, matches: &ArgMatches, config: &ConfigFile) {
    if !is_explicit(matches, "auth_scheme")
        && let Some(scheme) = config.auth_scheme.clone()
    {
        args.auth_scheme = scheme;
    }

    if !is_explicit(matches, "path_prefix")
        && let Some(prefix) = config.path_prefix.clone()
    {
        args.path_prefix = prefix;
    }

    if !is_explicit(matches, "free_path_prefix")
        && let Some(prefix) = config.free_path_prefix.clone()
    {
        args.free_path_prefix = Some(prefix);
    }

    if !is_explicit(matches, "premium_path_prefix")
        && let Some(prefix) = config.premium_path_prefix.clone()
    {
        args.premium_path_prefix = Some(prefix);
    }

    if !is_explicit(matches, "completions_path")
        && let Some(path) = config.completions_path.clone()
    {
        args.completions_path = path;
    }
}

fn apply_thresholds(
    args: &mut HarnessArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> Result<(), ConfigError> {
    let Some(thresholds) = config.thresholds.as_ref() else {
        return Ok(());
    };

    if !is_explicit(matches, "threshold_p95_ms")
        && let Some(p95) = thresholds.p95_ms
    {
        args.threshold_p95_ms = ensure_positive_u64(p95, "thresholds.p95_ms")?;
    }

    if !is_explicit(matches, "threshold_max_failure_rate")
        && let Some(rate) = thresholds.max_failure_rate
    {
        args.threshold_max_failure_rate =
            validate_ratio(rate).map_err(|err| invalid("thresholds.max_failure_rate", err))?;
    }

    if !is_explicit(matches, "threshold_min_success_rate")
        && let Some(rate) = thresholds.min_success_rate
    {
        args.threshold_min_success_rate =
            validate_ratio(rate).map_err(|err| invalid("thresholds.min_success_rate", err))?;
    }
    Ok(())
}

fn is_explicit(matches: &ArgMatches, name: &str) -> bool {
    matches!(
        matches.value_source(name),
        Some(ValueSource::CommandLine | ValueSource::EnvVariable)
    )
}

const fn invalid(field: &'static str, source: ValidationError) -> ConfigError {
    ConfigError::InvalidField { field, source }
}

fn duration_field(value: &DurationValue, field: &'static str) -> Result<std::time::Duration, ConfigError> {
    value.to_duration().map_err(|err| invalid(field, err))
}

fn ensure_positive_u64(value: u64, field: &'static str) -> Result<PositiveU64, ConfigError> {
    PositiveU64::try_from(value).map_err(|err| invalid(field, err))
}

fn ensure_positive_usize(value: usize, field: &'static str) -> Result<PositiveUsize, ConfigError> {
    PositiveUsize::try_from(value).map_err(|err| invalid(field, err))
}
