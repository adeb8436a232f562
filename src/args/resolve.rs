use crate::credentials::Tier;
use crate::dispatch::{RequestTemplate, RouteConfig};
use crate::error::HttpError;
use crate::plan::{BurstSettings, Mode, ModeKind, ProbeSettings, SoakSettings};
use crate::threshold::Thresholds;

use super::cli::HarnessArgs;
use super::defaults::HOST_PREFIX;

/// `maas.<domain>`, or `None` without a domain.
#[must_use]
pub fn default_host(cluster_domain: &str) -> Option<String> {
    let domain = cluster_domain.trim();
    if domain.is_empty() {
        None
    } else {
        Some(format!("{}.{}", HOST_PREFIX, domain))
    }
}

impl HarnessArgs {
    /// Explicit host first, then the cluster-domain default.
    #[must_use]
    pub fn resolved_host(&self) -> Option<String> {
        self.host
            .as_deref()
            .map(str::trim)
            .filter(|host| !host.is_empty())
            .map(str::to_owned)
            .or_else(|| default_host(&self.cluster_domain))
    }

    #[must_use]
    pub fn mode_settings(&self) -> Mode {
        match self.mode {
            ModeKind::Burst => Mode::Burst(BurstSettings {
                vus: self.burst_vus,
                iterations: self.burst_iterations,
                max_duration: self.burst_max_duration,
            }),
            ModeKind::Soak => Mode::Soak(SoakSettings {
                duration: self.soak_duration,
                rate_free: self.soak_rate_free,
                rate_premium: self.soak_rate_premium,
                min_vus: self.soak_min_vus,
                max_vus: self.soak_max_vus,
            }),
            ModeKind::RateProbe => Mode::RateProbe(ProbeSettings {
                vus: self.rate_limit_vus,
                duration: self.rate_limit_duration,
            }),
        }
    }

    #[must_use]
    pub const fn thresholds(&self) -> Thresholds {
        Thresholds {
            p95_latency_ms_below: self.threshold_p95_ms.get(),
            max_failure_ratio: self.threshold_max_failure_rate,
            min_success_ratio: self.threshold_min_success_rate,
        }
    }

    #[must_use]
    pub const fn max_tokens(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Free => self.max_tokens_free,
            Tier::Premium => self.max_tokens_premium,
        }
    }

    /// # Errors
    ///
    /// Returns [`HttpError::MissingHost`] when neither a host nor a cluster
    /// domain is configured.
    pub fn route(&self) -> Result<RouteConfig, HttpError> {
        let host = self.resolved_host().ok_or(HttpError::MissingHost)?;
        Ok(RouteConfig {
            scheme: self.protocol,
            host,
            model_name: self.model_name.trim().to_owned(),
            path_prefix: self.path_prefix.clone(),
            free_path_prefix: self.free_path_prefix.clone(),
            premium_path_prefix: self.premium_path_prefix.clone(),
            completions_path: self.completions_path.clone(),
        })
    }

    /// # Errors
    ///
    /// Returns an error when the host is missing or a tier URL is invalid.
    pub fn request_template(&self) -> Result<RequestTemplate, HttpError> {
        RequestTemplate::new(
            &self.route()?,
            &self.auth_scheme,
            (
                self.max_tokens(Tier::Free),
                self.max_tokens(Tier::Premium),
            ),
            self.request_timeout,
            self.mode,
        )
    }
}
