use std::time::Duration;

use serde_json::json;
use url::Url;

use crate::args::Scheme;
use crate::credentials::{Credential, Tier};
use crate::error::HttpError;
use crate::plan::ModeKind;

use super::transport::TransportRequest;

/// Appended to the slugged model name to form the serving route.
pub const MODEL_SLUG_SUFFIX: &str = "-simulated";
/// `model` field sent when no model is configured.
pub const DEFAULT_MODEL_FIELD: &str = "default-model";

/// `facebook/opt-125m` becomes `facebook-opt-125m-simulated`.
#[must_use]
pub fn model_slug(model: &str) -> String {
    format!("{}{}", model.replace('/', "-"), MODEL_SLUG_SUFFIX)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteConfig {
    pub scheme: Scheme,
    pub host: String,
    pub model_name: String,
    pub path_prefix: String,
    pub free_path_prefix: Option<String>,
    pub premium_path_prefix: Option<String>,
    pub completions_path: String,
}

impl RouteConfig {
    fn prefix(&self, tier: Tier) -> &str {
        let tier_prefix = match tier {
            Tier::Free => self.free_path_prefix.as_deref(),
            Tier::Premium => self.premium_path_prefix.as_deref(),
        };
        tier_prefix.unwrap_or(&self.path_prefix)
    }

    /// Endpoint for `tier`. Without a model the gateway's default route is
    /// used.
    #[must_use]
    pub fn model_url(&self, tier: Tier) -> String {
        let completions = self.completions_path.trim_matches('/');
        if self.model_name.is_empty() {
            return format!("{}://{}/{}", self.scheme.as_str(), self.host, completions);
        }
        let mut segments = Vec::with_capacity(3);
        let prefix = self.prefix(tier).trim_matches('/');
        if !prefix.is_empty() {
            segments.push(prefix.to_owned());
        }
        segments.push(model_slug(&self.model_name));
        segments.push(completions.to_owned());
        format!(
            "{}://{}/{}",
            self.scheme.as_str(),
            self.host,
            segments.join("/")
        )
    }
}

/// Everything about a request except the credential, resolved at setup.
#[derive(Debug, Clone)]
pub struct RequestTemplate {
    free_url: Url,
    premium_url: Url,
    model_field: String,
    auth_scheme: String,
    max_tokens_free: u32,
    max_tokens_premium: u32,
    timeout: Duration,
    mode: ModeKind,
}

impl RequestTemplate {
    /// Resolve per-tier URLs and request settings.
    ///
    /// # Errors
    ///
    /// Returns an error when the host is empty or a URL does not parse.
    pub fn new(
        route: &RouteConfig,
        auth_scheme: &str,
        max_tokens: (u32, u32),
        timeout: Duration,
        mode: ModeKind,
    ) -> Result<Self, HttpError> {
        if route.host.trim().is_empty() {
            return Err(HttpError::MissingHost);
        }
        let model_field = if route.model_name.is_empty() {
            DEFAULT_MODEL_FIELD.to_owned()
        } else {
            route.model_name.clone()
        };
        let (max_tokens_free, max_tokens_premium) = max_tokens;
        Ok(Self {
            free_url: parse_url(&route.model_url(Tier::Free))?,
            premium_url: parse_url(&route.model_url(Tier::Premium))?,
            model_field,
            auth_scheme: auth_scheme.trim().to_owned(),
            max_tokens_free,
            max_tokens_premium,
            timeout,
            mode,
        })
    }

    #[must_use]
    pub const fn url(&self, tier: Tier) -> &Url {
        match tier {
            Tier::Free => &self.free_url,
            Tier::Premium => &self.premium_url,
        }
    }

    #[must_use]
    pub const fn max_tokens(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Free => self.max_tokens_free,
            Tier::Premium => self.max_tokens_premium,
        }
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn prompt(&self, credential: &Credential) -> String {
        match self.mode {
            ModeKind::RateProbe => format!("Rate limit test from {}", credential.user_id),
            ModeKind::Burst | ModeKind::Soak => format!(
                "{} tier test request from {}",
                credential.tier.label(),
                credential.user_id
            ),
        }
    }

    #[must_use]
    pub fn build(&self, credential: &Credential) -> TransportRequest {
        let tier = credential.tier;
        let body = json!({
            "model": self.model_field,
            "prompt": self.prompt(credential),
            "max_tokens": self.max_tokens(tier),
        });
        TransportRequest {
            url: self.url(tier).clone(),
            headers: vec![
                (
                    "Authorization",
                    format!("{} {}", self.auth_scheme, credential.token),
                ),
                ("Content-Type", "application/json".to_owned()),
            ],
            body: body.to_string(),
            timeout: self.timeout,
        }
    }
}

fn parse_url(raw: &str) -> Result<Url, HttpError> {
    Url::parse(raw).map_err(|err| HttpError::InvalidUrl {
        url: raw.to_owned(),
        source: err,
    })
}
