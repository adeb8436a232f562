use super::dispatcher::exchange_debug_lines;
use super::*;
use crate::args::Scheme;
use crate::classify::{BODY_SNIPPET_LIMIT, Exchange, Outcome, TRANSPORT_FAILURE_STATUS, TransportErrorKind};
use crate::credentials::{Credential, CredentialPool, Tier};
use crate::error::{AppError, AppResult, HttpError, PoolError};
use crate::metrics::MetricsAggregator;
use crate::plan::ModeKind;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Scripted = Result<TransportReply, TransportErrorKind>;

struct ScriptedTransport {
    replies: Mutex<VecDeque<Scripted>>,
    seen: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    fn new(replies: Vec<Scripted>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn seen(&self) -> Vec<TransportRequest> {
        match self.seen.lock() {
            Ok(seen) => seen.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportReply, TransportErrorKind> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(request);
        }
        let next = match self.replies.lock() {
            Ok(mut replies) => replies.pop_front(),
            Err(_) => None,
        };
        next.unwrap_or(Err(TransportErrorKind::Other))
    }
}

fn reply(status: u16, body: &str) -> TransportReply {
    TransportReply {
        status,
        body: body.to_owned(),
    }
}

fn route(model: &str) -> RouteConfig {
    RouteConfig {
        scheme: Scheme::Http,
        host: "maas.apps.example.com".to_owned(),
        model_name: model.to_owned(),
        path_prefix: "llm".to_owned(),
        free_path_prefix: None,
        premium_path_prefix: None,
        completions_path: "v1/chat/completions".to_owned(),
    }
}

fn template(model: &str, mode: ModeKind) -> AppResult<RequestTemplate> {
    Ok(RequestTemplate::new(
        &route(model),
        "Bearer",
        (50, 100),
        Duration::from_secs(30),
        mode,
    )?)
}

fn single_pool() -> AppResult<Arc<CredentialPool>> {
    Ok(Arc::new(CredentialPool::from_tiers(
        vec![Credential::new("freeuser1", "free-token", Tier::Free)],
        vec![Credential::new("premiumuser1", "premium-token", Tier::Premium)],
    )?))
}

fn dispatcher(
    transport: Arc<ScriptedTransport>,
    mode: ModeKind,
) -> AppResult<(RequestDispatcher, Arc<MetricsAggregator>)> {
    let metrics = Arc::new(MetricsAggregator::new()?);
    let dispatcher = RequestDispatcher::new(
        single_pool()?,
        template("facebook/opt-125m", mode)?,
        transport,
        Arc::clone(&metrics),
        true,
    );
    Ok((dispatcher, metrics))
}

fn header<'a>(request: &'a TransportRequest, name: &str) -> Option<&'a str> {
    request
        .headers
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.as_str())
}

#[test]
fn model_slug_replaces_slashes() -> AppResult<()> {
    let slug = model_slug("facebook/opt-125m");
    if slug != "facebook-opt-125m-simulated" {
        return Err(AppError::validation(format!("Unexpected slug: {}", slug)));
    }
    Ok(())
}

#[test]
fn model_url_uses_prefix_and_slug() -> AppResult<()> {
    let url = route("facebook/opt-125m").model_url(Tier::Free);
    if url != "http://maas.apps.example.com/llm/facebook-opt-125m-simulated/v1/chat/completions" {
        return Err(AppError::validation(format!("Unexpected url: {}", url)));
    }
    Ok(())
}

#[test]
fn model_url_without_model_hits_default_route() -> AppResult<()> {
    let url = route("").model_url(Tier::Premium);
    if url != "http://maas.apps.example.com/v1/chat/completions" {
        return Err(AppError::validation(format!("Unexpected url: {}", url)));
    }
    Ok(())
}

#[test]
fn tier_prefix_overrides_shared_prefix() -> AppResult<()> {
    let mut config = route("granite");
    config.premium_path_prefix = Some("/simple/llm/".to_owned());
    let premium = config.model_url(Tier::Premium);
    let free = config.model_url(Tier::Free);
    if premium != "http://maas.apps.example.com/simple/llm/granite-simulated/v1/chat/completions" {
        return Err(AppError::validation(format!("Unexpected premium url: {}", premium)));
    }
    if free != "http://maas.apps.example.com/llm/granite-simulated/v1/chat/completions" {
        return Err(AppError::validation(format!("Unexpected free url: {}", free)));
    }
    Ok(())
}

#[test]
fn template_rejects_empty_host() -> AppResult<()> {
    let mut config = route("granite");
    config.host = "  ".to_owned();
    match RequestTemplate::new(&config, "Bearer", (1, 1), Duration::from_secs(1), ModeKind::Burst) {
        Err(HttpError::MissingHost) => Ok(()),
        Err(err) => Err(AppError::validation(format!("Unexpected error: {}", err))),
        Ok(_) => Err(AppError::validation("Expected empty host to be rejected")),
    }
}

#[test]
fn template_rejects_unparseable_host() -> AppResult<()> {
    let mut config = route("granite");
    config.host = "bad host:notaport".to_owned();
    match RequestTemplate::new(&config, "Bearer", (1, 1), Duration::from_secs(1), ModeKind::Burst) {
        Err(HttpError::InvalidUrl { .. }) => Ok(()),
        Err(err) => Err(AppError::validation(format!("Unexpected error: {}", err))),
        Ok(_) => Err(AppError::validation("Expected invalid host to be rejected")),
    }
}

#[test]
fn build_sets_auth_body_and_timeout() -> AppResult<()> {
    let template = template("facebook/opt-125m", ModeKind::Burst)?;
    let credential = Credential::new("premiumuser3", "tok-3", Tier::Premium);
    let request = template.build(&credential);

    if header(&request, "Authorization") != Some("Bearer tok-3") {
        return Err(AppError::validation("Expected bearer authorization header"));
    }
    if header(&request, "Content-Type") != Some("application/json") {
        return Err(AppError::validation("Expected JSON content type"));
    }
    if request.timeout != Duration::from_secs(30) {
        return Err(AppError::validation("Expected request timeout to carry over"));
    }
    let body: serde_json::Value = serde_json::from_str(&request.body)
        .map_err(|err| AppError::validation(format!("Body is not JSON: {}", err)))?;
    if body.get("model").and_then(serde_json::Value::as_str) != Some("facebook/opt-125m") {
        return Err(AppError::validation(format!("Unexpected model field: {}", body)));
    }
    if body.get("max_tokens").and_then(serde_json::Value::as_u64) != Some(100) {
        return Err(AppError::validation(format!("Unexpected max_tokens: {}", body)));
    }
    if body.get("prompt").and_then(serde_json::Value::as_str)
        != Some("Premium tier test request from premiumuser3")
    {
        return Err(AppError::validation(format!("Unexpected prompt: {}", body)));
    }
    Ok(())
}

#[test]
fn build_without_model_sends_default_model_field() -> AppResult<()> {
    let template = template("", ModeKind::RateProbe)?;
    let credential = Credential::new("freeuser9", "tok-9", Tier::Free);
    let request = template.build(&credential);
    let body: serde_json::Value = serde_json::from_str(&request.body)
        .map_err(|err| AppError::validation(format!("Body is not JSON: {}", err)))?;
    if body.get("model").and_then(serde_json::Value::as_str) != Some(DEFAULT_MODEL_FIELD) {
        return Err(AppError::validation(format!("Unexpected model field: {}", body)));
    }
    if body.get("max_tokens").and_then(serde_json::Value::as_u64) != Some(50) {
        return Err(AppError::validation(format!("Unexpected max_tokens: {}", body)));
    }
    if body.get("prompt").and_then(serde_json::Value::as_str)
        != Some("Rate limit test from freeuser9")
    {
        return Err(AppError::validation(format!("Unexpected prompt: {}", body)));
    }
    Ok(())
}

#[tokio::test]
async fn dispatch_records_classified_outcomes() -> AppResult<()> {
    let transport = Arc::new(ScriptedTransport::new(vec![
        Ok(reply(200, "{\"choices\":[]}")),
        Ok(reply(429, "token rate limit exceeded")),
        Ok(reply(429, "Too many requests")),
        Ok(reply(401, "unauthorized")),
        Ok(reply(503, "unavailable")),
    ]));
    let (dispatcher, metrics) = dispatcher(Arc::clone(&transport), ModeKind::Burst)?;

    for tier in [Tier::Free, Tier::Premium, Tier::Premium, Tier::Free, Tier::Free] {
        dispatcher.dispatch_once(tier).await?;
    }

    let snapshot = metrics.snapshot();
    let expected = [
        (Outcome::Success, 1),
        (Outcome::TokenQuotaExceeded, 1),
        (Outcome::RateLimited, 1),
        (Outcome::AuthFailure, 1),
        (Outcome::GenericFailure, 1),
    ];
    for (outcome, count) in expected {
        if snapshot.count(outcome) != count {
            return Err(AppError::validation(format!(
                "Expected {} {}, got {:?}",
                count, outcome, snapshot
            )));
        }
    }
    if snapshot.tier(Tier::Free).total() != 3 || snapshot.tier(Tier::Premium).total() != 2 {
        return Err(AppError::validation(format!(
            "Unexpected per-tier totals: {:?}",
            snapshot
        )));
    }

    let seen = transport.seen();
    let free_auth = seen.first().and_then(|request| header(request, "Authorization"));
    if free_auth != Some("Bearer free-token") {
        return Err(AppError::validation(format!(
            "Expected free credential on first request, got {:?}",
            free_auth
        )));
    }
    Ok(())
}

#[tokio::test]
async fn transport_timeout_records_failure_and_timeout() -> AppResult<()> {
    let transport = Arc::new(ScriptedTransport::new(vec![Err(TransportErrorKind::Timeout)]));
    let (dispatcher, metrics) = dispatcher(transport, ModeKind::Soak)?;

    let exchange = dispatcher.dispatch_once(Tier::Premium).await?;
    if exchange.status_code != TRANSPORT_FAILURE_STATUS || !exchange.is_timeout() {
        return Err(AppError::validation(format!(
            "Expected timeout exchange, got {:?}",
            exchange
        )));
    }
    let snapshot = metrics.snapshot();
    let premium = snapshot.tier(Tier::Premium);
    if premium.counts.generic_failure != 1 || premium.timeouts != 1 {
        return Err(AppError::validation(format!(
            "Expected one timed-out failure, got {:?}",
            premium
        )));
    }
    Ok(())
}

#[tokio::test]
async fn connect_error_is_generic_failure_without_timeout() -> AppResult<()> {
    let transport = Arc::new(ScriptedTransport::new(vec![Err(TransportErrorKind::Connect)]));
    let (dispatcher, metrics) = dispatcher(transport, ModeKind::Burst)?;

    dispatcher.dispatch_once(Tier::Free).await?;
    let snapshot = metrics.snapshot();
    if snapshot.count(Outcome::GenericFailure) != 1 || snapshot.timeouts() != 0 {
        return Err(AppError::validation(format!(
            "Unexpected snapshot: {:?}",
            snapshot
        )));
    }
    Ok(())
}

#[tokio::test]
async fn long_bodies_are_truncated() -> AppResult<()> {
    let body = "x".repeat(BODY_SNIPPET_LIMIT * 3);
    let transport = Arc::new(ScriptedTransport::new(vec![Ok(reply(500, &body))]));
    let (dispatcher, _metrics) = dispatcher(transport, ModeKind::Burst)?;

    let exchange = dispatcher.dispatch_once(Tier::Free).await?;
    if exchange.body_snippet.len() != BODY_SNIPPET_LIMIT {
        return Err(AppError::validation(format!(
            "Expected {} byte snippet, got {}",
            BODY_SNIPPET_LIMIT,
            exchange.body_snippet.len()
        )));
    }
    Ok(())
}

#[tokio::test]
async fn empty_tier_is_an_error() -> AppResult<()> {
    let pool = Arc::new(CredentialPool::from_tiers(
        vec![Credential::new("freeuser1", "t", Tier::Free)],
        Vec::new(),
    )?);
    let metrics = Arc::new(MetricsAggregator::new()?);
    let dispatcher = RequestDispatcher::new(
        pool,
        template("granite", ModeKind::Burst)?,
        Arc::new(ScriptedTransport::new(Vec::new())),
        Arc::clone(&metrics),
        false,
    );

    match dispatcher.dispatch_once(Tier::Premium).await {
        Err(PoolError::EmptyTier { tier: Tier::Premium }) => {}
        Err(err) => return Err(AppError::validation(format!("Unexpected error: {}", err))),
        Ok(exchange) => {
            return Err(AppError::validation(format!(
                "Expected empty tier error, got {:?}",
                exchange
            )));
        }
    }
    if metrics.snapshot().total() != 0 {
        return Err(AppError::validation("Nothing should be recorded"));
    }
    Ok(())
}

fn debug_exchange(status_code: u16, transport_error: Option<TransportErrorKind>) -> Exchange {
    Exchange {
        tier: Tier::Free,
        user_id: "freeuser2".to_owned(),
        status_code,
        latency_ms: 12,
        body_snippet: "quota body".to_owned(),
        transport_error,
    }
}

#[test]
fn debug_lines_carry_url_and_body_only_for_non_200() -> AppResult<()> {
    let url = url::Url::parse("http://maas.example.com/llm/granite-simulated/v1/chat/completions")
        .map_err(|err| AppError::validation(err.to_string()))?;

    let ok = exchange_debug_lines(&debug_exchange(200, None), Outcome::Success, &url);
    if ok.len() != 1
        || ok.first().map(String::as_str)
            != Some(
                "Free tier - User: freeuser2, Status: 200, URL: http://maas.example.com/llm/granite-simulated/v1/chat/completions",
            )
    {
        return Err(AppError::validation(format!("Unexpected 200 lines: {:?}", ok)));
    }

    let limited = exchange_debug_lines(&debug_exchange(429, None), Outcome::RateLimited, &url);
    if limited.len() != 2 || !limited.iter().any(|line| line.contains("Body: quota body")) {
        return Err(AppError::validation(format!("Unexpected 429 lines: {:?}", limited)));
    }

    let failed = exchange_debug_lines(
        &debug_exchange(TRANSPORT_FAILURE_STATUS, Some(TransportErrorKind::Timeout)),
        Outcome::GenericFailure,
        &url,
    );
    if failed.len() != 1 || !failed.iter().all(|line| line.contains("URL: http://maas.example.com")) {
        return Err(AppError::validation(format!("Unexpected failure lines: {:?}", failed)));
    }
    Ok(())
}
