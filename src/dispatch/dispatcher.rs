use std::sync::Arc;

use tokio::time::Instant;
use tracing::debug;
use url::Url;

use crate::classify::{Exchange, Outcome, TRANSPORT_FAILURE_STATUS, body_snippet, classify};
use crate::credentials::{CredentialPool, Tier};
use crate::error::PoolError;
use crate::metrics::MetricsAggregator;

use super::request::RequestTemplate;
use super::transport::Transport;

/// Shared by every virtual user of a run.
#[derive(Clone)]
pub struct RequestDispatcher {
    pool: Arc<CredentialPool>,
    template: Arc<RequestTemplate>,
    transport: Arc<dyn Transport>,
    metrics: Arc<MetricsAggregator>,
    debug: bool,
}

impl RequestDispatcher {
    #[must_use]
    pub fn new(
        pool: Arc<CredentialPool>,
        template: RequestTemplate,
        transport: Arc<dyn Transport>,
        metrics: Arc<MetricsAggregator>,
        debug: bool,
    ) -> Self {
        Self {
            pool,
            template: Arc::new(template),
            transport,
            metrics,
            debug,
        }
    }

    #[must_use]
    pub const fn metrics(&self) -> &Arc<MetricsAggregator> {
        &self.metrics
    }

    #[must_use]
    pub fn template(&self) -> &RequestTemplate {
        &self.template
    }

    /// Run one iteration for `tier` and record it.
    ///
    /// Transport failures are recorded as exchanges with
    /// [`TRANSPORT_FAILURE_STATUS`]; they never surface as errors.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::EmptyTier`] when `tier` has no credentials.
    pub async fn dispatch_once(&self, tier: Tier) -> Result<Exchange, PoolError> {
        let credential = self.pool.draw(tier)?;
        let user_id = credential.user_id.clone();
        let request = self.template.build(credential);

        let started = Instant::now();
        let result = self.transport.send(request).await;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let exchange = match result {
            Ok(reply) => Exchange {
                tier,
                user_id,
                status_code: reply.status,
                latency_ms,
                body_snippet: body_snippet(&reply.body),
                transport_error: None,
            },
            Err(kind) => Exchange {
                tier,
                user_id,
                status_code: TRANSPORT_FAILURE_STATUS,
                latency_ms,
                body_snippet: String::new(),
                transport_error: Some(kind),
            },
        };

        let outcome = classify(&exchange);
        self.metrics.record(tier, outcome, exchange.latency_ms);
        if exchange.is_timeout() {
            self.metrics.record_timeout(tier);
        }

        if self.debug {
            for line in exchange_debug_lines(&exchange, outcome, self.template.url(tier)) {
                debug!("{}", line);
            }
        }

        Ok(exchange)
    }
}

/// Status and URL for every exchange; the body only for non-200 replies.
pub(super) fn exchange_debug_lines(
    exchange: &Exchange,
    outcome: Outcome,
    url: &Url,
) -> Vec<String> {
    let label = exchange.tier.label();
    if let Some(kind) = exchange.transport_error {
        return vec![format!(
            "{} tier - User: {}, {} error after {}ms, URL: {}",
            label,
            exchange.user_id,
            kind.as_str(),
            exchange.latency_ms,
            url
        )];
    }
    let mut lines = vec![format!(
        "{} tier - User: {}, Status: {}, URL: {}",
        label, exchange.user_id, exchange.status_code, url
    )];
    if exchange.status_code != 200 {
        lines.push(format!(
            "{} tier - Outcome: {}, Body: {}",
            label, outcome, exchange.body_snippet
        ));
    }
    lines
}
