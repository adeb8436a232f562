//! Maps a finished request onto the outcome taxonomy used by the metrics.
mod exchange;


pub use exchange::{
    BODY_SNIPPET_LIMIT, Exchange, TRANSPORT_FAILURE_STATUS, TransportErrorKind, body_snippet,
};

use std::fmt;

/// Classification bucket for one request attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Success,
    AuthFailure,
    RateLimited,
    TokenQuotaExceeded,
    GenericFailure,
}

impl Outcome {
    pub const ALL: [Outcome; 5] = [
        Outcome::Success,
        Outcome::AuthFailure,
        Outcome::RateLimited,
        Outcome::TokenQuotaExceeded,
        Outcome::GenericFailure,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::AuthFailure => "auth_failure",
            Outcome::RateLimited => "rate_limited",
            Outcome::TokenQuotaExceeded => "token_quota_exceeded",
            Outcome::GenericFailure => "generic_failure",
        }
    }

    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Outcome::Success)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const STATUS_UNAUTHORIZED: u16 = 401;
const STATUS_FORBIDDEN: u16 = 403;
const STATUS_TOO_MANY_REQUESTS: u16 = 429;
const TOKEN_QUOTA_MARKER: &str = "token";

#[must_use]
pub fn classify(exchange: &Exchange) -> Outcome {
    classify_status(exchange.status_code, &exchange.body_snippet)
}

/// Total over every `u16`. The body is only consulted for 429 responses.
#[must_use]
pub fn classify_status(status: u16, body: &str) -> Outcome {
    match status {
        200..=399 => Outcome::Success,
        STATUS_UNAUTHORIZED | STATUS_FORBIDDEN => Outcome::AuthFailure,
        STATUS_TOO_MANY_REQUESTS => {
            if is_token_quota_rejection(body) {
                Outcome::TokenQuotaExceeded
            } else {
                Outcome::RateLimited
            }
        }
        _ => Outcome::GenericFailure,
    }
}

/// Best-effort: request-rate and token-budget rejections share status 429
/// and differ only in the error text. The match is case-sensitive, and a
/// reworded upstream message turns every 429 into `RateLimited`.
#[must_use]
pub fn is_token_quota_rejection(body: &str) -> bool {
    body.contains(TOKEN_QUOTA_MARKER)
}
