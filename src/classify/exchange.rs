use crate::credentials::Tier;

/// Status recorded when no HTTP response was received at all.
pub const TRANSPORT_FAILURE_STATUS: u16 = 999;
/// Bytes of response body kept for diagnostics.
pub const BODY_SNIPPET_LIMIT: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Timeout,
    Connect,
    Other,
}

impl TransportErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Connect => "connect",
            TransportErrorKind::Other => "transport",
        }
    }
}

/// One completed dispatch attempt. Consumed right after classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub tier: Tier,
    pub user_id: String,
    pub status_code: u16,
    pub latency_ms: u64,
    pub body_snippet: String,
    pub transport_error: Option<TransportErrorKind>,
}

impl Exchange {
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.transport_error == Some(TransportErrorKind::Timeout)
    }
}

/// First [`BODY_SNIPPET_LIMIT`] bytes of `body`, cut back to a char boundary.
#[must_use]
pub fn body_snippet(body: &str) -> String {
    if body.len() <= BODY_SNIPPET_LIMIT {
        return body.to_owned();
    }
    let mut end = BODY_SNIPPET_LIMIT;
    while end > 0 && !body.is_char_boundary(end) {
        end = end.saturating_sub(1);
    }
    body.get(..end).unwrap_or_default().to_owned()
}
