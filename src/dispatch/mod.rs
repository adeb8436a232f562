//! One load-test iteration: draw a credential, call the gateway, classify
//! and record the result.
mod dispatcher;
mod request;
mod transport;

#[cfg(test)]
mod tests;

pub use dispatcher::RequestDispatcher;
pub use request::{DEFAULT_MODEL_FIELD, MODEL_SLUG_SUFFIX, RequestTemplate, RouteConfig, model_slug};
pub use transport::{ReqwestTransport, Transport, TransportReply, TransportRequest};
