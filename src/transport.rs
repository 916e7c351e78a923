//! HTTP transport shared by every send.
//!
//! The sender only needs "POST these bytes and tell me the status", so the
//! transport is a trait. [`UreqTransport`] is the default and keeps a pooled
//! `ureq::Agent`; tests substitute an in-memory implementation.

use std::sync::Arc;
use std::time::Duration;

use ureq::{Agent, AgentBuilder};

use crate::error::TransportError;

/// Status and (when readable) body of an HTTP response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Option<String>,
}

/// Capability to issue one HTTP POST.
///
/// Implementations are shared across every concurrent send and must be safe
/// to call from multiple threads at once.
pub trait Transport: Send + Sync {
    /// POST `body` to `url`.
    ///
    /// Non-2xx statuses are returned as `Ok`; `Err` is reserved for failures
    /// that produced no response at all.
    fn post(&self, url: &str, content_type: &str, body: &[u8])
    -> Result<HttpResponse, TransportError>;
}

/// Default transport backed by a connection-pooling `ureq::Agent`.
#[derive(Clone, Debug)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    /// Build an agent with the given connect and whole-request timeouts.
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Result<Self, TransportError> {
        let connector =
            native_tls::TlsConnector::new().map_err(|err| TransportError(err.to_string()))?;
        let agent = AgentBuilder::new()
            .timeout_connect(connect_timeout)
            .timeout(request_timeout)
            .tls_connector(Arc::new(connector))
            .build();
        Ok(Self { agent })
    }
}

impl Transport for UreqTransport {
    fn post(
        &self,
        url: &str,
        content_type: &str,
        body: &[u8],
    ) -> Result<HttpResponse, TransportError> {
        match self
            .agent
            .post(url)
            .set("Content-Type", content_type)
            .send_bytes(body)
        {
            Ok(response) => Ok(read_response(response)),
            Err(ureq::Error::Status(_, response)) => Ok(read_response(response)),
            Err(ureq::Error::Transport(err)) => Err(TransportError(err.to_string())),
        }
    }
}

fn read_response(response: ureq::Response) -> HttpResponse {
    let status = response.status();
    let body = response
        .into_string()
        .ok()
        .filter(|body| !body.trim().is_empty());
    HttpResponse { status, body }
}
