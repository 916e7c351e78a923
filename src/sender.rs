//! Single-attempt delivery primitive.
//!
//! [`Sender::send`] encodes one payload, POSTs it and classifies the result.
//! It never retries; the asynchronous path layers retries on top of it and
//! the synchronous path returns its outcome directly.

use std::sync::Arc;

use serde::Serialize;

use crate::{
    diagnostics::Diagnostics,
    endpoint::CONTENT_TYPE,
    error::SendError,
    limiter::InFlightLimiter,
    transport::{HttpResponse, Transport},
};

pub(crate) struct Sender {
    endpoint: String,
    transport: Arc<dyn Transport>,
    limiter: Option<InFlightLimiter>,
    diagnostics: Diagnostics,
}

impl Sender {
    pub(crate) fn new(
        endpoint: String,
        transport: Arc<dyn Transport>,
        limiter: Option<InFlightLimiter>,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            endpoint,
            transport,
            limiter,
            diagnostics,
        }
    }

    pub(crate) fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Encode `payload` and deliver it once, emitting one diagnostic line on
    /// failure.
    pub(crate) fn send<T: Serialize + ?Sized>(&self, payload: &T) -> Result<(), SendError> {
        let body = serde_json::to_vec(payload).map_err(|err| {
            let err = SendError::Encoding(err);
            self.diagnostics.error(&err.to_string());
            err
        })?;
        self.send_encoded(&body)
    }

    /// Deliver an already encoded body once, emitting one diagnostic line on
    /// failure.
    pub(crate) fn send_encoded(&self, body: &[u8]) -> Result<(), SendError> {
        let outcome = self.post(body);
        if let Err(err) = &outcome {
            self.diagnostics.warn(&err.to_string());
        }
        outcome
    }

    fn post(&self, body: &[u8]) -> Result<(), SendError> {
        let _permit = self.limiter.as_ref().map(InFlightLimiter::acquire);
        let response = self.transport.post(&self.endpoint, CONTENT_TYPE, body)?;
        classify(response)
    }
}

/// Any 2xx is success; everything else is a status failure.
pub(crate) fn classify(response: HttpResponse) -> Result<(), SendError> {
    match response.status {
        200..=299 => Ok(()),
        code => Err(SendError::Status {
            code,
            body: response.body,
        }),
    }
}

impl std::fmt::Debug for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sender")
            .field("endpoint", &self.endpoint)
            .field(
                "in_flight",
                &self.limiter.as_ref().map(InFlightLimiter::in_flight),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{CollectingSink, StubTransport};
    use log::Level;
    use rstest::{fixture, rstest};
    use serde_json::json;
    use std::collections::HashMap;
    use std::thread;
    use std::time::Duration;

    const URL: &str = "https://logs.test/bulk/TOKEN/tag/bulk/";

    #[fixture]
    fn sink() -> Arc<CollectingSink> {
        Arc::new(CollectingSink::new())
    }

    fn sender_with(transport: Arc<StubTransport>, sink: &Arc<CollectingSink>) -> Sender {
        Sender::new(
            URL.into(),
            transport,
            None,
            Diagnostics::new(sink.clone()),
        )
    }

    #[rstest]
    #[case(200)]
    #[case(201)]
    #[case(204)]
    fn success_statuses_deliver(sink: Arc<CollectingSink>, #[case] status: u16) {
        let transport = Arc::new(StubTransport::always(status));
        let sender = sender_with(transport.clone(), &sink);

        sender.send(&json!({"msg": "hi"})).expect("delivered");

        let posts = transport.posts();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].url, URL);
        assert_eq!(posts[0].content_type, "text/plain");
        assert_eq!(posts[0].json(), json!({"msg": "hi"}));
        assert!(sink.messages().is_empty());
    }

    #[rstest]
    fn error_status_is_reported_once(sink: Arc<CollectingSink>) {
        let transport = Arc::new(StubTransport::always(500).with_body("boom"));
        let sender = sender_with(transport.clone(), &sink);

        let err = sender.send(&json!({"msg": "hi"})).unwrap_err();

        assert_eq!(err.status(), Some(500));
        assert!(err.is_retryable());
        assert_eq!(transport.post_count(), 1);
        let lines = sink.matching("500");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, Level::Warn);
        assert!(lines[0].1.contains("boom"));
    }

    #[rstest]
    fn transport_failures_are_retryable(sink: Arc<CollectingSink>) {
        let transport = Arc::new(StubTransport::unreachable());
        let sender = sender_with(transport, &sink);

        let err = sender.send(&json!(1)).unwrap_err();

        assert!(matches!(err, SendError::Transport(_)));
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "loggly transport error: connection refused");
        assert_eq!(sink.matching("transport error").len(), 1);
    }

    #[rstest]
    fn unencodable_payload_never_reaches_transport(sink: Arc<CollectingSink>) {
        let transport = Arc::new(StubTransport::always(200));
        let sender = sender_with(transport.clone(), &sink);
        let mut payload = HashMap::new();
        payload.insert((1, 2), "tuple keys are not valid JSON object keys");

        let err = sender.send(&payload).unwrap_err();

        assert!(matches!(err, SendError::Encoding(_)));
        assert!(!err.is_retryable());
        assert_eq!(transport.post_count(), 0);
        let lines = sink.matching("encoding error");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, Level::Error);
    }

    #[rstest]
    fn limiter_serialises_concurrent_sends(sink: Arc<CollectingSink>) {
        let transport =
            Arc::new(StubTransport::always(200).with_delay(Duration::from_millis(10)));
        let sender = Arc::new(Sender::new(
            URL.into(),
            transport.clone(),
            Some(InFlightLimiter::new(1)),
            Diagnostics::new(sink.clone()),
        ));

        let handles: Vec<_> = (0..6)
            .map(|i| {
                let sender = Arc::clone(&sender);
                thread::spawn(move || sender.send(&json!({ "i": i })))
            })
            .collect();
        for handle in handles {
            handle.join().expect("join").expect("delivered");
        }

        assert_eq!(transport.post_count(), 6);
        assert_eq!(transport.peak_concurrency(), 1);
    }
}
