//! Scripted in-memory transport.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde_json::Value;

use crate::{
    error::TransportError,
    transport::{HttpResponse, Transport},
};

/// One request observed by [`StubTransport`].
#[derive(Clone, Debug)]
pub struct CapturedPost {
    pub url: String,
    pub content_type: String,
    pub body: Vec<u8>,
    pub at: Instant,
}

impl CapturedPost {
    /// Decode the body as JSON.
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("body is JSON")
    }
}

/// Transport returning scripted statuses and recording every request.
#[derive(Debug)]
pub struct StubTransport {
    script: Mutex<VecDeque<u16>>,
    fallback: Option<u16>,
    body: Option<String>,
    delay: Option<Duration>,
    posts: Mutex<Vec<CapturedPost>>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl StubTransport {
    /// Answer every request with `status`.
    pub fn always(status: u16) -> Self {
        Self::scripted(Vec::new(), status)
    }

    /// Answer with `statuses` in order, then with `fallback`.
    pub fn scripted(statuses: Vec<u16>, fallback: u16) -> Self {
        Self::build(statuses, Some(fallback))
    }

    /// Fail every request at the transport level.
    pub fn unreachable() -> Self {
        Self::build(Vec::new(), None)
    }

    fn build(statuses: Vec<u16>, fallback: Option<u16>) -> Self {
        Self {
            script: Mutex::new(statuses.into()),
            fallback,
            body: None,
            delay: None,
            posts: Mutex::new(Vec::new()),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Attach a response body to every answer.
    pub fn with_body(mut self, body: &str) -> Self {
        self.body = Some(body.to_owned());
        self
    }

    /// Sleep for `delay` inside every request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn posts(&self) -> Vec<CapturedPost> {
        self.posts.lock().clone()
    }

    pub fn post_count(&self) -> usize {
        self.posts.lock().len()
    }

    /// Highest number of requests observed in progress at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Poll until `count` requests were observed or `timeout` elapses.
    pub fn wait_for_posts(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.post_count() >= count {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        self.post_count() >= count
    }
}

impl Transport for StubTransport {
    fn post(
        &self,
        url: &str,
        content_type: &str,
        body: &[u8],
    ) -> Result<HttpResponse, TransportError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        self.posts.lock().push(CapturedPost {
            url: url.to_owned(),
            content_type: content_type.to_owned(),
            body: body.to_vec(),
            at: Instant::now(),
        });
        let status = self.script.lock().pop_front().or(self.fallback);
        self.active.fetch_sub(1, Ordering::SeqCst);
        match status {
            Some(status) => Ok(HttpResponse {
                status,
                body: self.body.clone(),
            }),
            None => Err(TransportError("connection refused".into())),
        }
    }
}
