//! Test-only helpers shared across crate unit tests.
//!
//! Provides an in-memory transport with scripted responses and a sink that
//! records diagnostics, so the engine can be exercised without sockets.

mod collecting_sink;
mod stub_transport;

pub use collecting_sink::CollectingSink;
pub use stub_transport::{CapturedPost, StubTransport};
