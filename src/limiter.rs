//! Optional cap on concurrent outbound requests.
//!
//! With a limit of one, every send (asynchronous and synchronous alike) is
//! serialised, which reproduces a global send lock. Larger limits trade that
//! safety for throughput.

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

#[derive(Debug)]
struct Permits {
    available: Mutex<usize>,
    released: Condvar,
    max: usize,
}

/// Counting semaphore guarding the transport.
#[derive(Clone, Debug)]
pub(crate) struct InFlightLimiter {
    permits: Arc<Permits>,
}

impl InFlightLimiter {
    pub(crate) fn new(max: usize) -> Self {
        Self {
            permits: Arc::new(Permits {
                available: Mutex::new(max),
                released: Condvar::new(),
                max,
            }),
        }
    }

    /// Block until a permit is free.
    pub(crate) fn acquire(&self) -> Permit<'_> {
        let mut available = self.permits.available.lock();
        while *available == 0 {
            self.permits.released.wait(&mut available);
        }
        *available -= 1;
        Permit {
            permits: &self.permits,
        }
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.permits.max - *self.permits.available.lock()
    }
}

#[derive(Debug)]
pub(crate) struct Permit<'a> {
    permits: &'a Permits,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        *self.permits.available.lock() += 1;
        self.permits.released.notify_one();
    }
}
