//! One-shot signal that threads can poll or wait on with a timeout.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

use crate::lock;

#[derive(Debug, Default)]
pub struct Signal {
    raised: AtomicBool,
    lock: Mutex<()>,
    cvar: Condvar,
}

impl Signal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal and wake every waiter. Idempotent.
    pub fn set(&self) {
        self.raised.store(true, Ordering::Release);
        let _guard = lock(&self.lock);
        self.cvar.notify_all();
    }

    pub fn is_set(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }

    /// Block for at most `timeout`; returns whether the signal is raised.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        if self.is_set() || timeout.is_zero() {
            return self.is_set();
        }

        let guard = lock(&self.lock);
        let _guard = self
            .cvar
            .wait_timeout_while(guard, timeout, |_| !self.is_set())
            .map(|(guard, _)| guard)
            .unwrap_or_else(|poisoned| poisoned.into_inner().0);
        self.is_set()
    }
}
