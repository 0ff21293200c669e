//! Latches that keep a single fetch in flight per resource (or per parent id).
//!
//! Acquiring hands back a permit; dropping the permit releases the latch, so a
//! fetch that errors out (or panics) can never leave it held.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

#[derive(Debug, Default)]
pub struct InFlightGuard {
    active: AtomicBool,
}

impl InFlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` when a fetch is already in flight.
    pub fn try_acquire(&self) -> Option<FlightPermit<'_>> {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightPermit { guard: self })
    }

    /// Safe to call when not held.
    pub fn release(&self) {
        self.active.store(false, Ordering::Release);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

#[must_use = "the guard is released as soon as the permit is dropped"]
#[derive(Debug)]
pub struct FlightPermit<'a> {
    guard: &'a InFlightGuard,
}

impl Drop for FlightPermit<'_> {
    fn drop(&mut self) {
        self.guard.release();
    }
}

/// Per-key variant for resources addressed by a parent id.
#[derive(Debug, Default)]
pub struct KeyedInFlightGuard {
    active: Mutex<HashSet<String>>,
}

impl KeyedInFlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self, key: &str) -> Option<KeyedFlightPermit<'_>> {
        let mut active = self.active.lock();
        if active.insert(key.to_string()) {
            Some(KeyedFlightPermit {
                guard: self,
                key: key.to_string(),
            })
        } else {
            None
        }
    }

    pub fn release(&self, key: &str) {
        self.active.lock().remove(key);
    }

    pub fn is_active(&self, key: &str) -> bool {
        self.active.lock().contains(key)
    }
}

#[must_use = "the guard is released as soon as the permit is dropped"]
#[derive(Debug)]
pub struct KeyedFlightPermit<'a> {
    guard: &'a KeyedInFlightGuard,
    key: String,
}

impl KeyedFlightPermit<'_> {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for KeyedFlightPermit<'_> {
    fn drop(&mut self) {
        self.guard.release(&self.key);
    }
}
