use std::sync::atomic::{AtomicU64, Ordering};

use portable_atomic::AtomicF64;

/// Monotonic running total.
///
/// Negative deltas are rejected: the total only moves up, except through an
/// explicit [`Counter::reset`]. Writers never take a lock.
#[derive(Debug)]
pub struct Counter {
    total: AtomicF64,
    adds: AtomicU64,
}

/// Point-in-time counter values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CounterSnapshot {
    pub total: f64,
    pub adds: u64,
}

impl Counter {
    pub fn new() -> Self {
        Self {
            total: AtomicF64::new(0.0),
            adds: AtomicU64::new(0),
        }
    }

    /// Add a non-negative, finite delta. On rejection the reason is returned
    /// and the counter is untouched.
    pub fn add(&self, value: f64) -> Result<(), &'static str> {
        if !value.is_finite() {
            return Err("counter values must be finite");
        }
        if value < 0.0 {
            return Err("counter values must not be negative");
        }
        self.total.fetch_add(value, Ordering::Relaxed);
        self.adds.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Current total.
    pub fn snapshot(&self) -> f64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Number of accepted `add` calls.
    pub fn adds(&self) -> u64 {
        self.adds.load(Ordering::Relaxed)
    }

    pub(crate) fn snapshot_full(&self) -> CounterSnapshot {
        CounterSnapshot {
            total: self.snapshot(),
            adds: self.adds(),
        }
    }

    /// Zero the total. A concurrent add racing with reset may survive it.
    pub fn reset(&self) {
        self.total.store(0.0, Ordering::Relaxed);
        self.adds.store(0, Ordering::Relaxed);
    }
}

impl Default for Counter {
    fn default() -> Self {
        Self::new()
    }
}
