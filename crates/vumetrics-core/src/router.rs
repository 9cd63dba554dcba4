//! Sample router: execution units -> registered metrics.
//!
//! `route` never fails. A sample that cannot be recorded is dropped and
//! counted in the drop ledger under `(error code, metric name)`, so the final
//! report shows what was lost. The first drop of each pair is logged at
//! `warn`; repeats only at `trace`.
//!
//! The ledger keeps at most `ledger_cap` distinct metric names per reason.
//! Drops for further names are folded into one [`OVERFLOW_ROW`] per reason,
//! so a stream of unique bad names cannot grow it without bound. Totals stay
//! exact.
//!
//! Per-metric mutual exclusion is the metric's own: counters use a single
//! atomic read-modify-write, trends a short mutex-guarded append.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::{ErrorCode, MetricsError};
use crate::registry::MetricRegistry;
use crate::sample::Sample;

/// Default number of distinct metric names kept per drop reason.
pub const DEFAULT_LEDGER_NAMES: usize = 1024;

/// Ledger row that collects drops once a reason has hit its name cap. `*` is
/// not a valid metric-name character, so no real metric can collide.
pub const OVERFLOW_ROW: &str = "*other*";

/// Result of routing one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    Recorded,
    Dropped(ErrorCode),
}

/// One drop-ledger row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropCount {
    pub reason: ErrorCode,
    pub metric: String,
    pub count: u64,
}

pub struct SampleRouter {
    registry: Arc<MetricRegistry>,
    accepted: AtomicU64,
    dropped: DashMap<(ErrorCode, String), AtomicU64>,
    names_per_reason: DashMap<ErrorCode, AtomicUsize>,
    ledger_cap: usize,
    closed: AtomicBool,
}

impl SampleRouter {
    pub fn new(registry: Arc<MetricRegistry>) -> Self {
        Self::with_ledger_cap(registry, DEFAULT_LEDGER_NAMES)
    }

    /// Router whose drop ledger keeps at most `cap` names per reason.
    pub fn with_ledger_cap(registry: Arc<MetricRegistry>, cap: usize) -> Self {
        Self {
            registry,
            accepted: AtomicU64::new(0),
            dropped: DashMap::new(),
            names_per_reason: DashMap::new(),
            ledger_cap: cap,
            closed: AtomicBool::new(false),
        }
    }

    pub fn registry(&self) -> &Arc<MetricRegistry> {
        &self.registry
    }

    /// Look up the sample's metric and record the value.
    pub fn route(&self, sample: &Sample) -> RouteOutcome {
        match self.try_route(sample) {
            Ok(()) => {
                self.accepted.fetch_add(1, Ordering::Relaxed);
                RouteOutcome::Recorded
            }
            Err(err) => {
                let code = err.code();
                self.record_drop(code, &sample.metric, &err);
                RouteOutcome::Dropped(code)
            }
        }
    }

    fn try_route(&self, sample: &Sample) -> crate::Result<()> {
        if self.is_closed() {
            return Err(MetricsError::Closed);
        }
        let metric = self.registry.lookup(&sample.metric)?;
        metric.add(sample.value, &sample.tags)
    }

    fn record_drop(&self, code: ErrorCode, metric: &str, err: &MetricsError) {
        let key = (code, metric.to_string());
        if let Some(c) = self.dropped.get(&key) {
            c.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(reason = code.as_str(), metric = %metric, "sample dropped");
            return;
        }
        match self.dropped.entry(key) {
            Entry::Occupied(c) => {
                c.get().fetch_add(1, Ordering::Relaxed);
            }
            Entry::Vacant(slot) => {
                if self.reserve_name(code) {
                    slot.insert(AtomicU64::new(1));
                    tracing::warn!(reason = code.as_str(), metric = %metric, error = %err, "sample dropped");
                } else {
                    // release the shard before touching the overflow row
                    drop(slot);
                    self.record_overflow(code, metric);
                }
            }
        }
    }

    fn reserve_name(&self, code: ErrorCode) -> bool {
        let names = self
            .names_per_reason
            .entry(code)
            .or_insert_with(|| AtomicUsize::new(0));
        names
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.ledger_cap).then_some(n + 1)
            })
            .is_ok()
    }

    fn record_overflow(&self, code: ErrorCode, metric: &str) {
        let first = {
            let c = self
                .dropped
                .entry((code, OVERFLOW_ROW.to_string()))
                .or_insert_with(|| AtomicU64::new(0));
            c.fetch_add(1, Ordering::Relaxed) == 0
        };
        if first {
            tracing::warn!(
                reason = code.as_str(),
                metric = %metric,
                cap = self.ledger_cap,
                "drop ledger full for reason; folding further names"
            );
        } else {
            tracing::trace!(reason = code.as_str(), metric = %metric, "sample dropped");
        }
    }

    /// Stop accepting samples. Later routes are dropped as `CLOSED`.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    pub fn dropped_total(&self) -> u64 {
        self.dropped
            .iter()
            .map(|r| r.value().load(Ordering::Relaxed))
            .sum()
    }

    /// Drop ledger sorted by reason, then metric name.
    pub fn drop_counts(&self) -> Vec<DropCount> {
        let mut rows: Vec<DropCount> = self
            .dropped
            .iter()
            .map(|r| DropCount {
                reason: r.key().0,
                metric: r.key().1.clone(),
                count: r.value().load(Ordering::Relaxed),
            })
            .collect();
        rows.sort_by(|a, b| a.reason.cmp(&b.reason).then_with(|| a.metric.cmp(&b.metric)));
        rows
    }
}
