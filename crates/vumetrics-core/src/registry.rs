//! Metric registry: name -> metric, plus registration order.
//!
//! Lookups go through a `DashMap` index and never contend with each other.
//! Registration holds the index entry for its name while it appends to the
//! ordered list, so a name is created exactly once and shows up in
//! `metrics()` in the order it was first registered. The registry is an
//! ordinary value: the harness creates one at startup and passes it around in
//! an `Arc`; tests build their own.

use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::{MetricsError, Result};
use crate::metric::{validate_name, Metric, MetricKind, Percentile, Trend, ValueType};

/// Shared reference to a registered metric.
#[derive(Debug, Clone)]
pub struct MetricHandle(Arc<Metric>);

impl MetricHandle {
    /// True when both handles point at the same registered metric.
    pub fn same_metric(&self, other: &MetricHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for MetricHandle {
    type Target = Metric;

    fn deref(&self) -> &Metric {
        &self.0
    }
}

/// Raw-value retention for trends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReservoirPolicy {
    /// Keep every value; memory grows with the number of samples.
    #[default]
    Unbounded,
    /// Keep at most `capacity` values per trend. With a seed, trend `n`
    /// (in registration order) uses `seed + n`, so runs are reproducible.
    Bounded { capacity: usize, seed: Option<u64> },
}

#[derive(Debug, Clone)]
pub struct RegistryOptions {
    /// Percentiles reported for every trend, besides the median.
    pub percentiles: Vec<Percentile>,
    pub reservoir: ReservoirPolicy,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            percentiles: vec![Percentile::P90, Percentile::P95],
            reservoir: ReservoirPolicy::Unbounded,
        }
    }
}

pub struct MetricRegistry {
    index: DashMap<String, MetricHandle>,
    order: RwLock<Vec<MetricHandle>>,
    trends: AtomicU64,
    options: RegistryOptions,
    started: Instant,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self::with_options(RegistryOptions::default())
    }

    pub fn with_options(options: RegistryOptions) -> Self {
        Self {
            index: DashMap::new(),
            order: RwLock::new(Vec::new()),
            trends: AtomicU64::new(0),
            options,
            started: Instant::now(),
        }
    }

    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    /// Time since the registry was created.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Register `name` as `kind` with the default value type.
    pub fn register(&self, name: &str, kind: MetricKind) -> Result<MetricHandle> {
        self.register_with(name, kind, ValueType::Default)
    }

    /// Register a metric, or return the existing handle when `name` is
    /// already registered with the same kind and value type. Existing data is
    /// kept. Any other combination is a `DuplicateMetric` error.
    pub fn register_with(
        &self,
        name: &str,
        kind: MetricKind,
        value_type: ValueType,
    ) -> Result<MetricHandle> {
        if let Some(existing) = self.index.get(name) {
            return check_same(existing.value(), kind, value_type);
        }
        validate_name(name)?;

        match self.index.entry(name.to_string()) {
            Entry::Occupied(e) => check_same(e.get(), kind, value_type),
            Entry::Vacant(e) => {
                let metric = match kind {
                    MetricKind::Counter => Metric::counter(name.to_string(), value_type),
                    MetricKind::Trend => {
                        Metric::trend(name.to_string(), value_type, self.new_trend())
                    }
                };
                let handle = MetricHandle(Arc::new(metric));
                self.order
                    .write()
                    .unwrap_or_else(|e| e.into_inner())
                    .push(handle.clone());
                e.insert(handle.clone());
                tracing::debug!(metric = %name, kind = %kind, value_type = value_type.as_str(), "metric registered");
                Ok(handle)
            }
        }
    }

    pub fn counter(&self, name: &str) -> Result<MetricHandle> {
        self.register(name, MetricKind::Counter)
    }

    pub fn trend(&self, name: &str) -> Result<MetricHandle> {
        self.register(name, MetricKind::Trend)
    }

    /// Trend whose values are durations in milliseconds.
    pub fn time_trend(&self, name: &str) -> Result<MetricHandle> {
        self.register_with(name, MetricKind::Trend, ValueType::Time)
    }

    pub fn lookup(&self, name: &str) -> Result<MetricHandle> {
        self.index
            .get(name)
            .map(|r| r.value().clone())
            .ok_or_else(|| MetricsError::NotFound(name.to_string()))
    }

    /// All metrics in registration order.
    pub fn metrics(&self) -> Vec<MetricHandle> {
        self.order.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    fn new_trend(&self) -> Trend {
        let n = self.trends.fetch_add(1, Ordering::Relaxed);
        match self.options.reservoir {
            ReservoirPolicy::Unbounded => Trend::unbounded(),
            ReservoirPolicy::Bounded { capacity, seed } => {
                Trend::with_reservoir(capacity, seed.map(|s| s.wrapping_add(n)))
            }
        }
    }
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn check_same(existing: &MetricHandle, kind: MetricKind, value_type: ValueType) -> Result<MetricHandle> {
    if existing.kind() == kind && existing.value_type() == value_type {
        return Ok(existing.clone());
    }
    Err(MetricsError::DuplicateMetric {
        name: existing.name().to_string(),
        existing: describe(existing.kind(), existing.value_type()),
        requested: describe(kind, value_type),
    })
}

fn describe(kind: MetricKind, value_type: ValueType) -> String {
    match value_type {
        ValueType::Default => kind.as_str().to_string(),
        ValueType::Time => format!("{kind}(time)"),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::sample::Tags;

    #[test]
    fn idempotent_register_keeps_data() {
        let reg = MetricRegistry::new();
        let a = reg.counter("reqs").unwrap();
        a.add(3.0, &Tags::new()).unwrap();
        let b = reg.counter("reqs").unwrap();
        assert!(a.same_metric(&b));
        assert_eq!(b.as_counter().unwrap().snapshot(), 3.0);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn kind_conflict_is_duplicate() {
        let reg = MetricRegistry::new();
        reg.trend("latency").unwrap();
        let err = reg.counter("latency").unwrap_err();
        assert_eq!(err.code().as_str(), "DUPLICATE_METRIC");
        assert!(err.to_string().contains("already registered as trend"));
    }

    #[test]
    fn value_type_conflict_is_duplicate() {
        let reg = MetricRegistry::new();
        reg.time_trend("waiting").unwrap();
        let err = reg.trend("waiting").unwrap_err();
        assert!(matches!(err, MetricsError::DuplicateMetric { .. }));
        assert!(err.to_string().contains("trend(time)"));
    }

    #[test]
    fn lookup_missing() {
        let reg = MetricRegistry::new();
        let err = reg.lookup("ghost").unwrap_err();
        assert_eq!(err.code().as_str(), "NOT_FOUND");
    }

    #[test]
    fn invalid_name_rejected() {
        let reg = MetricRegistry::new();
        assert!(reg.counter("").is_err());
        assert!(reg.is_empty());
    }

    #[test]
    fn registration_order_is_kept() {
        let reg = MetricRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            reg.counter(name).unwrap();
        }
        reg.counter("alpha").unwrap();
        let names: Vec<String> = reg.metrics().iter().map(|m| m.name().to_string()).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn bounded_reservoir_applies_to_trends() {
        let reg = MetricRegistry::with_options(RegistryOptions {
            percentiles: vec![],
            reservoir: ReservoirPolicy::Bounded {
                capacity: 10,
                seed: Some(1),
            },
        });
        let t = reg.trend("t").unwrap();
        for i in 0..100u32 {
            t.add(f64::from(i), &Tags::new()).unwrap();
        }
        let snap = t.as_trend().unwrap().snapshot(&[]);
        assert_eq!(snap.count, 100);
        assert_eq!(snap.retained, 10);
    }
}
