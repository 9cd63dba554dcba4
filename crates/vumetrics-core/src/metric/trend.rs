//! Streaming statistics over numeric samples.
//!
//! `count`, `sum`, `min` and `max` are maintained exactly on every add. The
//! raw values needed for percentiles are retained either in full (memory grows
//! O(samples)) or in a fixed-size reservoir (Algorithm R). With a reservoir the
//! percentiles become an estimate over a uniform random subset of the stream;
//! the exact aggregates are unaffected.
//!
//! Writers hold the trend mutex only for the append. Snapshots copy the
//! retained values under the lock and sort the copy after releasing it.

use std::sync::{Mutex, MutexGuard};

use super::percentile::{interpolate, Percentile};

/// How a trend retains raw values for percentile computation.
#[derive(Debug)]
enum SampleStore {
    Unbounded(Vec<f64>),
    Reservoir {
        capacity: usize,
        values: Vec<f64>,
        rng: fastrand::Rng,
    },
}

impl SampleStore {
    /// `seen` counts the new value as well.
    fn push(&mut self, value: f64, seen: u64) {
        match self {
            SampleStore::Unbounded(values) => values.push(value),
            SampleStore::Reservoir {
                capacity,
                values,
                rng,
            } => {
                if values.len() < *capacity {
                    values.push(value);
                } else {
                    let slot = rng.u64(0..seen);
                    if slot < *capacity as u64 {
                        values[slot as usize] = value;
                    }
                }
            }
        }
    }

    fn values(&self) -> &[f64] {
        match self {
            SampleStore::Unbounded(values) => values,
            SampleStore::Reservoir { values, .. } => values,
        }
    }
}

#[derive(Debug)]
struct TrendState {
    count: u64,
    sum: f64,
    /// Running mean, used once `sum` has overflowed.
    mean: f64,
    min: f64,
    max: f64,
    store: SampleStore,
}

impl TrendState {
    fn avg(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        if self.sum.is_finite() {
            Some(self.sum / self.count as f64)
        } else {
            Some(self.mean)
        }
    }
}

/// Streaming min/max/mean/percentile accumulator.
#[derive(Debug)]
pub struct Trend {
    state: Mutex<TrendState>,
}

/// Point-in-time trend statistics. Everything except `count`, `sum` and
/// `retained` is `None` while the trend is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendSnapshot {
    pub count: u64,
    pub sum: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
    pub med: Option<f64>,
    pub percentiles: Vec<(Percentile, Option<f64>)>,
    /// Number of raw values the percentiles were computed from.
    pub retained: usize,
}

impl TrendSnapshot {
    pub fn percentile(&self, p: Percentile) -> Option<f64> {
        self.percentiles
            .iter()
            .find(|(q, _)| *q == p)
            .and_then(|(_, v)| *v)
    }
}

impl Trend {
    /// Trend that keeps every value.
    pub fn unbounded() -> Self {
        Self::with_store(SampleStore::Unbounded(Vec::new()))
    }

    /// Trend that keeps at most `capacity` values, replaced by reservoir
    /// sampling once full. A zero capacity keeps every value.
    pub fn with_reservoir(capacity: usize, seed: Option<u64>) -> Self {
        if capacity == 0 {
            return Self::unbounded();
        }
        let rng = match seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        Self::with_store(SampleStore::Reservoir {
            capacity,
            values: Vec::with_capacity(capacity),
            rng,
        })
    }

    fn with_store(store: SampleStore) -> Self {
        Self {
            state: Mutex::new(TrendState {
                count: 0,
                sum: 0.0,
                mean: 0.0,
                min: f64::INFINITY,
                max: f64::NEG_INFINITY,
                store,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TrendState> {
        // State stays consistent even if a holder panicked mid-append.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record one finite value. On rejection the reason is returned and the
    /// trend is untouched.
    pub fn add(&self, value: f64) -> Result<(), &'static str> {
        if value.is_nan() {
            return Err("trend values must not be NaN");
        }
        if value.is_infinite() {
            return Err("trend values must be finite");
        }
        let mut st = self.lock();
        st.count += 1;
        st.sum += value;
        let n = st.count as f64;
        st.mean = st.mean * (1.0 - 1.0 / n) + value / n;
        st.min = st.min.min(value);
        st.max = st.max.max(value);
        let seen = st.count;
        st.store.push(value, seen);
        Ok(())
    }

    pub fn count(&self) -> u64 {
        self.lock().count
    }

    /// Mean of all values, `None` while empty.
    pub fn mean(&self) -> Option<f64> {
        self.lock().avg()
    }

    /// Single percentile over the retained values.
    pub fn percentile(&self, p: Percentile) -> Option<f64> {
        let sorted = self.sorted_values();
        interpolate(&sorted, p)
    }

    fn sorted_values(&self) -> Vec<f64> {
        let mut values = self.lock().store.values().to_vec();
        values.sort_unstable_by(f64::total_cmp);
        values
    }

    /// Snapshot with the median and each requested percentile.
    pub fn snapshot(&self, percentiles: &[Percentile]) -> TrendSnapshot {
        let (count, sum, avg, min, max, mut values) = {
            let st = self.lock();
            (st.count, st.sum, st.avg(), st.min, st.max, st.store.values().to_vec())
        };
        values.sort_unstable_by(f64::total_cmp);

        if count == 0 {
            return TrendSnapshot {
                count,
                sum,
                min: None,
                max: None,
                avg: None,
                med: None,
                percentiles: percentiles.iter().map(|p| (*p, None)).collect(),
                retained: 0,
            };
        }

        TrendSnapshot {
            count,
            sum,
            min: Some(min),
            max: Some(max),
            avg,
            med: interpolate(&values, Percentile::P50),
            percentiles: percentiles
                .iter()
                .map(|p| (*p, interpolate(&values, *p)))
                .collect(),
            retained: values.len(),
        }
    }
}

impl Default for Trend {
    fn default() -> Self {
        Self::unbounded()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn latency_scenario() {
        let t = Trend::unbounded();
        for v in [100.0, 200.0, 300.0, 400.0] {
            t.add(v).unwrap();
        }
        let s = t.snapshot(&[Percentile::P90, Percentile::P95]);
        assert_eq!(s.count, 4);
        assert_eq!(s.min, Some(100.0));
        assert_eq!(s.max, Some(400.0));
        assert_eq!(s.avg, Some(250.0));
        assert_eq!(s.med, Some(250.0));
        assert_eq!(s.retained, 4);
        let p95 = s.percentile(Percentile::P95).unwrap();
        assert!((p95 - 385.0).abs() < 1e-9);
    }

    #[test]
    fn empty_reports_absent() {
        let t = Trend::unbounded();
        let s = t.snapshot(&[Percentile::P90]);
        assert_eq!(s.count, 0);
        assert_eq!(s.min, None);
        assert_eq!(s.avg, None);
        assert_eq!(s.med, None);
        assert_eq!(s.percentile(Percentile::P90), None);
        assert_eq!(t.mean(), None);
    }

    #[test]
    fn rejects_nan_and_inf() {
        let t = Trend::unbounded();
        assert!(t.add(f64::NAN).is_err());
        assert!(t.add(f64::NEG_INFINITY).is_err());
        assert_eq!(t.count(), 0);
        t.add(-5.0).unwrap();
        assert_eq!(t.mean(), Some(-5.0));
    }

    #[test]
    fn overflowing_sum_keeps_finite_avg() {
        let t = Trend::unbounded();
        t.add(f64::MAX).unwrap();
        t.add(f64::MAX).unwrap();
        let s = t.snapshot(&[Percentile::P90]);
        assert_eq!(s.sum, f64::INFINITY);
        assert_eq!(s.avg, Some(f64::MAX));
        assert_eq!(t.mean(), Some(f64::MAX));
        assert_eq!(s.med, Some(f64::MAX));
    }

    #[test]
    fn unsorted_input() {
        let t = Trend::unbounded();
        for v in [9.0, 1.0, 5.0, 3.0, 7.0] {
            t.add(v).unwrap();
        }
        assert_eq!(t.percentile(Percentile::P50), Some(5.0));
        let s = t.snapshot(&[]);
        assert_eq!(s.min, Some(1.0));
        assert_eq!(s.max, Some(9.0));
    }

    #[test]
    fn reservoir_bounds_memory_but_keeps_exact_aggregates() {
        let t = Trend::with_reservoir(64, Some(7));
        for i in 1..=10_000u32 {
            t.add(f64::from(i)).unwrap();
        }
        let s = t.snapshot(&[Percentile::P90]);
        assert_eq!(s.count, 10_000);
        assert_eq!(s.retained, 64);
        assert_eq!(s.min, Some(1.0));
        assert_eq!(s.max, Some(10_000.0));
        assert_eq!(s.avg, Some(5000.5));
        let med = s.med.unwrap();
        assert!((1.0..=10_000.0).contains(&med));
    }

    #[test]
    fn seeded_reservoir_is_reproducible() {
        let a = Trend::with_reservoir(8, Some(42));
        let b = Trend::with_reservoir(8, Some(42));
        for i in 0..1000u32 {
            a.add(f64::from(i)).unwrap();
            b.add(f64::from(i)).unwrap();
        }
        assert_eq!(a.snapshot(&[Percentile::P90]), b.snapshot(&[Percentile::P90]));
    }

    #[test]
    fn zero_capacity_means_unbounded() {
        let t = Trend::with_reservoir(0, None);
        for i in 0..100u32 {
            t.add(f64::from(i)).unwrap();
        }
        assert_eq!(t.snapshot(&[]).retained, 100);
    }
}
