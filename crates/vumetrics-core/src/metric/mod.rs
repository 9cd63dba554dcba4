//! Metric definitions.
//!
//! A metric is a closed variant: [`Counter`] or [`Trend`]. Both expose the
//! same capability surface through [`Metric::add`] and [`Metric::snapshot`],
//! resolved with a `match` on the variant.

pub mod counter;
pub mod percentile;
pub mod trend;

use std::fmt;

pub use counter::{Counter, CounterSnapshot};
pub use percentile::Percentile;
pub use trend::{Trend, TrendSnapshot};

use crate::error::{MetricsError, Result};
use crate::sample::Tags;

const MAX_NAME_LEN: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Counter,
    Trend,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Trend => "trend",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the values of a metric measure. Time values are milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValueType {
    #[default]
    Default,
    Time,
}

impl ValueType {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::Default => "default",
            ValueType::Time => "time",
        }
    }
}

#[derive(Debug)]
enum Accumulator {
    Counter(Counter),
    Trend(Trend),
}

/// A registered metric. Owned by the registry, shared through handles.
#[derive(Debug)]
pub struct Metric {
    name: String,
    value_type: ValueType,
    acc: Accumulator,
}

/// Point-in-time values of one metric.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricSnapshot {
    Counter(CounterSnapshot),
    Trend(TrendSnapshot),
}

impl Metric {
    pub(crate) fn counter(name: String, value_type: ValueType) -> Self {
        Self {
            name,
            value_type,
            acc: Accumulator::Counter(Counter::new()),
        }
    }

    pub(crate) fn trend(name: String, value_type: ValueType, trend: Trend) -> Self {
        Self {
            name,
            value_type,
            acc: Accumulator::Trend(trend),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> MetricKind {
        match self.acc {
            Accumulator::Counter(_) => MetricKind::Counter,
            Accumulator::Trend(_) => MetricKind::Trend,
        }
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Record one value.
    ///
    /// Tags describe the individual sample; they are accepted for every
    /// metric but do not split the aggregate into separate series.
    pub fn add(&self, value: f64, _tags: &Tags) -> Result<()> {
        let res = match &self.acc {
            Accumulator::Counter(c) => c.add(value),
            Accumulator::Trend(t) => t.add(value),
        };
        res.map_err(|reason| MetricsError::InvalidValue {
            metric: self.name.clone(),
            value,
            reason,
        })
    }

    /// Snapshot; `percentiles` only applies to trends.
    pub fn snapshot(&self, percentiles: &[Percentile]) -> MetricSnapshot {
        match &self.acc {
            Accumulator::Counter(c) => MetricSnapshot::Counter(c.snapshot_full()),
            Accumulator::Trend(t) => MetricSnapshot::Trend(t.snapshot(percentiles)),
        }
    }

    pub fn as_counter(&self) -> Option<&Counter> {
        match &self.acc {
            Accumulator::Counter(c) => Some(c),
            Accumulator::Trend(_) => None,
        }
    }

    pub fn as_trend(&self) -> Option<&Trend> {
        match &self.acc {
            Accumulator::Trend(t) => Some(t),
            Accumulator::Counter(_) => None,
        }
    }
}

/// Names are 1..=128 chars of letters, digits, spaces and `_.-:/!?&#()<>%`,
/// with no leading or trailing whitespace.
pub fn validate_name(name: &str) -> Result<()> {
    let len = name.chars().count();
    let allowed = |c: char| c.is_alphanumeric() || c == ' ' || "_.-:/!?&#()<>%".contains(c);
    if len == 0
        || len > MAX_NAME_LEN
        || name.trim() != name
        || !name.chars().all(allowed)
    {
        return Err(MetricsError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::panic)]

    use super::*;

    #[test]
    fn names() {
        assert!(validate_name("my_trend").is_ok());
        assert!(validate_name("http_req_duration{status:200}").is_err());
        assert!(validate_name("checks / login (ok)").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name(" padded").is_err());
        assert!(validate_name(&"x".repeat(129)).is_err());
        assert!(validate_name(&"x".repeat(128)).is_ok());
    }

    #[test]
    fn add_maps_rejection_to_invalid_value() {
        let m = Metric::counter("hits".into(), ValueType::Default);
        let err = m.add(-2.0, &Tags::new()).unwrap_err();
        assert_eq!(err.code().as_str(), "INVALID_VALUE");
        assert!(err.to_string().contains("hits"));
    }

    #[test]
    fn snapshot_matches_kind() {
        let m = Metric::trend("lat".into(), ValueType::Time, Trend::unbounded());
        m.add(3.0, &Tags::new()).unwrap();
        assert_eq!(m.kind(), MetricKind::Trend);
        assert!(m.as_counter().is_none());
        match m.snapshot(&[]) {
            MetricSnapshot::Trend(s) => assert_eq!(s.count, 1),
            other => panic!("unexpected snapshot: {other:?}"),
        }
    }
}
