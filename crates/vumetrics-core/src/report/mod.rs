//! Reporter: registry -> ordered, serializable summary.
//!
//! Each metric is snapshotted on its own; there is no transaction across
//! metrics, so samples landing while a report is taken may be visible in one
//! metric and not yet in another. Reporting never mutates metric state.

pub mod format;

use std::sync::Arc;
use std::time::Duration;

pub use format::{format, ReportStyle};

use crate::metric::{MetricKind, MetricSnapshot, ValueType};
use crate::registry::MetricRegistry;
use crate::router::{DropCount, SampleRouter};

/// One metric's entry in a report.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSummary {
    pub name: String,
    pub kind: MetricKind,
    pub value_type: ValueType,
    pub snapshot: MetricSnapshot,
}

/// Everything a report renders.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub elapsed: Duration,
    pub metrics: Vec<MetricSummary>,
    pub accepted: u64,
    pub dropped: Vec<DropCount>,
}

impl Report {
    pub fn dropped_total(&self) -> u64 {
        self.dropped.iter().map(|d| d.count).sum()
    }

    pub fn metric(&self, name: &str) -> Option<&MetricSummary> {
        self.metrics.iter().find(|m| m.name == name)
    }
}

pub struct Reporter {
    registry: Arc<MetricRegistry>,
    router: Option<Arc<SampleRouter>>,
}

impl Reporter {
    pub fn new(registry: Arc<MetricRegistry>) -> Self {
        Self {
            registry,
            router: None,
        }
    }

    /// Include the router's accepted/dropped sample counts in reports.
    pub fn with_router(mut self, router: Arc<SampleRouter>) -> Self {
        self.router = Some(router);
        self
    }

    /// Snapshot every metric, in registration order.
    pub fn snapshot_all(&self) -> Vec<MetricSummary> {
        let percentiles = &self.registry.options().percentiles;
        self.registry
            .metrics()
            .iter()
            .map(|m| MetricSummary {
                name: m.name().to_string(),
                kind: m.kind(),
                value_type: m.value_type(),
                snapshot: m.snapshot(percentiles),
            })
            .collect()
    }

    pub fn report(&self) -> Report {
        let (accepted, dropped) = match &self.router {
            Some(r) => (r.accepted(), r.drop_counts()),
            None => (0, Vec::new()),
        };
        Report {
            elapsed: self.registry.elapsed(),
            metrics: self.snapshot_all(),
            accepted,
            dropped,
        }
    }
}
