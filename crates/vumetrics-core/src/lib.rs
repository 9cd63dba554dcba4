//! vumetrics core: custom metrics for a load-testing harness.
//!
//! This crate owns metric definitions (counters and trends), the registry that
//! holds them, the router that feeds samples from concurrent virtual users into
//! them, and the reporter that turns them into text or JSON summaries. It
//! carries no runtime or transport dependencies; the harness crate supplies
//! the load source and the reporting schedule.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! A bad sample surfaces as `MetricsError` and is dropped by the router, so a
//! virtual user never aborts because of metric bookkeeping.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod metric;
pub mod registry;
pub mod report;
pub mod router;
pub mod sample;

/// Shared result type.
pub use error::{MetricsError, Result};
pub use metric::{MetricKind, MetricSnapshot, Percentile, ValueType};
pub use registry::{MetricHandle, MetricRegistry, RegistryOptions, ReservoirPolicy};
pub use report::{Report, ReportStyle, Reporter};
pub use router::{RouteOutcome, SampleRouter, DEFAULT_LEDGER_NAMES, OVERFLOW_ROW};
pub use sample::{Sample, Tags};
