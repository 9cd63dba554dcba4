//! Scenarios: what one virtual-user iteration does.
//!
//! The request-execution layer is out of scope for the metrics core, so the
//! built-in [`SyntheticScenario`] stands in for it: it produces a plausible
//! "waiting" time per iteration and records it the way a load script would.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::Duration;

use vumetrics_core::error::Result;
use vumetrics_core::{MetricRegistry, RouteOutcome, Sample, SampleRouter};

/// Per-iteration context handed to scenarios.
#[derive(Clone)]
pub struct VuCtx {
    vu: u32,
    iteration: u32,
    scenario: &'static str,
    router: Arc<SampleRouter>,
}

impl VuCtx {
    pub fn new(vu: u32, iteration: u32, scenario: &'static str, router: Arc<SampleRouter>) -> Self {
        Self {
            vu,
            iteration,
            scenario,
            router,
        }
    }

    pub fn vu(&self) -> u32 {
        self.vu
    }

    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// Route a sample tagged with the scenario and VU id.
    pub fn emit(&self, metric: &str, value: f64) -> RouteOutcome {
        let sample = Sample::new(metric, value)
            .with_tag("scenario", self.scenario)
            .with_tag("vu", self.vu.to_string());
        self.router.route(&sample)
    }
}

#[async_trait]
pub trait Scenario: Send + Sync {
    fn name(&self) -> &'static str;

    /// Register the metrics this scenario writes. Called once before any VU
    /// starts; a registration conflict aborts the run.
    fn setup(&self, registry: &MetricRegistry) -> Result<()>;

    async fn iteration(&self, ctx: VuCtx) -> Result<()>;
}

/// Counter incremented once per finished iteration.
pub const ITERATIONS: &str = "iterations";

/// Records a random waiting time (ms) into a time trend per iteration.
pub struct SyntheticScenario {
    metric: String,
    think_time: Duration,
    base_ms: f64,
    jitter_ms: f64,
}

impl SyntheticScenario {
    pub fn new(metric: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            think_time: Duration::ZERO,
            base_ms: 20.0,
            jitter_ms: 180.0,
        }
    }

    pub fn with_think_time(mut self, think_time: Duration) -> Self {
        self.think_time = think_time;
        self
    }

    /// Waiting times are drawn uniformly from `base_ms..base_ms + jitter_ms`.
    pub fn with_latency(mut self, base_ms: f64, jitter_ms: f64) -> Self {
        self.base_ms = base_ms;
        self.jitter_ms = jitter_ms;
        self
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }
}

#[async_trait]
impl Scenario for SyntheticScenario {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn setup(&self, registry: &MetricRegistry) -> Result<()> {
        registry.time_trend(&self.metric)?;
        registry.counter(ITERATIONS)?;
        Ok(())
    }

    async fn iteration(&self, ctx: VuCtx) -> Result<()> {
        let waiting = self.base_ms + fastrand::f64() * self.jitter_ms;
        if !self.think_time.is_zero() {
            tokio::time::sleep(self.think_time).await;
        }
        ctx.emit(&self.metric, waiting);
        ctx.emit(ITERATIONS, 1.0);
        Ok(())
    }
}
