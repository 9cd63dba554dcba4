//! Drives virtual users: `vus` tasks, each running `iterations` iterations.

use std::sync::Arc;

use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt;
use tokio::time::Instant;

use vumetrics_core::SampleRouter;

use crate::config::LoadSection;
use crate::scenario::{Scenario, VuCtx};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadPlan {
    pub vus: u32,
    pub iterations: u32,
}

impl From<&LoadSection> for LoadPlan {
    fn from(load: &LoadSection) -> Self {
        Self {
            vus: load.vus,
            iterations: load.iterations,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: u64,
    pub failed: u64,
    /// VU tasks that panicked or were cancelled.
    pub aborted_vus: u32,
}

/// Run the plan to completion. A failing iteration is logged and counted;
/// the VU moves on to its next iteration.
pub async fn run_load(
    plan: LoadPlan,
    scenario: Arc<dyn Scenario>,
    router: Arc<SampleRouter>,
) -> RunSummary {
    let started = Instant::now();
    let mut vus = FuturesUnordered::new();
    for vu in 0..plan.vus {
        let scenario = Arc::clone(&scenario);
        let router = Arc::clone(&router);
        vus.push(tokio::spawn(run_vu(vu, plan.iterations, scenario, router)));
    }

    let mut summary = RunSummary::default();
    while let Some(res) = vus.next().await {
        match res {
            Ok((completed, failed)) => {
                summary.completed += completed;
                summary.failed += failed;
            }
            Err(e) => {
                tracing::warn!(error = %e, "virtual user aborted");
                summary.aborted_vus += 1;
            }
        }
    }

    tracing::info!(
        vus = plan.vus,
        completed = summary.completed,
        failed = summary.failed,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "load finished"
    );
    summary
}

async fn run_vu(
    vu: u32,
    iterations: u32,
    scenario: Arc<dyn Scenario>,
    router: Arc<SampleRouter>,
) -> (u64, u64) {
    let (mut completed, mut failed) = (0u64, 0u64);
    for i in 0..iterations {
        let ctx = VuCtx::new(vu, i, scenario.name(), Arc::clone(&router));
        match scenario.iteration(ctx).await {
            Ok(()) => completed += 1,
            Err(e) => {
                tracing::debug!(vu, iteration = i, error = %e, "iteration failed");
                failed += 1;
            }
        }
    }
    (completed, failed)
}
